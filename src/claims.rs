use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{formats::PreferMany, serde_as, OneOrMany};

/// Claim set of an issued token.
///
/// On fresh issuance all registered claims are computed by the create flow.
/// On refresh the whole set is carried forward from the original token,
/// except `nbf` and `exp` which are recomputed from the current instant.
/// Claims beyond the registered ones live in `custom`, which serializes
/// flattened into the payload.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Claims {
    pub iss: String,
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    pub aud: Vec<String>,
    pub sub: String,
    pub jti: String,
    pub iat: u64,
    pub nbf: u64,
    pub exp: u64,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Display for Claims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
