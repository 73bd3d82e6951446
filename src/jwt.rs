use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;

use crate::{claims::Claims, error::IssueError};

/// Signs claim sets with the configured key and algorithm.
#[derive(Clone)]
pub(crate) struct TokenSigner {
    header: Header,
    encoding_key: EncodingKey,
}

impl TokenSigner {
    pub(crate) fn new(algorithm: Algorithm, encoding_key: EncodingKey) -> Self {
        TokenSigner {
            header: Header::new(algorithm),
            encoding_key,
        }
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&self.header, claims, &self.encoding_key)
    }
}

/// Verifies inbound tokens against the configured trust parameters.
///
/// Every possible failure (malformed token, bad signature, expired,
/// issuer or audience mismatch, missing claims) collapses into
/// [IssueError::InvalidToken]. The underlying reason is only logged.
#[derive(Clone)]
pub(crate) struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub(crate) fn new(
        algorithm: Algorithm,
        decoding_key: DecodingKey,
        issuer: &str,
        audience: &str,
        clock_skew: Duration,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["iss", "aud", "exp"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = clock_skew.as_secs();
        TokenVerifier {
            decoding_key,
            validation,
        }
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, IssueError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                debug!("Token verification failed: {:?}", e.into_kind());
                Err(IssueError::InvalidToken)
            }
        }
    }
}
