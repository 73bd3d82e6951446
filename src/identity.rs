use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// An authenticated subject, produced by an [IdentityResolver].
///
/// Carries the subject identifier plus any additional claims the resolver
/// wants included in issued tokens. Claim names are not required to be
/// unique here; on issuance later values win. Registered claim names
/// (`iss`, `aud`, `sub`, `jti`, `iat`, `nbf`, `exp`) are computed by the
/// flows themselves and are not taken from the identity.
#[derive(Clone, Debug)]
pub struct Identity {
    subject: String,
    claims: Vec<(String, Value)>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Identity {
            subject: subject.into(),
            claims: Vec::new(),
        }
    }

    /// Attach an additional claim to tokens issued for this identity.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.push((name.into(), value.into()));
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn claims(&self) -> &[(String, Value)] {
        &self.claims
    }
}

/// Resolves submitted credentials to an [Identity].
///
/// `None` signals authentication failure. The middleware does not
/// distinguish between an unknown username and a wrong password, and
/// neither should implementations leak that distinction elsewhere.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, username: &str, password: &str) -> Option<Identity>;
}

/// Default resolver: rejects every credential pair.
///
/// A provider is only useful once the embedding application supplies its
/// own resolver, but failing closed is the safe default.
#[derive(Debug)]
pub struct DenyAllResolver;

#[async_trait]
impl IdentityResolver for DenyAllResolver {
    async fn resolve(&self, _username: &str, _password: &str) -> Option<Identity> {
        None
    }
}

/// Produces the `jti` claim for each issued token.
#[async_trait]
pub trait NonceGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// Default nonce generator: a random UUIDv4 per issuance.
#[derive(Debug)]
pub struct UuidNonceGenerator;

#[async_trait]
impl NonceGenerator for UuidNonceGenerator {
    async fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
