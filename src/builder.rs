use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use log::info;

use crate::{
    error::StartupError,
    identity::{DenyAllResolver, IdentityResolver, NonceGenerator, UuidNonceGenerator},
    jwt::{TokenSigner, TokenVerifier},
    provider::{ProviderConfig, TokenProvider},
};

const DEFAULT_CREATION_PATH: &str = "/token";
const DEFAULT_EXPIRATION: Duration = Duration::from_secs(5 * 60);
const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

pub struct TokenProviderBuilder {
    creation_path: Option<String>,
    refresh_path: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    expiration: Option<Duration>,
    clock_skew: Option<Duration>,
    algorithm: Option<Algorithm>,
    encoding_key: Option<EncodingKey>,
    decoding_key: Option<DecodingKey>,
    identity_resolver: Option<Arc<dyn IdentityResolver>>,
    nonce_generator: Option<Arc<dyn NonceGenerator>>,
}

impl TokenProviderBuilder {
    pub(crate) fn new() -> Self {
        TokenProviderBuilder {
            creation_path: None,
            refresh_path: None,
            issuer: None,
            audience: None,
            expiration: None,
            clock_skew: None,
            algorithm: None,
            encoding_key: None,
            decoding_key: None,
            identity_resolver: None,
            nonce_generator: None,
        }
    }

    /// Set the path that serves token creation.
    ///
    /// Default value is `/token`.
    pub fn creation_path(mut self, creation_path: impl Into<String>) -> Self {
        self.creation_path = Some(creation_path.into());
        self
    }

    /// Set the path that serves token refresh.
    ///
    /// When not set, no refresh endpoint exists and such requests are
    /// passed through like any other path.
    pub fn refresh_path(mut self, refresh_path: impl Into<String>) -> Self {
        self.refresh_path = Some(refresh_path.into());
        self
    }

    /// Set the `iss` claim stamped into issued tokens and required from
    /// tokens presented for refresh.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the `aud` claim stamped into issued tokens and required from
    /// tokens presented for refresh.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set how long issued tokens are valid.
    ///
    /// Also the window granted anew on every refresh, counted from the
    /// instant of the refresh. Default value is 5 minutes.
    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the clock-skew tolerance applied when verifying tokens.
    ///
    /// Default value is 60 seconds.
    pub fn clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = Some(clock_skew);
        self
    }

    /// Set the signing algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Set the key used to sign issued tokens.
    pub fn encoding_key(mut self, encoding_key: EncodingKey) -> Self {
        self.encoding_key = Some(encoding_key);
        self
    }

    /// Set the key used to verify tokens presented for refresh.
    pub fn decoding_key(mut self, decoding_key: DecodingKey) -> Self {
        self.decoding_key = Some(decoding_key);
        self
    }

    /// Set the capability that resolves credentials to an identity.
    ///
    /// The default rejects every credential pair.
    pub fn identity_resolver(mut self, identity_resolver: Arc<dyn IdentityResolver>) -> Self {
        self.identity_resolver = Some(identity_resolver);
        self
    }

    /// Set the capability that produces the per-token `jti` claim.
    ///
    /// The default generates a random UUIDv4 per issuance.
    pub fn nonce_generator(mut self, nonce_generator: Arc<dyn NonceGenerator>) -> Self {
        self.nonce_generator = Some(nonce_generator);
        self
    }

    /// Construct a [TokenProvider].
    ///
    /// The whole configuration is validated here, before any request is
    /// served. The first invalid or missing parameter is returned.
    pub fn build(self) -> Result<TokenProvider, StartupError> {
        let creation_path = self
            .creation_path
            .unwrap_or_else(|| DEFAULT_CREATION_PATH.to_owned());
        if creation_path.is_empty() {
            return Err(StartupError::InvalidParameter(
                "creation_path must not be empty".to_owned(),
            ));
        }
        if matches!(self.refresh_path.as_deref(), Some("")) {
            return Err(StartupError::InvalidParameter(
                "refresh_path must not be empty".to_owned(),
            ));
        }
        let issuer = match self.issuer {
            Some(issuer) if !issuer.is_empty() => issuer,
            _ => {
                return Err(StartupError::InvalidParameter(
                    "issuer is required".to_owned(),
                ))
            }
        };
        let audience = match self.audience {
            Some(audience) if !audience.is_empty() => audience,
            _ => {
                return Err(StartupError::InvalidParameter(
                    "audience is required".to_owned(),
                ))
            }
        };
        let expiration = self.expiration.unwrap_or(DEFAULT_EXPIRATION);
        if expiration.is_zero() {
            return Err(StartupError::InvalidParameter(
                "expiration must be greater than zero".to_owned(),
            ));
        }
        let algorithm = self.algorithm.ok_or_else(|| {
            StartupError::InvalidParameter("signing algorithm is required".to_owned())
        })?;
        let encoding_key = self
            .encoding_key
            .ok_or_else(|| StartupError::InvalidParameter("signing key is required".to_owned()))?;
        let decoding_key = self.decoding_key.ok_or_else(|| {
            StartupError::InvalidParameter("verification key is required".to_owned())
        })?;

        let signer = TokenSigner::new(algorithm, encoding_key);
        let verifier = TokenVerifier::new(
            algorithm,
            decoding_key,
            &issuer,
            &audience,
            self.clock_skew.unwrap_or(DEFAULT_CLOCK_SKEW),
        );

        info!(
            "Token provider configured for issuer {} at {}",
            issuer, creation_path
        );
        Ok(TokenProvider::new(
            ProviderConfig {
                creation_path,
                refresh_path: self.refresh_path,
                issuer,
                audience,
                expiration,
            },
            signer,
            verifier,
            self.identity_resolver
                .unwrap_or_else(|| Arc::new(DenyAllResolver)),
            self.nonce_generator
                .unwrap_or_else(|| Arc::new(UuidNonceGenerator)),
        ))
    }
}

impl Default for TokenProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> TokenProviderBuilder {
        TokenProviderBuilder::new()
            .issuer("https://issuer.test")
            .audience("https://audience.test")
            .algorithm(Algorithm::HS256)
            .encoding_key(EncodingKey::from_secret(b"secret"))
            .decoding_key(DecodingKey::from_secret(b"secret"))
    }

    #[test]
    fn require_issuer() {
        let result = complete().issuer("").build();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("issuer is required".to_owned())
        );
    }

    #[test]
    fn require_audience() {
        let result = TokenProviderBuilder::new()
            .issuer("https://issuer.test")
            .algorithm(Algorithm::HS256)
            .encoding_key(EncodingKey::from_secret(b"secret"))
            .decoding_key(DecodingKey::from_secret(b"secret"))
            .build();
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("audience is required".to_owned())
        );
    }

    #[test]
    fn require_non_empty_creation_path() {
        let result = complete().creation_path("").build();
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("creation_path must not be empty".to_owned())
        );
    }

    #[test]
    fn require_non_zero_expiration() {
        let result = complete().expiration(Duration::ZERO).build();
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("expiration must be greater than zero".to_owned())
        );
    }

    #[test]
    fn require_signing_key() {
        let result = TokenProviderBuilder::new()
            .issuer("https://issuer.test")
            .audience("https://audience.test")
            .algorithm(Algorithm::HS256)
            .decoding_key(DecodingKey::from_secret(b"secret"))
            .build();
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("signing key is required".to_owned())
        );
    }

    #[test]
    fn require_algorithm() {
        let result = TokenProviderBuilder::new()
            .issuer("https://issuer.test")
            .audience("https://audience.test")
            .encoding_key(EncodingKey::from_secret(b"secret"))
            .decoding_key(DecodingKey::from_secret(b"secret"))
            .build();
        assert_eq!(
            result.unwrap_err(),
            StartupError::InvalidParameter("signing algorithm is required".to_owned())
        );
    }

    #[test]
    fn defaults_applied() {
        let provider = complete().build().unwrap();
        assert_eq!(provider.config().creation_path, "/token");
        assert_eq!(provider.config().expiration, Duration::from_secs(300));
        assert!(provider.config().refresh_path.is_none());
    }
}
