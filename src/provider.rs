use core::fmt;
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use http::{header::CONTENT_TYPE, HeaderMap, Method, Request};
use http_body_util::BodyExt;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::{
    builder::TokenProviderBuilder,
    claims::Claims,
    error::IssueError,
    extract::refresh_token_text,
    identity::{IdentityResolver, NonceGenerator},
    jwt::{TokenSigner, TokenVerifier},
    layer::TokenProviderLayer,
};

/// TokenProvider
///
/// This is the actual middleware.
/// May be turned into a tower layer by calling [into_layer](TokenProvider::into_layer).
#[derive(Clone)]
pub struct TokenProvider {
    config: Arc<ProviderConfig>,
    signer: TokenSigner,
    verifier: TokenVerifier,
    identity_resolver: Arc<dyn IdentityResolver>,
    nonce_generator: Arc<dyn NonceGenerator>,
}

#[derive(Debug)]
pub(crate) struct ProviderConfig {
    pub(crate) creation_path: String,
    pub(crate) refresh_path: Option<String>,
    pub(crate) issuer: String,
    pub(crate) audience: String,
    pub(crate) expiration: Duration,
}

const REGISTERED_CLAIMS: [&str; 7] = ["iss", "aud", "sub", "jti", "iat", "nbf", "exp"];

/// What an accepted request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenIntent {
    Create,
    Refresh,
}

impl fmt::Display for TokenIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIntent::Create => write!(f, "create token"),
            TokenIntent::Refresh => write!(f, "refresh token"),
        }
    }
}

/// A freshly signed token plus its validity in seconds.
///
/// Serializes to the response body shape
/// `{"access_token": "...", "expires_in": N}`.
#[derive(Clone, Debug, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

impl TokenProvider {
    pub fn builder() -> TokenProviderBuilder {
        TokenProviderBuilder::new()
    }

    pub(crate) fn new(
        config: ProviderConfig,
        signer: TokenSigner,
        verifier: TokenVerifier,
        identity_resolver: Arc<dyn IdentityResolver>,
        nonce_generator: Arc<dyn NonceGenerator>,
    ) -> Self {
        TokenProvider {
            config: Arc::new(config),
            signer,
            verifier,
            identity_resolver,
            nonce_generator,
        }
    }

    pub(crate) fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Decides whether a request is for this middleware at all.
    ///
    /// The creation path wins if both paths are configured equal.
    pub(crate) fn classify(&self, path: &str) -> Option<TokenIntent> {
        if path == self.config.creation_path {
            Some(TokenIntent::Create)
        } else if self.config.refresh_path.as_deref() == Some(path) {
            Some(TokenIntent::Refresh)
        } else {
            None
        }
    }

    pub(crate) async fn handle_request<B>(
        &self,
        intent: TokenIntent,
        request: Request<B>,
    ) -> Result<IssuedToken, IssueError>
    where
        B: http_body::Body,
    {
        if request.method() != Method::POST || !has_form_content_type(request.headers()) {
            return Err(IssueError::BadRequest);
        }
        debug!("Handling {} request for {}", intent, request.uri().path());
        match intent {
            TokenIntent::Create => self.create_token(request).await,
            TokenIntent::Refresh => self.refresh_token(request).await,
        }
    }

    async fn create_token<B>(&self, request: Request<B>) -> Result<IssuedToken, IssueError>
    where
        B: http_body::Body,
    {
        let body = request
            .into_body()
            .collect()
            .await
            .map_err(|_| IssueError::BadRequest)?
            .to_bytes();
        let credentials: Credentials =
            serde_urlencoded::from_bytes(&body).map_err(|_| IssueError::BadRequest)?;

        let identity = self
            .identity_resolver
            .resolve(&credentials.username, &credentials.password)
            .await
            .ok_or(IssueError::InvalidCredentials)?;
        debug!("Resolved identity for subject {}", identity.subject());

        let nonce = self.nonce_generator.generate().await;
        let now = unix_seconds_now();
        let mut custom = Map::new();
        for (name, value) in identity.claims() {
            // Registered claims are computed by the flows; an identity must
            // not shadow them into duplicate payload keys.
            if REGISTERED_CLAIMS.contains(&name.as_str()) {
                continue;
            }
            custom.insert(name.clone(), value.clone());
        }
        let claims = Claims {
            iss: self.config.issuer.clone(),
            aud: vec![self.config.audience.clone()],
            sub: credentials.username,
            jti: nonce,
            iat: now,
            nbf: now,
            exp: now + self.config.expiration.as_secs(),
            custom,
        };

        let access_token = self.signer.sign(&claims).map_err(|e| {
            debug!("Token signing failed: {:?}", e.into_kind());
            IssueError::BadRequest
        })?;
        Ok(self.issued(access_token))
    }

    async fn refresh_token<B>(&self, request: Request<B>) -> Result<IssuedToken, IssueError> {
        let token = refresh_token_text(request.headers())?;
        let original = self.verifier.verify(&token)?;

        // Carry the original claim set verbatim; only the validity window
        // restarts from the current instant.
        let now = unix_seconds_now();
        let claims = Claims {
            iss: self.config.issuer.clone(),
            aud: vec![self.config.audience.clone()],
            nbf: now,
            exp: now + self.config.expiration.as_secs(),
            ..original
        };

        let access_token = self.signer.sign(&claims).map_err(|e| {
            debug!("Token signing failed: {:?}", e.into_kind());
            IssueError::InvalidToken
        })?;
        Ok(self.issued(access_token))
    }

    fn issued(&self, access_token: String) -> IssuedToken {
        IssuedToken {
            access_token,
            expires_in: self.config.expiration.as_secs(),
        }
    }
}

impl TokenProvider {
    /// Returns a [tower layer](https://docs.rs/tower/latest/tower/trait.Layer.html).
    pub fn into_layer<ResBody>(&self) -> TokenProviderLayer<ResBody>
    where
        ResBody: From<bytes::Bytes>,
    {
        TokenProviderLayer::new(self.clone())
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("config", &self.config)
            .finish()
    }
}

fn has_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
