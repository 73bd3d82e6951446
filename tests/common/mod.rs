use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, Request, Response};
use http_body_util::{BodyExt, Full};
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Validation};
use tower::BoxError;
use uuid::Uuid;

use tower_token_provider::{
    claims::Claims,
    identity::{Identity, IdentityResolver, NonceGenerator},
    provider::TokenProvider,
};

pub const SECRET: &[u8] = b"integration-test-secret";
pub const ISSUER: &str = "https://issuer.test";
pub const AUDIENCE: &str = "https://audience.test";
pub const CREATION_PATH: &str = "/token";
pub const REFRESH_PATH: &str = "/token/refresh";
pub const EXPIRATION_SECS: u64 = 300;

/// Resolves exactly one credential pair, like a one-user user store.
pub struct SingleUserResolver;

#[async_trait]
impl IdentityResolver for SingleUserResolver {
    async fn resolve(&self, username: &str, password: &str) -> Option<Identity> {
        if username == "alice" && password == "secret" {
            Some(Identity::new(username).with_claim("role", "admin"))
        } else {
            None
        }
    }
}

/// Counts invocations, to assert that failed flows short-circuit before
/// nonce generation.
#[derive(Default)]
pub struct CountingNonceGenerator {
    invocations: AtomicUsize,
}

impl CountingNonceGenerator {
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NonceGenerator for CountingNonceGenerator {
    async fn generate(&self) -> String {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Uuid::new_v4().to_string()
    }
}

pub fn provider() -> TokenProvider {
    provider_with_nonce_generator(None)
}

pub fn provider_with_nonce_generator(
    nonce_generator: Option<Arc<dyn NonceGenerator>>,
) -> TokenProvider {
    let mut builder = TokenProvider::builder()
        .creation_path(CREATION_PATH)
        .refresh_path(REFRESH_PATH)
        .issuer(ISSUER)
        .audience(AUDIENCE)
        .expiration(Duration::from_secs(EXPIRATION_SECS))
        .algorithm(Algorithm::HS256)
        .encoding_key(EncodingKey::from_secret(SECRET))
        .decoding_key(DecodingKey::from_secret(SECRET))
        .identity_resolver(Arc::new(SingleUserResolver));
    if let Some(nonce_generator) = nonce_generator {
        builder = builder.nonce_generator(nonce_generator);
    }
    builder.build().expect("Failed to build token provider")
}

pub fn provider_with_identity_resolver(
    identity_resolver: Arc<dyn IdentityResolver>,
) -> TokenProvider {
    TokenProvider::builder()
        .creation_path(CREATION_PATH)
        .refresh_path(REFRESH_PATH)
        .issuer(ISSUER)
        .audience(AUDIENCE)
        .expiration(Duration::from_secs(EXPIRATION_SECS))
        .algorithm(Algorithm::HS256)
        .encoding_key(EncodingKey::from_secret(SECRET))
        .decoding_key(DecodingKey::from_secret(SECRET))
        .identity_resolver(identity_resolver)
        .build()
        .expect("Failed to build token provider")
}

pub async fn echo(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, BoxError> {
    Ok(Response::new(request.into_body()))
}

pub fn form_request(path: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from(body.to_owned())))
        .unwrap()
}

pub fn refresh_request(authorization: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .uri(REFRESH_PATH)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("Authorization", authorization)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub async fn body_string(response: Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Decodes an issued token with the same trust parameters the provider
/// uses, returning its claim set.
pub fn decode_token(token: &str) -> Claims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_audience(&[AUDIENCE]);
    decode::<Claims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .expect("Failed to decode issued token")
        .claims
}

/// Signs arbitrary claims with the test secret, for crafting tokens the
/// provider did not issue itself.
pub fn sign_claims(claims: &serde_json::Value, secret: &[u8]) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}
