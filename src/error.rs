use std::{error::Error, fmt::Display};

use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};

/// Configuration error, raised once from
/// [TokenProviderBuilder::build](crate::builder::TokenProviderBuilder::build).
///
/// Never produced while serving traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupError {
    InvalidParameter(String),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for StartupError {}

/// Request-time failure.
///
/// Every variant maps to status `400` with a fixed message. The variants
/// deliberately carry no detail: a failed credential check does not reveal
/// whether the username exists, and a failed verification does not reveal
/// why the token was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueError {
    /// Wrong method, wrong content type, or an unreadable request.
    BadRequest,
    /// The identity resolver did not authenticate the credentials.
    InvalidCredentials,
    /// The presented token failed extraction or verification.
    InvalidToken,
}

impl IssueError {
    pub fn body_text(&self) -> &'static str {
        match self {
            IssueError::BadRequest => "Bad request.",
            IssueError::InvalidCredentials => "Invalid username or password.",
            IssueError::InvalidToken => "Bad request or invalid token.",
        }
    }
}

impl Display for IssueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for IssueError {}

impl<B> From<IssueError> for Response<B>
where
    B: From<Bytes>,
{
    fn from(e: IssueError) -> Self {
        let mut response = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(B::from(Bytes::from_static(e.body_text().as_bytes())))
            .unwrap();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }
}
