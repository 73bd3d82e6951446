use http::HeaderMap;

use crate::error::IssueError;

/// Pulls the token text out of the `Authorization` header.
///
/// The scheme is ignored on purpose: everything after the first space is
/// taken as the token. A header without a space carries no token.
pub(crate) fn refresh_token_text(headers: &HeaderMap) -> Result<String, IssueError> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .ok_or(IssueError::InvalidToken)?
        .to_str()
        .map_err(|_| IssueError::InvalidToken)?;
    let (_scheme, token) = header.split_once(' ').ok_or(IssueError::InvalidToken)?;
    Ok(token.to_owned())
}
