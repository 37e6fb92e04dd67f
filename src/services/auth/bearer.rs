//! `Authorization: Bearer <token>` header parsing.

use axum::http::{HeaderMap, header};

use super::error::AuthError;

const SCHEME: &str = "Bearer";

/// Pull the bearer credential out of the request headers.
///
/// The scheme is case-sensitive and must be separated from the token by a single space.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader("Authorization header is expected."))?
        .to_str()
        .map_err(|_| AuthError::MissingHeader("Authorization header is not valid ASCII."))?;

    let parts: Vec<&str> = auth.split(' ').collect();

    if parts[0] != SCHEME {
        return Err(AuthError::MissingHeader(
            "Authorization header must start with \"Bearer\".",
        ));
    }
    if parts.len() == 1 {
        return Err(AuthError::MissingHeader("Token not found."));
    }
    if parts.len() > 2 {
        return Err(AuthError::MissingHeader(
            "Authorization header must be bearer token.",
        ));
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(AuthError::MissingHeader("Token not found."));
    }

    Ok(token)
}
