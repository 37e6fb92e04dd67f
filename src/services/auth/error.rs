/*
 * Responsibility
 * - 認可レイヤー (extractor / verifier / enforcer) が返す失敗の種類
 * - HTTP status と機械可読な code への対応をここで固定する
 */
use axum::http::StatusCode;
use thiserror::Error;

/// Why a request was rejected before reaching its handler.
///
/// Every variant except `InsufficientPermission` means "not authenticated" (401).
/// `InsufficientPermission` means "authenticated but forbidden" (403).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    MissingHeader(&'static str),

    #[error("{0}")]
    MalformedToken(&'static str),

    #[error("unsupported signing algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("unable to find the appropriate signing key")]
    UnknownSigningKey,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token expired")]
    TokenExpired,

    #[error("incorrect issuer")]
    InvalidIssuer,

    #[error("incorrect audience")]
    InvalidAudience,

    #[error("permissions not included in token")]
    PermissionsClaimMissing,

    #[error("permission not granted: {0}")]
    InsufficientPermission(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InsufficientPermission(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader(_) => "missing_header",
            Self::MalformedToken(_) => "malformed_token",
            Self::InvalidAlgorithm(_) => "invalid_algorithm",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::InsufficientPermission(_) => "insufficient_permission",
        }
    }
}
