use std::collections::HashMap;
use std::str::FromStr;

use axum::http::HeaderMap;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;
use tracing::debug;

use crate::services::auth::bearer::extract_bearer;
use crate::services::auth::error::AuthError;
use crate::services::auth::jwks::KeyStore;
use crate::services::auth::permissions::enforce;

/// Knobs for access-token validation.
///
/// Kept separate from `Config` so the verifier can be built directly in tests.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub issuer: String,
    pub audience: String,
    // The only algorithm accepted in the token header. Must be asymmetric.
    pub algorithm: Algorithm,
    // Name of the claim carrying the permission list (Auth0 RBAC: "permissions").
    pub permissions_claim: String,
    pub leeway_seconds: u64,
}

/// JOSE header fields we need before the signature can be checked.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    kid: Option<String>,
}

/// Access token (JWT) claims as they come off the wire.
///
/// NOTE:
/// - `aud` can be either a string or an array; jsonwebtoken validates it via `Validation::set_audience`.
/// - The permissions claim name is configurable, so it is picked out of `extra`.
#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    iss: String,
    #[serde(default)]
    aud: serde_json::Value,
    exp: u64,
    #[serde(default)]
    sub: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

/// Verified claim set handed to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: Option<String>,
    pub iss: String,
    pub aud: Vec<String>,
    pub exp: u64,
    pub permissions: Vec<String>,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

fn audiences(aud: serde_json::Value) -> Vec<String> {
    match aud {
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_base64url_segment(segment: &str) -> bool {
    segment
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Split a compact JWS and decode its header without verifying anything.
fn decode_header(token: &str) -> Result<TokenHeader, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    // The signature segment may be empty (`alg: none`); that case is rejected by the algorithm check.
    let well_formed = segments.len() == 3
        && !segments[0].is_empty()
        && !segments[1].is_empty()
        && segments.iter().all(|s| is_base64url_segment(s));
    if !well_formed {
        return Err(AuthError::MalformedToken(
            "Token must be three base64url segments.",
        ));
    }

    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|_| AuthError::MalformedToken("Token header is not valid base64url."))?;

    serde_json::from_slice::<TokenHeader>(&raw)
        .map_err(|_| AuthError::MalformedToken("Token header is not a JSON object."))
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => AuthError::InvalidIssuer,
            "aud" => AuthError::InvalidAudience,
            _ => AuthError::MalformedToken("Token is missing a required claim."),
        },
        ErrorKind::InvalidAlgorithm => AuthError::InvalidAlgorithm("mismatched key".to_string()),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedToken("Unable to parse authentication token.")
        }
        // Key material that cannot check this signature.
        _ => AuthError::InvalidSignature,
    }
}

/// Access-token verifier backed by the identity provider's key set.
///
/// - Key material is intentionally not printable via Debug.
pub struct AuthService {
    keys: KeyStore,
    validation: Validation,
    policy: TokenPolicy,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("keys", &self.keys)
            .field("policy", &self.policy)
            .finish()
    }
}

impl AuthService {
    pub fn new(policy: TokenPolicy, keys: KeyStore) -> Self {
        let mut validation = Validation::new(policy.algorithm);
        validation.set_issuer(&[policy.issuer.as_str()]);
        validation.set_audience(&[policy.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = policy.leeway_seconds;

        Self {
            keys,
            validation,
            policy,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Verify a bearer token and return its claim set.
    ///
    /// Checks run in a fixed order: shape (header `alg` and `kid` present), algorithm,
    /// signing key, signature, `exp`/`iss`/`aud`, permissions claim. The first failure wins.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;

        let alg = header
            .alg
            .ok_or(AuthError::MalformedToken("Token header has no algorithm."))?;
        let kid = header
            .kid
            .ok_or(AuthError::MalformedToken("Token header has no key id."))?;

        let declared =
            Algorithm::from_str(&alg).map_err(|_| AuthError::InvalidAlgorithm(alg.clone()))?;
        if declared != self.policy.algorithm {
            return Err(AuthError::InvalidAlgorithm(alg));
        }

        let key = self
            .keys
            .resolve(&kid)
            .await
            .ok_or(AuthError::UnknownSigningKey)?;

        let data = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &self.validation)
            .map_err(map_jwt_error)?;
        let mut claims = data.claims;

        let permissions = match claims.extra.remove(&self.policy.permissions_claim) {
            None | Some(serde_json::Value::Null) => return Err(AuthError::PermissionsClaimMissing),
            Some(value) => serde_json::from_value::<Vec<String>>(value).map_err(|_| {
                AuthError::MalformedToken("Permissions claim must be a list of strings.")
            })?,
        };

        debug!(kid = %kid, sub = ?claims.sub, "access token verified");

        Ok(Claims {
            sub: claims.sub,
            iss: claims.iss,
            aud: audiences(claims.aud),
            exp: claims.exp,
            permissions,
        })
    }

    /// Extract, verify and authorize in one pass.
    ///
    /// This is the entry-point for middleware: the handler only runs on `Ok`.
    pub async fn authorize(&self, headers: &HeaderMap, required: &str) -> Result<Claims, AuthError> {
        let token = extract_bearer(headers)?;
        let claims = self.verify(token).await?;
        enforce(&claims, required)?;
        Ok(claims)
    }
}
