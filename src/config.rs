/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth0/JWKS 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, jwk::JwkSet};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the trusted signing keys come from.
#[derive(Debug, Clone)]
pub enum KeySource {
    Remote(Url),
    Inline(JwkSet),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub permissions_claim: String,
    pub leeway_seconds: u64,

    pub key_source: KeySource,
    pub jwks_cache_ttl_seconds: u64,
    pub jwks_fetch_timeout_seconds: u64,
    pub jwks_min_refresh_interval_seconds: u64,
    pub jwks_max_stale_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_seconds: u64,

    pub auth: AuthConfig,
}

/// Unset or blank falls back to `default`; a value that does not parse is an error.
fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse::<T>().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_or(key, std::env::var(key).ok(), default)
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only asymmetric algorithms: the service holds public keys, never a shared secret.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let alg = Algorithm::from_str(raw).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(ConfigError::Invalid("AUTH_ALGORITHM"))
        }
        _ => Ok(alg),
    }
}

fn database_url() -> Result<String, ConfigError> {
    if let Some(url) = non_empty("DATABASE_URL") {
        return Ok(url);
    }

    // Fall back to the individual connection parts.
    let user = non_empty("DATABASE_USER").ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let password = std::env::var("DATABASE_PASSWORD").unwrap_or_default();
    let host = non_empty("DATABASE_HOST").ok_or(ConfigError::Missing("DATABASE_HOST"))?;
    let name = non_empty("DATABASE_NAME").ok_or(ConfigError::Missing("DATABASE_NAME"))?;

    Ok(format!("postgresql://{user}:{password}@{host}/{name}"))
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let domain = non_empty("AUTH0_DOMAIN");

        let issuer = non_empty("AUTH_ISSUER")
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .ok_or(ConfigError::Missing("AUTH_ISSUER"))?;

        let audience = non_empty("AUTH_AUDIENCE").ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let algorithm = parse_algorithm(
            &non_empty("AUTH_ALGORITHM").unwrap_or_else(|| "RS256".to_string()),
        )?;

        let permissions_claim =
            non_empty("AUTH_PERMISSIONS_CLAIM").unwrap_or_else(|| "permissions".to_string());

        let key_source = if let Some(raw) = non_empty("AUTH_JWKS_JSON") {
            let jwks: JwkSet =
                serde_json::from_str(&raw).map_err(|_| ConfigError::Invalid("AUTH_JWKS_JSON"))?;
            KeySource::Inline(jwks)
        } else {
            let raw = non_empty("AUTH_JWKS_URL")
                .or_else(|| {
                    domain
                        .as_ref()
                        .map(|d| format!("https://{d}/.well-known/jwks.json"))
                })
                .ok_or(ConfigError::Missing("AUTH_JWKS_URL"))?;
            let url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?;
            KeySource::Remote(url)
        };

        Ok(Self {
            issuer,
            audience,
            algorithm,
            permissions_claim,
            leeway_seconds: env_u64("ACCESS_TOKEN_LEEWAY_SECONDS", 0)?,
            key_source,
            jwks_cache_ttl_seconds: env_u64("JWKS_CACHE_TTL_SECONDS", 600)?,
            jwks_fetch_timeout_seconds: env_u64("JWKS_FETCH_TIMEOUT_SECONDS", 5)?.max(1),
            jwks_min_refresh_interval_seconds: env_u64("JWKS_MIN_REFRESH_INTERVAL_SECONDS", 30)?,
            jwks_max_stale_seconds: env_u64("JWKS_MAX_STALE_SECONDS", 0)?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", std::env::var("PORT").ok(), 5000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = database_url()?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout_seconds = env_u64("REQUEST_TIMEOUT_SECONDS", 30)?;

        let auth = AuthConfig::from_env()?;

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            request_timeout_seconds,
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymmetric_algorithms_only() {
        assert_eq!(parse_algorithm("RS256").unwrap(), Algorithm::RS256);
        assert_eq!(parse_algorithm("ES256").unwrap(), Algorithm::ES256);
        assert_eq!(parse_algorithm("EdDSA").unwrap(), Algorithm::EdDSA);
        assert!(parse_algorithm("HS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn unset_or_blank_numbers_use_the_default() {
        assert_eq!(parse_or("ACCESS_TOKEN_LEEWAY_SECONDS", None, 0u64).unwrap(), 0);
        assert_eq!(parse_or("PORT", Some("  ".to_string()), 5000u16).unwrap(), 5000);
        assert_eq!(parse_or("PORT", Some(" 8080 ".to_string()), 5000u16).unwrap(), 8080);
    }

    #[test]
    fn unparsable_numbers_are_invalid() {
        let cases = [
            ("ACCESS_TOKEN_LEEWAY_SECONDS", "abc"),
            ("JWKS_FETCH_TIMEOUT_SECONDS", "5s"),
            ("JWKS_CACHE_TTL_SECONDS", "-1"),
        ];
        for (key, raw) in cases {
            let err = parse_or(key, Some(raw.to_string()), 0u64).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(k) if k == key), "{key}={raw}");
        }

        let err = parse_or("PORT", Some("70000".to_string()), 5000u16).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("PORT")));
    }
}
