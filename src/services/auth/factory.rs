/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, KeySource};
use crate::services::auth::jwks::{
    KeySetError, KeySetProvider, KeyStore, RemoteKeySetProvider, StaticKeySetProvider,
};
use crate::services::auth::{AuthService, TokenPolicy};

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, KeySetError> {
    let auth = &config.auth;
    let fetch_timeout = Duration::from_secs(auth.jwks_fetch_timeout_seconds);

    let provider: Arc<dyn KeySetProvider> = match &auth.key_source {
        KeySource::Remote(url) => {
            tracing::info!(url = %url, "using remote jwks");
            Arc::new(RemoteKeySetProvider::new(url.clone(), fetch_timeout)?)
        }
        KeySource::Inline(jwks) => {
            tracing::info!(keys = jwks.keys.len(), "using inline jwks");
            Arc::new(StaticKeySetProvider::new(jwks.clone()))
        }
    };

    let keys = KeyStore::new(
        provider,
        Duration::from_secs(auth.jwks_cache_ttl_seconds),
        fetch_timeout,
    )
    .with_min_refresh_interval(Duration::from_secs(auth.jwks_min_refresh_interval_seconds))
    .with_max_stale(Duration::from_secs(auth.jwks_max_stale_seconds));

    let policy = TokenPolicy {
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
        algorithm: auth.algorithm,
        permissions_claim: auth.permissions_claim.clone(),
        leeway_seconds: auth.leeway_seconds,
    };

    Ok(Arc::new(AuthService::new(policy, keys)))
}
