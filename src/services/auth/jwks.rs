//! Signing key set (JWKS) retrieval and caching.
//!
//! The identity provider publishes its public keys as a JWKS document. `KeyStore` keeps an
//! immutable snapshot of those keys (key id -> `DecodingKey`) that concurrent requests read
//! without blocking each other; a refresh builds a new snapshot and swaps it in.
//!
//! Where the keys come from is behind `KeySetProvider`, so tests (and offline setups) can
//! hand in a fixed key set instead of going over the network.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{
    DecodingKey,
    jwk::{JwkSet, PublicKeyUse},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("jwks request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("jwks fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of the trusted signing keys.
#[async_trait]
pub trait KeySetProvider: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches the JWKS document over HTTP (e.g. `https://<tenant>/.well-known/jwks.json`).
#[derive(Debug, Clone)]
pub struct RemoteKeySetProvider {
    client: reqwest::Client,
    url: Url,
}

impl RemoteKeySetProvider {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySetProvider for RemoteKeySetProvider {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        debug!(url = %self.url, "fetching jwks");

        let jwks = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        Ok(jwks)
    }
}

/// A fixed key set (inline configuration, tests).
#[derive(Debug, Clone)]
pub struct StaticKeySetProvider {
    jwks: JwkSet,
}

impl StaticKeySetProvider {
    pub fn new(jwks: JwkSet) -> Self {
        Self { jwks }
    }
}

#[async_trait]
impl KeySetProvider for StaticKeySetProvider {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        Ok(self.jwks.clone())
    }
}

/// Immutable snapshot of verification keys indexed by key id.
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeySet {
    fn empty() -> Self {
        Self {
            keys: HashMap::new(),
            fetched_at: None,
        }
    }

    /// Keys without a `kid`, encryption keys and key material `jsonwebtoken` cannot load
    /// are skipped.
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.as_deref() else {
                continue;
            };
            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                continue;
            }
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid.to_string(), key);
                }
                Err(err) => warn!(kid, error = %err, "skipping unusable jwk"),
            }
        }

        Self {
            keys,
            fetched_at: Some(Instant::now()),
        }
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Outcome of the most recent fetch, guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    finished_at: Option<Instant>,
    failed: bool,
}

/// Process-wide cache of the signing key set.
pub struct KeyStore {
    provider: Arc<dyn KeySetProvider>,
    snapshot: RwLock<Arc<KeySet>>,
    // Serializes refreshes so a burst of unknown `kid`s causes one fetch, not one per request.
    refresh: Mutex<RefreshState>,
    ttl: Duration,
    fetch_timeout: Duration,
    // Floor between fetches caused by unknown `kid`s or by a failed fetch.
    min_refresh_interval: Duration,
    // How long past `ttl` a snapshot may still be used when the provider cannot be refreshed.
    max_stale: Duration,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("keys", &self.current().len())
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .field("max_stale", &self.max_stale)
            .finish()
    }
}

impl KeyStore {
    pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

    /// Defaults: one refetch per 30s for unknown `kid`s, no stale grace (fail closed).
    pub fn new(provider: Arc<dyn KeySetProvider>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            provider,
            snapshot: RwLock::new(Arc::new(KeySet::empty())),
            refresh: Mutex::new(RefreshState::default()),
            ttl,
            fetch_timeout,
            min_refresh_interval: Self::DEFAULT_MIN_REFRESH_INTERVAL,
            max_stale: Duration::ZERO,
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn with_max_stale(mut self, max_stale: Duration) -> Self {
        self.max_stale = max_stale;
        self
    }

    /// Current snapshot. The lock is held only long enough to clone the `Arc`.
    pub fn current(&self) -> Arc<KeySet> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn install(&self, next: Arc<KeySet>) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Resolve the verification key for `kid`.
    ///
    /// A stale snapshot or a miss triggers at most one fetch, shared by every caller queued
    /// behind it. Misses on a fresh snapshot and retries after a failed fetch are limited to
    /// one fetch per `min_refresh_interval`. `None` means the key is unknown to the provider,
    /// or the provider could not be reached in time and the snapshot is past its grace.
    pub async fn resolve(&self, kid: &str) -> Option<DecodingKey> {
        let seen = self.current();
        if seen.is_fresh(self.ttl)
            && let Some(key) = seen.get(kid)
        {
            return Some(key.clone());
        }

        let queued_at = Instant::now();
        let mut state = self.refresh.lock().await;

        let latest = self.current();
        if latest.is_fresh(self.ttl)
            && let Some(key) = latest.get(kid)
        {
            return Some(key.clone());
        }

        if let Some(finished_at) = state.finished_at {
            // A fetch completed while this call was queued: take its outcome as ours.
            if finished_at >= queued_at {
                return self.fallback(&latest, kid);
            }

            let cooling = finished_at.elapsed() < self.min_refresh_interval;
            if cooling && (state.failed || latest.is_fresh(self.ttl)) {
                debug!(kid, "jwks refresh skipped, last fetch too recent");
                return self.fallback(&latest, kid);
            }
        }

        let outcome = self.refresh().await;
        state.finished_at = Some(Instant::now());
        state.failed = outcome.is_err();

        match outcome {
            Ok(fresh) => fresh.get(kid).cloned(),
            Err(err) => {
                warn!(kid, error = %err, "jwks refresh failed");
                self.fallback(&latest, kid)
            }
        }
    }

    /// Key lookup when no fetch happens for this call: past `ttl + max_stale` nothing is served.
    fn fallback(&self, snapshot: &KeySet, kid: &str) -> Option<DecodingKey> {
        if snapshot.is_fresh(self.ttl.saturating_add(self.max_stale)) {
            snapshot.get(kid).cloned()
        } else {
            None
        }
    }

    async fn refresh(&self) -> Result<Arc<KeySet>, KeySetError> {
        let jwks = tokio::time::timeout(self.fetch_timeout, self.provider.fetch())
            .await
            .map_err(|_| KeySetError::Timeout(self.fetch_timeout))??;

        let next = Arc::new(KeySet::from_jwks(&jwks));
        info!(keys = next.len(), "jwks refreshed");

        self.install(Arc::clone(&next));
        Ok(next)
    }
}
