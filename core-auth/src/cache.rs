//! # Credential Cache
//!
//! Holds the current bearer credential and replaces it when it expires.
//!
//! ## Concurrency
//!
//! Reads take a shared lock and return immediately while the cached
//! credential is fresh. When it is missing or expired, callers queue on a
//! dedicated refresh mutex; the first one through issues a new credential and
//! every caller behind it re-checks the cache and reuses that result. At most
//! one issuance is in flight per cache at any time.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{ClientCredentials, ClientCredentialsIssuer, CredentialCache};
//! use bridge_traits::{HttpClient, SystemClock};
//! use std::sync::Arc;
//!
//! # async fn example(http_client: Arc<dyn HttpClient>) -> core_auth::Result<()> {
//! let clock = Arc::new(SystemClock);
//! let issuer = ClientCredentialsIssuer::new(
//!     "https://accounts.spotify.com/api/token",
//!     http_client,
//!     clock.clone(),
//! );
//! let cache = CredentialCache::new(
//!     Arc::new(issuer),
//!     ClientCredentials::new("client-id", "client-secret"),
//!     clock,
//! );
//!
//! let credential = cache.get_valid_credential().await?;
//! println!("{}", credential.authorization_header());
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::issuer::CredentialIssuer;
use crate::types::{ClientCredentials, Credential};
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, CredentialEvent, EventBus};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

/// Shared cache of the bearer credential used for catalog requests.
pub struct CredentialCache {
    issuer: Arc<dyn CredentialIssuer>,
    client_credentials: ClientCredentials,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Arc<Credential>>>,
    /// Serializes issuance so concurrent misses share one request
    refresh_lock: Mutex<()>,
    refresh_leeway_secs: i64,
    event_bus: Option<EventBus>,
}

impl CredentialCache {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        client_credentials: ClientCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issuer,
            client_credentials,
            clock,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refresh_leeway_secs: 0,
            event_bus: None,
        }
    }

    /// Treat the last `seconds` of a credential's validity as expired.
    pub fn with_refresh_leeway(mut self, seconds: i64) -> Self {
        self.refresh_leeway_secs = seconds.max(0);
        self
    }

    /// Publish credential lifecycle events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Returns a credential that is not expired according to the clock,
    /// issuing a new one if necessary.
    ///
    /// # Errors
    ///
    /// Issuance failures are returned unchanged. Nothing is cached in that
    /// case, so the next call tries again.
    pub async fn get_valid_credential(&self) -> Result<Arc<Credential>> {
        if let Some(credential) = self.fresh_cached().await {
            return Ok(credential);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(credential) = self.fresh_cached().await {
            debug!("Reusing credential issued by a concurrent caller");
            return Ok(credential);
        }

        self.refresh().await
    }

    /// Returns the cached credential without checking expiry or refreshing.
    pub async fn cached(&self) -> Option<Arc<Credential>> {
        self.current.read().await.clone()
    }

    /// Drops the cached credential so the next request issues a new one.
    ///
    /// Callers use this after the server rejected a credential the clock
    /// still considered valid.
    pub async fn invalidate(&self) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            info!("Cached credential invalidated");
            self.emit(CredentialEvent::Invalidated);
        }
    }

    /// Drops the cached credential only if it is still `rejected`.
    ///
    /// A rejection that arrives after another caller already replaced the
    /// credential leaves the newer one in place. Returns whether the cache
    /// was cleared.
    pub async fn invalidate_if(&self, rejected: &Arc<Credential>) -> bool {
        let mut current = self.current.write().await;
        let still_cached = current
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, rejected));
        if !still_cached {
            debug!("Rejected credential already replaced; keeping the cache");
            return false;
        }

        *current = None;
        drop(current);
        info!("Rejected credential invalidated");
        self.emit(CredentialEvent::Invalidated);
        true
    }

    async fn fresh_cached(&self) -> Option<Arc<Credential>> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|credential| !credential.is_expired_with_leeway(now, self.refresh_leeway_secs))
            .cloned()
    }

    #[instrument(skip(self), fields(client_id = %self.client_credentials.client_id))]
    async fn refresh(&self) -> Result<Arc<Credential>> {
        debug!("Issuing a new credential");
        self.emit(CredentialEvent::Refreshing);

        let credential = match self.issuer.issue(&self.client_credentials).await {
            Ok(credential) => credential,
            Err(e) => {
                error!(error = %e, "Credential issuance failed");
                self.emit(CredentialEvent::RefreshFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        if credential.is_expired(self.clock.now()) {
            let e = AuthError::InvalidCredential(format!(
                "credential expired at {} before it could be used",
                credential.expires_at()
            ));
            error!(error = %e, "Issuer returned an expired credential");
            self.emit(CredentialEvent::RefreshFailed {
                message: e.to_string(),
            });
            return Err(e);
        }

        let credential = Arc::new(credential);
        *self.current.write().await = Some(Arc::clone(&credential));

        info!(expires_at = %credential.expires_at(), "Credential refreshed");
        self.emit(CredentialEvent::Refreshed {
            expires_at: credential.expires_at().timestamp(),
        });

        Ok(credential)
    }

    fn emit(&self, event: CredentialEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Credential(event));
        }
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("client_credentials", &self.client_credentials)
            .field("refresh_leeway_secs", &self.refresh_leeway_secs)
            .field("has_event_bus", &self.event_bus.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::time::ManualClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issues `token-N` credentials stamped with the shared clock.
    struct CountingIssuer {
        clock: Arc<ManualClock>,
        validity_secs: i64,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingIssuer {
        fn new(clock: Arc<ManualClock>, validity_secs: i64) -> Self {
            Self {
                clock,
                validity_secs,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing(clock: Arc<ManualClock>) -> Self {
            Self {
                fail: true,
                ..Self::new(clock, 3600)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialIssuer for CountingIssuer {
        async fn issue(&self, _credentials: &ClientCredentials) -> Result<Credential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.fail {
                return Err(AuthError::IssuanceFailed {
                    status: 401,
                    message: "invalid_client".to_string(),
                });
            }
            Ok(Credential::new(
                format!("token-{n}"),
                "Bearer",
                self.clock.now(),
                self.validity_secs,
            ))
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn cache_with(issuer: Arc<CountingIssuer>, clock: Arc<ManualClock>) -> CredentialCache {
        CredentialCache::new(issuer, ClientCredentials::new("client", "secret"), clock)
    }

    #[tokio::test]
    async fn test_first_call_issues_and_caches() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = cache_with(issuer.clone(), clock.clone());

        assert!(cache.cached().await.is_none());

        let first = cache.get_valid_credential().await.unwrap();
        let second = cache.get_valid_credential().await.unwrap();

        assert_eq!(first.access_token(), "token-1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn test_returned_credential_is_never_expired() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 60));
        let cache = cache_with(issuer.clone(), clock.clone());

        for step in 0..10 {
            let credential = cache.get_valid_credential().await.unwrap();
            assert!(
                !credential.is_expired(clock.now()),
                "step {step} returned an expired credential"
            );
            clock.advance(Duration::seconds(25));
        }

        // Issued at t=0, 75, 150 and 225
        assert_eq!(issuer.calls(), 4);
    }

    #[tokio::test]
    async fn test_expired_credential_is_replaced() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = cache_with(issuer.clone(), clock.clone());

        let first = cache.get_valid_credential().await.unwrap();

        clock.advance(Duration::seconds(3600));
        let still_valid = cache.get_valid_credential().await.unwrap();
        assert_eq!(still_valid.access_token(), first.access_token());

        clock.advance(Duration::seconds(1));
        let replaced = cache.get_valid_credential().await.unwrap();
        assert_eq!(replaced.access_token(), "token-2");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn test_leeway_refreshes_early() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = cache_with(issuer.clone(), clock.clone()).with_refresh_leeway(300);

        cache.get_valid_credential().await.unwrap();
        clock.advance(Duration::seconds(3301));
        let credential = cache.get_valid_credential().await.unwrap();

        assert_eq!(credential.access_token(), "token-2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_issuance() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = Arc::new(cache_with(issuer.clone(), clock.clone()));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_valid_credential().await })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            let credential = handle.unwrap().unwrap();
            assert_eq!(credential.access_token(), "token-1");
        }

        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn test_issuance_failure_propagates_and_caches_nothing() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::failing(clock.clone()));
        let cache = cache_with(issuer.clone(), clock.clone());

        let err = cache.get_valid_credential().await.unwrap_err();
        assert!(matches!(err, AuthError::IssuanceFailed { status: 401, .. }));
        assert!(cache.cached().await.is_none());

        // Next call tries again
        assert!(cache.get_valid_credential().await.is_err());
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn test_already_expired_issue_is_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), -10));
        let cache = cache_with(issuer, clock);

        let err = cache.get_valid_credential().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
        assert!(cache.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_reissue() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = cache_with(issuer.clone(), clock);

        cache.get_valid_credential().await.unwrap();
        cache.invalidate().await;
        assert!(cache.cached().await.is_none());

        let credential = cache.get_valid_credential().await.unwrap();
        assert_eq!(credential.access_token(), "token-2");
    }

    #[tokio::test]
    async fn test_stale_rejection_keeps_newer_credential() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let cache = cache_with(issuer.clone(), clock.clone());

        let old = cache.get_valid_credential().await.unwrap();
        clock.advance(Duration::seconds(3601));
        let newer = cache.get_valid_credential().await.unwrap();
        assert_eq!(newer.access_token(), "token-2");

        // The server rejects the old credential after it was replaced
        assert!(!cache.invalidate_if(&old).await);
        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.access_token(), "token-2");

        let again = cache.get_valid_credential().await.unwrap();
        assert!(Arc::ptr_eq(&again, &newer));
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejection_of_current_credential_clears_cache() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let cache = cache_with(issuer, clock).with_event_bus(bus);

        let current = cache.get_valid_credential().await.unwrap();
        assert!(cache.invalidate_if(&current).await);
        assert!(cache.cached().await.is_none());

        // Second rejection of the same credential is a no-op
        assert!(!cache.invalidate_if(&current).await);

        let mut invalidations = 0;
        while let Ok(event) = events.try_recv() {
            if event == CoreEvent::Credential(CredentialEvent::Invalidated) {
                invalidations += 1;
            }
        }
        assert_eq!(invalidations, 1);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = Arc::new(CountingIssuer::new(clock.clone(), 3600));
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let cache = cache_with(issuer, clock).with_event_bus(bus);

        cache.get_valid_credential().await.unwrap();
        cache.invalidate().await;

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Credential(CredentialEvent::Refreshing)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Credential(CredentialEvent::Refreshed {
                expires_at: start().timestamp() + 3600
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Credential(CredentialEvent::Invalidated)
        );
    }
}
