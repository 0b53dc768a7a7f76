//! # Fetch Orchestrator
//!
//! The single path every authenticated remote call takes:
//!
//! 1. obtain a valid credential from the [`CredentialCache`]
//! 2. run the call with it
//! 3. wrap `Ok` in [`FetchResult::Success`]; classify
//!    [`CatalogError::Remote`] into [`FetchResult::Failure`]
//!
//! Every other error, credential issuance included, is returned as `Err`.
//! Nothing is retried. When the server rejects the credential
//! (`ExpiredOrBadCredential`) the rejected credential is dropped from the
//! cache so that the next call obtains a fresh one; a credential that was
//! already replaced by a concurrent refresh is left alone.

use crate::classifier::{classify, ErrorKind};
use crate::envelope::FetchResult;
use crate::error::{CatalogError, Result};
use core_auth::{Credential, CredentialCache};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Runs authenticated calls and converts remote failures into data.
#[derive(Clone)]
pub struct FetchOrchestrator {
    credentials: Arc<CredentialCache>,
    event_bus: Option<EventBus>,
}

impl FetchOrchestrator {
    pub fn new(credentials: Arc<CredentialCache>) -> Self {
        Self {
            credentials,
            event_bus: None,
        }
    }

    /// Publish `CatalogEvent::FetchFailed` for every classified failure.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    /// Runs `call` with a valid credential.
    ///
    /// `operation` only labels logs and events.
    ///
    /// # Errors
    ///
    /// Returns `Err` for credential issuance failures and for any error
    /// other than [`CatalogError::Remote`] produced by `call`.
    #[instrument(skip(self, call))]
    pub async fn run_authenticated<T, F, Fut>(
        &self,
        operation: &str,
        call: F,
    ) -> Result<FetchResult<T>>
    where
        F: FnOnce(Arc<Credential>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let credential = self.credentials.get_valid_credential().await?;

        match call(Arc::clone(&credential)).await {
            Ok(data) => Ok(FetchResult::Success(data)),
            Err(CatalogError::Remote(failure)) => {
                let kind = classify(&failure);
                warn!(error_kind = %kind, failure = %failure, "Remote call failed");

                if kind == ErrorKind::ExpiredOrBadCredential {
                    debug!("Server rejected the credential; dropping it from the cache");
                    self.credentials.invalidate_if(&credential).await;
                }

                self.emit_failure(operation, kind);
                Ok(FetchResult::failure(kind))
            }
            Err(e) => {
                warn!(error = %e, "Call failed with a non-remote error");
                Err(e)
            }
        }
    }

    fn emit_failure(&self, operation: &str, kind: ErrorKind) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Catalog(CatalogEvent::FetchFailed {
                operation: operation.to_string(),
                error_kind: kind.as_str().to_string(),
                retryable: kind.is_retryable(),
            }));
        }
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("credentials", &self.credentials)
            .field("has_event_bus", &self.event_bus.is_some())
            .finish()
    }
}
