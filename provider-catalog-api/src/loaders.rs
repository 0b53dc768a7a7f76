//! Page loaders for the paged endpoints
//!
//! Each loader runs its request through the [`FetchOrchestrator`], so every
//! page load gets a valid credential and remote failures come back as
//! `FetchResult::Failure` instead of ending the stream with an error.

use core_auth::Credential;
use core_catalog::{FetchOrchestrator, FetchResult, LoadParams, PageLoader, Result};
use std::future::Future;
use std::sync::Arc;

use crate::connector::CatalogConnector;
use crate::types::{
    AlbumGroup, PagingObject, PlaylistTrack, SearchItem, SearchType, SimplifiedAlbum,
    SimplifiedEpisode,
};

/// Wraps a paged fetch into a [`PageLoader`].
///
/// `operation` labels logs and failure events.
pub fn paged<T, F, Fut>(
    operation: &'static str,
    orchestrator: FetchOrchestrator,
    fetch: F,
) -> Arc<dyn PageLoader<T>>
where
    T: Send + 'static,
    F: Fn(Arc<Credential>, LoadParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PagingObject<T>>> + Send + 'static,
{
    let fetch = Arc::new(fetch);

    Arc::new(move |params: LoadParams| {
        let orchestrator = orchestrator.clone();
        let fetch = Arc::clone(&fetch);

        async move {
            let result: Result<FetchResult<PagingObject<T>>> = orchestrator
                .run_authenticated(operation, move |credential| (*fetch)(credential, params))
                .await;
            result.map(|fetched| fetched.map(PagingObject::into_remote_page))
        }
    })
}

pub fn artist_albums(
    orchestrator: FetchOrchestrator,
    connector: Arc<CatalogConnector>,
    artist_id: impl Into<String>,
    include_groups: Vec<AlbumGroup>,
) -> Arc<dyn PageLoader<SimplifiedAlbum>> {
    let artist_id: Arc<str> = Arc::from(artist_id.into());
    let include_groups: Arc<[AlbumGroup]> = Arc::from(include_groups);

    paged("artist_albums", orchestrator, move |credential, params| {
        let connector = Arc::clone(&connector);
        let artist_id = Arc::clone(&artist_id);
        let include_groups = Arc::clone(&include_groups);

        async move {
            connector
                .artist_albums(
                    &credential,
                    &artist_id,
                    &include_groups,
                    params.limit,
                    params.offset,
                )
                .await
        }
    })
}

pub fn playlist_tracks(
    orchestrator: FetchOrchestrator,
    connector: Arc<CatalogConnector>,
    playlist_id: impl Into<String>,
) -> Arc<dyn PageLoader<PlaylistTrack>> {
    let playlist_id: Arc<str> = Arc::from(playlist_id.into());

    paged("playlist_tracks", orchestrator, move |credential, params| {
        let connector = Arc::clone(&connector);
        let playlist_id = Arc::clone(&playlist_id);

        async move {
            connector
                .playlist_tracks(&credential, &playlist_id, params.limit, params.offset)
                .await
        }
    })
}

pub fn show_episodes(
    orchestrator: FetchOrchestrator,
    connector: Arc<CatalogConnector>,
    show_id: impl Into<String>,
) -> Arc<dyn PageLoader<SimplifiedEpisode>> {
    let show_id: Arc<str> = Arc::from(show_id.into());

    paged("show_episodes", orchestrator, move |credential, params| {
        let connector = Arc::clone(&connector);
        let show_id = Arc::clone(&show_id);

        async move {
            connector
                .show_episodes(&credential, &show_id, params.limit, params.offset)
                .await
        }
    })
}

pub fn search(
    orchestrator: FetchOrchestrator,
    connector: Arc<CatalogConnector>,
    query: impl Into<String>,
    search_type: SearchType,
) -> Arc<dyn PageLoader<SearchItem>> {
    let query: Arc<str> = Arc::from(query.into());

    paged("search", orchestrator, move |credential, params| {
        let connector = Arc::clone(&connector);
        let query = Arc::clone(&query);

        async move {
            connector
                .search(&credential, &query, search_type, params.limit, params.offset)
                .await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::time::{Clock, ManualClock};
    use chrono::{TimeZone, Utc};
    use core_auth::{ClientCredentials, CredentialCache, CredentialIssuer};
    use core_catalog::{ErrorKind, LoadRequest, PageEngine};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct FixedIssuer {
        clock: Arc<ManualClock>,
        issued: AtomicUsize,
    }

    #[async_trait]
    impl CredentialIssuer for FixedIssuer {
        async fn issue(&self, _credentials: &ClientCredentials) -> core_auth::Result<Credential> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Credential::new(
                format!("token-{n}"),
                "Bearer",
                self.clock.now(),
                3600,
            ))
        }
    }

    fn orchestrator() -> (FetchOrchestrator, Arc<FixedIssuer>) {
        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ));
        let issuer = Arc::new(FixedIssuer {
            clock: clock.clone(),
            issued: AtomicUsize::new(0),
        });
        let cache = CredentialCache::new(
            issuer.clone(),
            ClientCredentials::new("client", "secret"),
            clock,
        );
        (FetchOrchestrator::new(Arc::new(cache)), issuer)
    }

    fn connector(mock_http: MockHttpClient) -> Arc<CatalogConnector> {
        Arc::new(CatalogConnector::new(
            Arc::new(mock_http),
            "https://api.example.com/v1",
        ))
    }

    #[tokio::test]
    async fn test_playlist_tracks_page_keys() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("/playlists/p1/tracks?limit=2&offset=2"));
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer token-1".to_string())
            );
            Ok(HttpResponse::new(
                200,
                r#"{"items": [{"track": null}, {"track": null}], "limit": 2, "offset": 2, "total": 5}"#,
            ))
        });

        let (orchestrator, _) = orchestrator();
        let engine = PageEngine::new(playlist_tracks(orchestrator, connector(mock_http), "p1"));

        let page = engine
            .load(LoadRequest::at(1, 2))
            .await
            .unwrap()
            .into_data()
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.prev_key, Some(0));
        assert_eq!(page.next_key, Some(2));
        assert_eq!(page.items_after, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_becomes_failure_page() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                429,
                r#"{"error": {"status": 429, "message": "API rate limit exceeded"}}"#,
            ))
        });

        let (orchestrator, _) = orchestrator();
        let engine = PageEngine::new(search(
            orchestrator,
            connector(mock_http),
            "miles davis",
            SearchType::Album,
        ));

        let result = engine.load(LoadRequest::initial(20)).await.unwrap();

        assert_eq!(result.error(), Some(&ErrorKind::RateLimited));
        assert!(!engine.reached_end());
    }

    #[tokio::test]
    async fn test_credential_reused_across_pages() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer token-1".to_string())
            );
            let body = if req.url.contains("offset=0") {
                r#"{"items": [{"id": "e1", "name": "Ep 1", "duration_ms": 1000}], "limit": 1, "offset": 0, "total": 2}"#
            } else {
                r#"{"items": [{"id": "e2", "name": "Ep 2", "duration_ms": 1000}], "limit": 1, "offset": 1, "total": 2}"#
            };
            Ok(HttpResponse::new(200, body))
        });

        let (orchestrator, issuer) = orchestrator();
        let engine = PageEngine::new(show_episodes(orchestrator, connector(mock_http), "s1"));

        let first = engine.load(LoadRequest::initial(1)).await.unwrap();
        assert_eq!(first.data().and_then(|page| page.next_key), Some(1));

        let second = engine.load(LoadRequest::at(1, 1)).await.unwrap();
        let second = second.into_data().unwrap();
        assert_eq!(second.data[0].id, "e2");
        assert_eq!(second.next_key, None);
        assert!(engine.reached_end());

        assert_eq!(issuer.issued.load(Ordering::SeqCst), 1);
    }
}
