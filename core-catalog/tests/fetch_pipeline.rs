//! Orchestrator, page engine and fan-out working together over an in-memory
//! remote list.

use async_trait::async_trait;
use bridge_traits::time::{Clock, ManualClock};
use chrono::{Duration, TimeZone, Utc};
use core_auth::{ClientCredentials, Credential, CredentialCache, CredentialIssuer};
use core_catalog::{
    join_successful_keyed, CatalogError, ErrorKind, FetchOrchestrator, LoadParams, LoadRequest,
    PageEngine, Pager, PagingState, RemotePage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StubIssuer {
    clock: Arc<ManualClock>,
    issued: AtomicUsize,
}

#[async_trait]
impl CredentialIssuer for StubIssuer {
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

fn setup() -> (FetchOrchestrator, Arc<ManualClock>, Arc<StubIssuer>) {
    let clock = Arc::new(ManualClock::new(
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    ));
    let issuer = Arc::new(StubIssuer {
        clock: clock.clone(),
        issued: AtomicUsize::new(0),
    });
    let cache = CredentialCache::new(
        issuer.clone(),
        ClientCredentials::new("client", "secret"),
        clock.clone(),
    );
    (FetchOrchestrator::new(Arc::new(cache)), clock, issuer)
}

/// Remote list of `total` numbers; rejects tokens other than `valid_token`
/// with a 401 when set.
fn list_pager(orchestrator: FetchOrchestrator, total: u32, page_size: u32) -> Pager<u32> {
    Pager::new(page_size, move |params: LoadParams| {
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .run_authenticated("numbers", move |_credential| async move {
                    let end = (params.offset + params.limit).min(total);
                    let items: Vec<u32> = (params.offset.min(total)..end).collect();
                    Ok::<_, CatalogError>(RemotePage::from_total(items, params.offset, total))
                })
                .await
        }
    })
}

#[tokio::test]
async fn test_page_through_with_refresh_key() {
    let (orchestrator, _, _) = setup();
    let engine: PageEngine<u32> = list_pager(orchestrator, 10, 4).source();

    let mut pages = Vec::new();
    let mut key = None;
    loop {
        let page = engine
            .load(LoadRequest { key, load_size: 4 })
            .await
            .unwrap()
            .into_data()
            .unwrap();
        key = page.next_key;
        pages.push(page);
        if key.is_none() {
            break;
        }
    }

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[2].data, vec![8, 9]);
    assert!(engine.reached_end());

    // Anchor on item 5, which lives in page 1
    let state = PagingState::new(pages, Some(5));
    assert_eq!(engine.refresh_key(&state), Some(1));
}

#[tokio::test]
async fn test_expired_credential_is_refreshed_between_pages() {
    let (orchestrator, clock, issuer) = setup();
    let engine = list_pager(orchestrator, 100, 10).source();

    engine.load(LoadRequest::initial(10)).await.unwrap();
    clock.advance(Duration::seconds(3601));
    engine.load(LoadRequest::at(1, 10)).await.unwrap();

    assert_eq!(issuer.issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fan_out_over_first_pages() {
    let (orchestrator, _, issuer) = setup();

    let lists = [("short", 3), ("empty", 0), ("long", 120)];
    let fetches = lists.iter().map(|(name, total)| {
        let engine = list_pager(orchestrator.clone(), *total, 50).source();
        (*name, async move { engine.load(LoadRequest::initial(50)).await })
    });

    let results = join_successful_keyed(fetches).await.unwrap();

    let summary: Vec<(&str, usize, Option<u32>)> = results
        .iter()
        .map(|(name, page)| (*name, page.data.len(), page.next_key))
        .collect();
    assert_eq!(
        summary,
        vec![("short", 3, None), ("empty", 0, None), ("long", 50, Some(1))]
    );
    assert_eq!(issuer.issued.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limited_member_is_dropped() {
    let (orchestrator, _, _) = setup();

    let limited = Pager::new(20, {
        let orchestrator = orchestrator.clone();
        move |_params: LoadParams| {
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator
                    .run_authenticated("limited", |_credential| async {
                        Err::<RemotePage<u32>, _>(CatalogError::remote_status(
                            429,
                            "API rate limit exceeded",
                        ))
                    })
                    .await
            }
        }
    });
    let limited_engine = limited.source();
    let healthy_engine = list_pager(orchestrator, 5, 20).source();

    let first = limited_engine.load(LoadRequest::initial(20)).await.unwrap();
    assert_eq!(first.error(), Some(&ErrorKind::RateLimited));

    let results = join_successful_keyed(vec![
        ("limited", limited_engine.load(LoadRequest::initial(20))),
        ("healthy", healthy_engine.load(LoadRequest::initial(20))),
    ])
    .await
    .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "healthy");
}
