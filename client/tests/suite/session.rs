use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use precept_client::KeyValueStore;
use precept_client::MemoryStore;
use precept_client::PollEvent;
use precept_client::SearchError;
use precept_core::IndexingPhase;
use precept_core::Intent;
use precept_core::PollError;
use precept_core::PollOutcome;
use precept_core::Toast;
use precept_protocol::StatusSample;
use precept_protocol::TextPart;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::support::connected;
use super::support::harness;
use super::support::harness_with_store;
use super::support::hit;
use super::support::mount_listings;
use super::support::source_type;

const FIRST_TIME_INDEXING_KEY: &str = "first_time_indexing";

fn event(outcome: PollOutcome, observed_at: Instant) -> PollEvent {
    PollEvent {
        outcome,
        observed_at,
    }
}

fn sample(in_indexing: u32, left: u32, indexed: u32) -> PollOutcome {
    Ok(StatusSample::new(in_indexing, left, indexed))
}

async fn mount_search(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn search_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/search")
        .count()
}

#[tokio::test]
async fn installation_id_survives_a_new_session() -> Result<()> {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    let first = harness_with_store(&server, Arc::clone(&store))?;
    let second = harness_with_store(&server, Arc::clone(&store))?;

    assert_eq!(first.session.installation_id(), second.session.installation_id());
    assert_eq!(
        store.get("uuid")?,
        Some(first.session.installation_id().to_string())
    );
    Ok(())
}

#[tokio::test]
async fn pending_first_time_indexing_is_restored() -> Result<()> {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(FIRST_TIME_INDEXING_KEY, "slack")?;

    let h = harness_with_store(&server, store)?;
    assert!(h.session.state().indexing.is_first_time_indexing);
    assert_eq!(h.session.source_in_indexing(), Some("slack"));
    assert_eq!(h.presenter.take(), vec![Intent::ShowNotReadyBanner]);

    let err = h.session.search("roadmap").await.err();
    assert!(matches!(err, Some(SearchError::NotReady)));
    assert_eq!(h.presenter.take(), vec![Intent::ShowNotReadyBanner]);

    let err = h.session.search("  ").await.err();
    assert!(matches!(err, Some(SearchError::NotReady)));
    assert_eq!(h.presenter.take(), vec![Intent::ShowNotReadyBanner]);
    assert_eq!(search_requests(&server).await, 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn first_source_blocks_search_until_indexing_finishes() -> Result<()> {
    let server = MockServer::start().await;
    mount_search(&server, ResponseTemplate::new(200).set_body_json(Vec::<()>::new())).await;
    let mut h = harness(&server)?;

    h.session
        .data_source_added(connected(1, "google_drive"))
        .await;
    assert!(h.session.in_indexing());
    assert!(h.session.state().indexing.is_preparing_indexing);
    assert_eq!(h.session.source_in_indexing(), Some("google_drive"));
    assert_eq!(
        h.store.get(FIRST_TIME_INDEXING_KEY)?,
        Some("google_drive".to_string())
    );
    assert_eq!(h.session.status_text(), "Indexing process in progress...");
    assert!(matches!(
        h.session.search("roadmap").await,
        Err(SearchError::NotReady)
    ));

    let t0 = Instant::now();
    let phase = h.session.apply_poll(event(sample(2, 10, 0), t0)).await;
    assert_eq!(phase, IndexingPhase::Active);
    assert_eq!(
        h.session.status_text(),
        "Indexing 2 documents... (10 in queue)"
    );

    let phase = h
        .session
        .apply_poll(event(sample(0, 0, 12), t0 + Duration::from_secs(5)))
        .await;
    assert_eq!(phase, IndexingPhase::Active);

    let phase = h
        .session
        .apply_poll(event(sample(0, 0, 12), t0 + Duration::from_millis(10_001)))
        .await;
    assert_eq!(phase, IndexingPhase::FinishedTransition);
    assert!(!h.session.in_indexing());
    assert!(!h.session.state().indexing.is_first_time_indexing);
    assert_eq!(h.session.source_in_indexing(), None);
    assert_eq!(h.store.get(FIRST_TIME_INDEXING_KEY)?, None);

    let presented = h.presenter.take();
    assert_eq!(
        presented,
        vec![
            Intent::ShowNotReadyBanner,
            Intent::HideNotReadyBanner,
            Intent::ShowToast(Toast::indexing_finished()),
        ]
    );

    let outcome = h.session.search("roadmap").await?;
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.raw_count, 0);
    assert_eq!(
        h.presenter.take(),
        vec![Intent::ShowToast(Toast::no_results())]
    );
    Ok(())
}

#[tokio::test]
async fn later_sources_do_not_block_search() -> Result<()> {
    let server = MockServer::start().await;
    mount_listings(
        &server,
        &[source_type("slack")],
        &[connected(1, "google_drive")],
    )
    .await;
    let mut h = harness(&server)?;
    h.session.refresh_connected_sources().await;

    h.session.data_source_added(connected(2, "slack")).await;
    assert!(h.session.state().indexing.is_preparing_indexing);
    assert!(!h.session.state().indexing.is_first_time_indexing);
    assert_eq!(h.store.get(FIRST_TIME_INDEXING_KEY)?, None);
    assert_eq!(
        h.session.connected_sources(),
        &[connected(1, "google_drive"), connected(2, "slack")]
    );

    h.session.data_source_removed(1);
    assert_eq!(h.session.connected_sources(), &[connected(2, "slack")]);
    Ok(())
}

#[tokio::test]
async fn server_outage_alerts_once_and_recovery_refreshes_listings() -> Result<()> {
    let server = MockServer::start().await;
    mount_listings(
        &server,
        &[
            source_type("google_drive"),
            source_type("confluence"),
            source_type("slack"),
        ],
        &[connected(4, "slack")],
    )
    .await;
    let mut h = harness(&server)?;
    let now = Instant::now();

    for _ in 0..5 {
        h.session
            .apply_poll(event(Err(PollError::Timeout), now))
            .await;
    }
    assert!(!h.session.state().is_server_down());
    assert_eq!(h.session.state().failure.server_down_count, 5);
    assert!(h.presenter.take().is_empty());

    h.session
        .apply_poll(event(
            Err(PollError::Network("connection refused".to_string())),
            now,
        ))
        .await;
    assert!(h.session.state().is_server_down());
    assert_eq!(h.session.state().failure.server_down_count, 0);
    assert_eq!(
        h.presenter.take(),
        vec![
            Intent::DismissAllToasts,
            Intent::ShowToast(Toast::server_not_responding()),
        ]
    );
    assert!(h.session.connected_sources().is_empty());

    h.session.apply_poll(event(sample(0, 0, 0), now)).await;
    assert!(!h.session.state().is_server_down());
    assert_eq!(
        h.presenter.take(),
        vec![
            Intent::DismissAllToasts,
            Intent::ShowToast(Toast::server_online()),
        ]
    );
    assert_eq!(h.session.connected_sources(), &[connected(4, "slack")]);
    assert_eq!(
        h.session
            .source_types()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["google_drive", "slack"]
    );
    Ok(())
}

#[tokio::test]
async fn hidden_host_is_never_alerted() -> Result<()> {
    let server = MockServer::start().await;
    let mut h = harness(&server)?;
    h.visibility.set(false);
    let now = Instant::now();

    for _ in 0..10 {
        h.session
            .apply_poll(event(Err(PollError::Timeout), now))
            .await;
    }
    assert!(!h.session.state().is_server_down());
    assert_eq!(h.session.state().failure.server_down_count, 10);
    assert!(h.presenter.take().is_empty());

    h.visibility.set(true);
    h.session
        .apply_poll(event(Err(PollError::Timeout), now))
        .await;
    assert!(h.session.state().is_server_down());
    Ok(())
}

#[tokio::test]
async fn search_bundles_drive_fragments_and_trims_slack() -> Result<()> {
    let server = MockServer::start().await;
    let raw = vec![
        hit("google_drive", "Roadmap", &["x"], 40.0),
        hit("slack", "#general", &["ship it", "reply"], 55.0),
        hit("google_drive", "Roadmap", &["y"], 70.0),
    ];
    mount_search(&server, ResponseTemplate::new(200).set_body_json(&raw)).await;
    let h = harness(&server)?;

    let outcome = h.session.search("  roadmap ").await?;
    assert_eq!(outcome.raw_count, 3);
    assert_eq!(outcome.results.len(), 2);

    let drive = &outcome.results[0];
    assert_eq!(
        drive.content,
        vec![TextPart::plain("x"), TextPart::plain("y")]
    );
    assert_eq!(drive.score, 70.0);

    let slack = &outcome.results[1];
    assert_eq!(slack.content, vec![TextPart::plain("ship it")]);
    assert!(h.presenter.take().is_empty());

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), Some("query=roadmap"));
    assert_eq!(
        requests[0]
            .headers
            .get("uuid")
            .and_then(|value| value.to_str().ok()),
        Some(h.session.installation_id().to_string().as_str())
    );
    Ok(())
}

#[tokio::test]
async fn search_failure_is_reported_to_the_user() -> Result<()> {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(500).set_body_json("index offline"),
    )
    .await;
    let h = harness(&server)?;

    let err = h.session.search("roadmap").await.err();
    assert!(matches!(err, Some(SearchError::RequestFailed(_))));
    assert_eq!(
        h.presenter.take(),
        vec![Intent::ShowToast(Toast::search_failed("index offline"))]
    );
    Ok(())
}

#[tokio::test]
async fn blank_query_is_rejected_locally() -> Result<()> {
    let server = MockServer::start().await;
    let h = harness(&server)?;

    assert!(matches!(
        h.session.search("   ").await,
        Err(SearchError::EmptyQuery)
    ));
    assert_eq!(search_requests(&server).await, 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn run_follows_status_until_cancelled() -> Result<()> {
    let server = MockServer::start().await;
    mount_listings(&server, &[source_type("slack")], &[connected(9, "slack")]).await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(StatusSample::new(3, 7, 20)))
        .mount(&server)
        .await;

    let mut h = harness(&server)?;
    assert_eq!(h.session.config().base_url, server.uri());

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        stopper.cancel();
    });
    let (handle, commands) = h.session.command_channel();
    drop(handle);
    tokio::time::timeout(Duration::from_secs(10), h.session.run(commands, cancel)).await?;

    assert_eq!(h.session.connected_sources(), &[connected(9, "slack")]);
    assert!(h.session.state().indexing.is_indexing);
    assert_eq!(h.session.state().indexing.docs_indexed, 20);
    let status_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/status")
        .count();
    assert!(status_requests >= 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn handle_serves_searches_and_source_events_while_running() -> Result<()> {
    let server = MockServer::start().await;
    mount_listings(&server, &[source_type("google_drive")], &[]).await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(StatusSample::new(0, 0, 0)))
        .mount(&server)
        .await;
    let raw = vec![
        hit("google_drive", "Roadmap", &["x"], 40.0),
        hit("google_drive", "Roadmap", &["y"], 70.0),
    ];
    mount_search(&server, ResponseTemplate::new(200).set_body_json(&raw)).await;

    let h = harness(&server)?;
    let store = Arc::clone(&h.store);
    let mut session = h.session;
    let (handle, commands) = session.command_channel();
    let cancel = CancellationToken::new();
    let running = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            session.run(commands, cancel).await;
            session
        }
    });

    let outcome = handle.search("roadmap").await?;
    assert_eq!(outcome.raw_count, 2);
    assert_eq!(outcome.results.len(), 1);

    handle
        .data_source_added(connected(3, "google_drive"))
        .await?;
    let err = handle.search("roadmap").await.err();
    assert!(matches!(err, Some(SearchError::NotReady)));
    assert!(handle.state().indexing.is_first_time_indexing);
    assert!(handle.in_indexing());
    assert_eq!(handle.status_text(), "Indexing process in progress...");

    handle.data_source_removed(42).await?;
    cancel.cancel();
    let session = tokio::time::timeout(Duration::from_secs(10), running).await??;

    assert_eq!(session.connected_sources(), &[connected(3, "google_drive")]);
    assert_eq!(
        store.get(FIRST_TIME_INDEXING_KEY)?,
        Some("google_drive".to_string())
    );
    assert_eq!(search_requests(&server).await, 1);
    assert!(matches!(
        handle.search("roadmap").await,
        Err(SearchError::Closed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn polling_starts_before_slow_listings_return() -> Result<()> {
    let server = MockServer::start().await;
    for listing in ["/data-sources/types", "/data-sources/connected"] {
        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Vec::<()>::new())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(StatusSample::new(0, 0, 0)))
        .mount(&server)
        .await;

    let mut h = harness(&server)?;
    let (_handle, commands) = h.session.command_channel();
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        stopper.cancel();
    });
    tokio::time::timeout(Duration::from_secs(2), h.session.run(commands, cancel)).await?;

    let status_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/status")
        .count();
    assert!(status_requests >= 1);
    assert!(h.session.connected_sources().is_empty());
    Ok(())
}
