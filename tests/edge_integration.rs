//! The edge served over a real socket, exercised through the HTTP client
//! adapters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use booking_realtime::adapters::edge::VersionResponse;
use booking_realtime::adapters::{
    edge_router, ChannelHub, EdgeState, HttpStreamConnector, HttpVersionFetcher,
    InMemoryVersionStore, SystemClock,
};
use booking_realtime::application::realtime::{
    ClientUpdate, ConnectionMode, RealtimeClient, RealtimeOptions,
};
use booking_realtime::domain::booking::{
    BookingSnapshot, ChangeEnvelope, ChangeKind, ChannelAddress, VersionQuery,
};
use booking_realtime::domain::foundation::{BookingId, SpecialistId, Timestamp};
use booking_realtime::ports::{
    ChangePublisher, StreamConnector, StreamFrame, VersionFetcher, VersionStore,
};

use common::*;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Edge {
    base_url: String,
    hub: Arc<ChannelHub>,
    versions: Arc<InMemoryVersionStore>,
    server: JoinHandle<()>,
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn spawn_edge(heartbeat: Duration) -> Edge {
    let hub = Arc::new(ChannelHub::new(16));
    let versions = Arc::new(InMemoryVersionStore::new());
    let state = EdgeState::new(hub.clone(), versions.clone(), Arc::new(SystemClock))
        .with_heartbeat_interval(heartbeat);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, edge_router(state)).await.unwrap();
    });

    Edge {
        base_url: format!("http://{}", addr),
        hub,
        versions,
        server,
    }
}

async fn eventually<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn booking(id: i64) -> BookingSnapshot {
    BookingSnapshot::new(BookingId::new(id))
        .with_specialist(SpecialistId::new(3))
        .with_client_name("Ana Pop")
}

#[tokio::test]
async fn stream_client_receives_published_change() {
    let edge = spawn_edge(Duration::from_secs(30)).await;
    let channel = ChannelAddress::Specialist(SpecialistId::new(3));
    let (updates, seen) = recording_handler();
    let (status, _) = recording_status();

    let client = RealtimeClient::new(
        RealtimeOptions::new(edge.base_url.clone()).for_specialist(SpecialistId::new(3)),
        Arc::new(HttpStreamConnector::new(TIMEOUT).unwrap()),
        Arc::new(
            HttpVersionFetcher::new(format!("{}/versions", edge.base_url), TIMEOUT).unwrap(),
        ),
        updates,
        status,
    );
    client.start().await;

    // The hub only knows the client once the stream handler has run.
    let mut joined = false;
    for _ in 0..500 {
        if edge.hub.client_count(&channel).await == 1 {
            joined = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(joined, "client never joined the channel");
    eventually("connected mode", || client.mode() == ConnectionMode::Connected).await;

    let envelope = ChangeEnvelope::new(ChangeKind::Update, Timestamp::now(), booking(42));
    edge.hub.publish(&channel, &envelope).await.unwrap();

    eventually("the change", || !seen.lock().unwrap().is_empty()).await;
    match &seen.lock().unwrap()[0] {
        ClientUpdate::Change(received) => {
            assert_eq!(received.kind, ChangeKind::Update);
            assert_eq!(received.data.booking_id, BookingId::new(42));
            assert_eq!(received.data.client_name.as_deref(), Some("Ana Pop"));
        }
        other => panic!("expected a change, got {:?}", other),
    }

    client.stop().await;
}

#[tokio::test]
async fn polling_client_detects_a_version_bump() {
    let edge = spawn_edge(Duration::from_secs(30)).await;
    let (updates, seen) = recording_handler();
    let (status, _) = recording_status();

    let client = RealtimeClient::new(
        RealtimeOptions::new(edge.base_url.clone())
            .for_specialist(SpecialistId::new(3))
            .with_streaming(false)
            .with_polling_interval(Duration::from_millis(50), Duration::from_millis(200)),
        Arc::new(HttpStreamConnector::new(TIMEOUT).unwrap()),
        Arc::new(
            HttpVersionFetcher::new(format!("{}/versions", edge.base_url), TIMEOUT).unwrap(),
        ),
        updates,
        status,
    );
    client.start().await;
    eventually("polling mode", || client.mode() == ConnectionMode::Polling).await;

    eventually("a baseline", || client.snapshot().last_versions.is_some()).await;
    assert!(seen.lock().unwrap().is_empty());

    edge.versions.bump(&booking(1)).await.unwrap();

    eventually("the version change", || !seen.lock().unwrap().is_empty()).await;
    match &seen.lock().unwrap()[0] {
        ClientUpdate::VersionChange(snapshot) => {
            assert_eq!(snapshot.version, 1);
            assert_eq!(snapshot.specialist_version, 1);
        }
        other => panic!("expected a version change, got {:?}", other),
    }

    client.stop().await;
}

#[tokio::test]
async fn stream_opens_with_connected_then_heartbeats() {
    let edge = spawn_edge(Duration::from_millis(100)).await;
    let connector = HttpStreamConnector::new(TIMEOUT).unwrap();

    let url = format!("{}/events/specialist/3", edge.base_url);
    let mut frames = connector.connect(&url).await.unwrap();

    let first = tokio::time::timeout(TIMEOUT, frames.next()).await.unwrap();
    match first {
        Some(Ok(StreamFrame::Connected(payload))) => {
            assert_eq!(payload["scope"], "specialist");
            assert_eq!(payload["id"], "3");
        }
        other => panic!("expected connected frame, got {:?}", other),
    }

    for _ in 0..2 {
        let next = tokio::time::timeout(TIMEOUT, frames.next()).await.unwrap();
        assert!(matches!(next, Some(Ok(StreamFrame::Heartbeat))), "got {:?}", next);
    }
}

#[tokio::test]
async fn unknown_scope_is_rejected_before_streaming() {
    let edge = spawn_edge(Duration::from_secs(30)).await;
    let connector = HttpStreamConnector::new(TIMEOUT).unwrap();

    let result = connector
        .connect(&format!("{}/events/team/3", edge.base_url))
        .await;

    assert!(result.is_err());
    assert_eq!(edge.hub.total_client_count().await, 0);
}

#[tokio::test]
async fn version_endpoint_reports_scoped_counters() {
    let edge = spawn_edge(Duration::from_secs(30)).await;
    edge.versions.bump(&booking(1)).await.unwrap();
    edge.versions.bump(&booking(2)).await.unwrap();

    let fetcher = HttpVersionFetcher::new(format!("{}/versions", edge.base_url), TIMEOUT).unwrap();
    let snapshot = fetcher
        .fetch(&VersionQuery {
            specialist_id: Some(SpecialistId::new(3)),
            ..VersionQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.specialist_version, 2);
    assert!(snapshot.timestamp > 0);

    let raw: VersionResponse = reqwest::get(format!("{}/versions", edge.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(raw.store_connected);
    assert_eq!(raw.counters.specialist_version, 0);
}
