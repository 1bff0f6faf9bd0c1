//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use booking_realtime::application::realtime::{
    ClientUpdate, ConnectionMode, ConnectionStatus, FnUpdateHandler, Refresh, StatusListener,
    UpdateHandler,
};
use booking_realtime::domain::booking::{VersionQuery, VersionSnapshot};
use booking_realtime::ports::{FrameStream, StreamConnector, StreamFrame, TransportError, VersionFetcher};

pub const T0: i64 = 1_700_000_000;

/// One scripted connection attempt.
pub enum Attempt {
    Refuse,
    /// Frames, each delivered after its delay; the stream then stays open.
    Timed(Vec<(Duration, StreamFrame)>),
}

#[derive(Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Attempt>>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Attempt>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamConnector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<FrameStream, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Attempt::Timed(frames)) => Ok(stream::iter(frames)
                .then(|(delay, frame)| async move {
                    tokio::time::sleep(delay).await;
                    Ok(frame)
                })
                .chain(stream::pending())
                .boxed()),
            Some(Attempt::Refuse) | None => Err(TransportError::Connect("connection refused".into())),
        }
    }
}

/// Answers polls from a function of the call index and records call times.
pub struct FnFetcher<F> {
    answer: F,
    calls: Mutex<Vec<tokio::time::Instant>>,
}

impl<F> FnFetcher<F>
where
    F: Fn(usize) -> Result<VersionSnapshot, TransportError> + Send + Sync,
{
    pub fn new(answer: F) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().clone()
    }

    /// Milliseconds between consecutive calls.
    pub fn gaps_ms(&self) -> Vec<u128> {
        self.call_times()
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis())
            .collect()
    }
}

#[async_trait]
impl<F> VersionFetcher for FnFetcher<F>
where
    F: Fn(usize) -> Result<VersionSnapshot, TransportError> + Send + Sync,
{
    async fn fetch(&self, _query: &VersionQuery) -> Result<VersionSnapshot, TransportError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tokio::time::Instant::now());
            calls.len() - 1
        };
        (self.answer)(index)
    }
}

pub fn versions(version: u64) -> VersionSnapshot {
    VersionSnapshot {
        version,
        specialist_version: 0,
        work_location_version: 0,
        timestamp: T0,
    }
}

/// A stream `message` frame carrying an update envelope.
pub fn message(kind: &str, booking: i64, timestamp: i64) -> StreamFrame {
    StreamFrame::Message(format!(
        r#"{{"type":"{}","timestamp":{},"data":{{"booking_id":{},"specialist_id":3,"client_full_name":"Ana Pop"}}}}"#,
        kind, timestamp, booking
    ))
}

pub type Recorded<T> = Arc<Mutex<Vec<T>>>;

pub fn recording_handler() -> (Arc<dyn UpdateHandler>, Recorded<ClientUpdate>) {
    let seen: Recorded<ClientUpdate> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (
        Arc::new(FnUpdateHandler(move |update: ClientUpdate| {
            sink.lock().unwrap().push(update)
        })),
        seen,
    )
}

pub fn recording_status() -> (
    Arc<dyn StatusListener>,
    Recorded<(ConnectionStatus, String, ConnectionMode)>,
) {
    let seen: Recorded<(ConnectionStatus, String, ConnectionMode)> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (
        Arc::new(move |status: ConnectionStatus, message: &str, mode: ConnectionMode| {
            sink.lock().unwrap().push((status, message.to_string(), mode))
        }),
        seen,
    )
}

/// Refresh action that only counts.
pub fn counting_refresh() -> (Arc<dyn Refresh>, Arc<AtomicU64>) {
    let count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&count);
    (
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        count,
    )
}
