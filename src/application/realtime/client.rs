//! The client delivery loop.
//!
//! One [`RealtimeClient`] per open view. It owns a single driver task that
//! runs the stream with reconnect backoff and, after too many failures (or
//! when streaming is unavailable), falls back to polling the version
//! endpoint. All timers and the open connection live inside that task, so
//! stopping the client (or dropping it) cancels them together.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;

use super::adaptive::{AdaptiveInterval, POLL_CEILING, POLL_FLOOR};
use super::backoff::{BackoffDecision, ReconnectBackoff};
use super::mode::{ConnectionMode, ConnectionStatus};
use super::update::{ClientUpdate, StatusListener, UpdateHandler};
use crate::domain::booking::{ChangeEnvelope, ChannelAddress, VersionQuery, VersionSnapshot};
use crate::domain::foundation::{SpecialistId, StateMachine, WorkLocationId};
use crate::ports::{FrameStream, StreamConnector, StreamFrame, VersionFetcher};

/// Who is watching and how to reach the edge service.
#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    pub specialist_id: Option<SpecialistId>,
    pub work_location_id: Option<WorkLocationId>,
    pub supervisor_mode: bool,
    /// Base URL the `/events/{scope}/{id}` path is appended to.
    pub stream_base_url: String,
    pub polling_min: Duration,
    pub polling_max: Duration,
    /// False where the push stream is not available; the client then polls.
    pub streaming_enabled: bool,
    /// Log every received update at info level.
    pub debug: bool,
}

impl RealtimeOptions {
    pub fn new(stream_base_url: impl Into<String>) -> Self {
        Self {
            specialist_id: None,
            work_location_id: None,
            supervisor_mode: false,
            stream_base_url: stream_base_url.into(),
            polling_min: POLL_FLOOR,
            polling_max: POLL_CEILING,
            streaming_enabled: true,
            debug: false,
        }
    }

    pub fn for_specialist(mut self, id: SpecialistId) -> Self {
        self.specialist_id = Some(id);
        self
    }

    pub fn for_work_location(mut self, id: WorkLocationId) -> Self {
        self.work_location_id = Some(id);
        self
    }

    pub fn supervisor(mut self, supervisor_mode: bool) -> Self {
        self.supervisor_mode = supervisor_mode;
        self
    }

    pub fn with_polling_interval(mut self, min: Duration, max: Duration) -> Self {
        self.polling_min = min;
        self.polling_max = max;
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Channel this viewer listens on: a specialist's own calendar, a
    /// supervisor's work location, or everything.
    pub fn channel(&self) -> ChannelAddress {
        match (self.specialist_id, self.work_location_id, self.supervisor_mode) {
            (Some(specialist), _, false) => ChannelAddress::Specialist(specialist),
            (_, Some(location), true) => ChannelAddress::WorkLocation(location),
            _ => ChannelAddress::Admin,
        }
    }

    pub fn stream_url(&self) -> String {
        format!(
            "{}{}",
            self.stream_base_url.trim_end_matches('/'),
            self.channel().stream_path()
        )
    }

    pub fn version_query(&self) -> VersionQuery {
        VersionQuery {
            specialist_id: self.specialist_id,
            work_location_id: self.work_location_id,
            supervisor_mode: self.supervisor_mode,
        }
    }
}

/// Point-in-time view of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    pub enabled: bool,
    pub mode: ConnectionMode,
    pub reconnect_attempts: u32,
    pub backoff: Duration,
    pub polling_interval: Duration,
    pub reconnect_pending: bool,
    pub last_versions: Option<VersionSnapshot>,
}

#[derive(Debug)]
struct ClientState {
    enabled: bool,
    mode: ConnectionMode,
    backoff: ReconnectBackoff,
    interval: AdaptiveInterval,
    reconnect_pending: bool,
    last_versions: Option<VersionSnapshot>,
    poll_failing: bool,
}

struct Shared {
    options: RealtimeOptions,
    connector: Arc<dyn StreamConnector>,
    fetcher: Arc<dyn VersionFetcher>,
    updates: Arc<dyn UpdateHandler>,
    status: Arc<dyn StatusListener>,
    state: Mutex<ClientState>,
}

/// Keeps one view up to date with booking changes.
pub struct RealtimeClient {
    shared: Arc<Shared>,
    driver: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeClient {
    pub fn new(
        options: RealtimeOptions,
        connector: Arc<dyn StreamConnector>,
        fetcher: Arc<dyn VersionFetcher>,
        updates: Arc<dyn UpdateHandler>,
        status: Arc<dyn StatusListener>,
    ) -> Self {
        let interval = AdaptiveInterval::new(options.polling_min, options.polling_max);
        Self {
            shared: Arc::new(Shared {
                options,
                connector,
                fetcher,
                updates,
                status,
                state: Mutex::new(ClientState {
                    enabled: false,
                    mode: ConnectionMode::Disconnected,
                    backoff: ReconnectBackoff::new(),
                    interval,
                    reconnect_pending: false,
                    last_versions: None,
                    poll_failing: false,
                }),
            }),
            driver: tokio::sync::Mutex::new(None),
        }
    }

    pub fn options(&self) -> &RealtimeOptions {
        &self.shared.options
    }

    /// Begin delivering updates. Has no effect while already running.
    pub async fn start(&self) {
        let mut driver = self.driver.lock().await;
        if driver.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        {
            let mut state = self.shared.state();
            state.enabled = true;
            state.backoff.reset();
            state.interval.reset();
            state.reconnect_pending = false;
            state.last_versions = None;
            state.poll_failing = false;
        }

        tracing::info!(url = %self.shared.options.stream_url(), "Starting realtime booking updates");
        *driver = Some(tokio::spawn(Arc::clone(&self.shared).drive()));
    }

    /// Close the connection and cancel every timer. Safe to call repeatedly.
    pub async fn stop(&self) {
        if let Some(handle) = self.driver.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }

        let changed = {
            let mut state = self.shared.state();
            state.enabled = false;
            state.reconnect_pending = false;
            if state.mode == ConnectionMode::Stopped {
                false
            } else {
                state.mode = ConnectionMode::Stopped;
                true
            }
        };

        if changed {
            tracing::info!("Stopped realtime booking updates");
            self.shared
                .report(ConnectionStatus::Stopped, "Real-time updates stopped");
        }
    }

    /// Stop when running, start when stopped. Returns whether updates are
    /// now enabled.
    pub async fn toggle(&self) -> bool {
        if self.shared.state().enabled {
            self.stop().await;
            false
        } else {
            self.start().await;
            true
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        self.shared.state().mode
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        let state = self.shared.state();
        ClientSnapshot {
            enabled: state.enabled,
            mode: state.mode,
            reconnect_attempts: state.backoff.attempts(),
            backoff: state.backoff.delay(),
            polling_interval: state.interval.current(),
            reconnect_pending: state.reconnect_pending,
            last_versions: state.last_versions,
        }
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.get_mut().take() {
            handle.abort();
        }
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, next: ConnectionMode) {
        let mut state = self.state();
        if state.mode == next {
            return;
        }
        match state.mode.transition_to(next) {
            Ok(mode) => state.mode = mode,
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected connection mode change");
                state.mode = next;
            }
        }
    }

    fn report(&self, status: ConnectionStatus, message: &str) {
        let mode = self.state().mode;
        self.status.on_status(status, message, mode);
    }

    async fn drive(self: Arc<Self>) {
        if self.options.streaming_enabled {
            self.run_stream().await;
        } else {
            tracing::info!("Push stream not available, falling back to polling");
        }
        self.run_polling().await;
    }

    /// Returns once the stream has been given up on.
    async fn run_stream(&self) {
        let url = self.options.stream_url();

        loop {
            self.enter(ConnectionMode::Connecting);
            tracing::debug!(%url, "Connecting to booking stream");

            match self.connector.connect(&url).await {
                Ok(frames) => {
                    self.enter(ConnectionMode::Connected);
                    self.state().backoff.reset();
                    tracing::info!(%url, "Booking stream established");
                    self.report(ConnectionStatus::Connected, "Real-time (SSE)");

                    let reason = self.consume(frames).await;
                    tracing::warn!(%reason, "Booking stream closed");
                }
                Err(e) => tracing::warn!(error = %e, "Booking stream connection failed"),
            }

            let decision = self.state().backoff.record_failure();
            match decision {
                BackoffDecision::Retry(delay) => {
                    self.enter(ConnectionMode::Reconnecting);
                    self.state().reconnect_pending = true;
                    self.report(
                        ConnectionStatus::Reconnecting,
                        &format!("Reconnecting in {}s...", delay.as_secs()),
                    );
                    tokio::time::sleep(delay).await;
                    self.state().reconnect_pending = false;
                }
                BackoffDecision::GiveUp => {
                    tracing::warn!("Too many stream failures, switching to polling");
                    return;
                }
            }
        }
    }

    /// Reads frames until the stream ends; returns why it ended.
    async fn consume(&self, mut frames: FrameStream) -> String {
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(StreamFrame::Message(raw)) => match ChangeEnvelope::from_json(&raw) {
                    Ok(envelope) => {
                        if self.options.debug {
                            tracing::info!(event_key = %envelope.key(), "Booking update received");
                        } else {
                            tracing::debug!(event_key = %envelope.key(), "Booking update received");
                        }
                        self.updates.on_update(ClientUpdate::Change(envelope)).await;
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring unparsable stream message"),
                },
                Ok(StreamFrame::Connected(info)) => {
                    tracing::debug!(%info, "Stream handshake received")
                }
                Ok(StreamFrame::Heartbeat) => tracing::trace!("Heartbeat received"),
                Err(e) => return e.to_string(),
            }
        }
        "server closed the stream".to_string()
    }

    async fn run_polling(&self) {
        let interval = {
            let mut state = self.state();
            state.interval.reset();
            state.interval.current()
        };
        self.enter(ConnectionMode::Polling);
        self.report(
            ConnectionStatus::Connected,
            &format!("Polling ({}s)", interval.as_secs()),
        );

        self.poll_once().await;
        loop {
            let wait = self.state().interval.current();
            tokio::time::sleep(wait).await;
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        let query = self.options.version_query();

        match self.fetcher.fetch(&query).await {
            Ok(current) => {
                let (changed, recovered, interval) = {
                    let mut state = self.state();
                    let previous = state.last_versions.replace(current);
                    let changed = match previous {
                        // First answer is the baseline.
                        None => false,
                        Some(previous) if current.has_advanced(&previous) => {
                            state.interval.record_change();
                            true
                        }
                        Some(_) => {
                            state.interval.record_no_change();
                            false
                        }
                    };
                    let recovered = std::mem::replace(&mut state.poll_failing, false);
                    (changed, recovered, state.interval.current())
                };

                if recovered {
                    self.report(
                        ConnectionStatus::Connected,
                        &format!("Polling ({}s)", interval.as_secs()),
                    );
                }
                if changed {
                    tracing::info!(version = current.version, "Version change detected");
                    self.updates
                        .on_update(ClientUpdate::VersionChange(current))
                        .await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Version poll failed");
                self.state().poll_failing = true;
                self.report(ConnectionStatus::Error, "Connection error");
            }
        }
    }
}
