//! ChangeRelay - Background service that moves booking changes to the broker.
//!
//! Each cycle:
//! 1. Pull a batch from the configured [`ChangeSource`]
//! 2. Bump version counters for every decodable change
//! 3. Stamp the envelope with the publish time and publish on every
//!    channel the booking fans out to
//! 4. Settle each change according to the [`DeliveryPolicy`]
//! 5. Run source housekeeping (purging old processed rows)
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 1s | How often to poll the source |
//! | `batch_size` | 100 | Max changes per cycle |
//! | `policy` | best effort | What a failed publish does to the row |
//!
//! ## Failure isolation
//!
//! A change that cannot be decoded, published, or settled is logged and
//! skipped; it never aborts the rest of the batch.
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and drains one final batch
//! before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::booking::{ChangeEnvelope, ChannelAddress};
use crate::domain::foundation::DomainError;
use crate::ports::{ChangePublisher, ChangeSource, Clock, Settlement, SourcedChange, VersionStore};

/// What happens to a change whose publish failed on at least one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Mark it handled anyway. A sustained broker outage drops events; clients
    /// catch up through the version counters.
    BestEffort,
    /// Leave it pending and retry on later cycles; after `max_attempts`
    /// failures it is dead-lettered (handled, error kept).
    AtLeastOnce { max_attempts: u32 },
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        DeliveryPolicy::BestEffort
    }
}

/// Configuration for the ChangeRelay service.
#[derive(Debug, Clone)]
pub struct ChangeRelayConfig {
    /// How often to poll the source.
    pub poll_interval: Duration,

    /// Maximum changes to process per cycle.
    pub batch_size: u32,

    pub policy: DeliveryPolicy,
}

impl Default for ChangeRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 100,
            policy: DeliveryPolicy::BestEffort,
        }
    }
}

impl ChangeRelayConfig {
    /// Create config with custom poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create config with custom batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Counts from one relay cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    /// Settled as delivered, including best-effort partial failures.
    pub delivered: usize,
    /// Delivered although at least one channel publish failed.
    pub partial: usize,
    pub discarded: usize,
    pub retried: usize,
    pub dead_lettered: usize,
    /// Changes whose settlement could not be recorded.
    pub unsettled: usize,
    pub purged: u64,
}

/// Background service that publishes changes from a [`ChangeSource`].
pub struct ChangeRelay {
    source: Arc<dyn ChangeSource>,
    publisher: Arc<dyn ChangePublisher>,
    versions: Option<Arc<dyn VersionStore>>,
    clock: Arc<dyn Clock>,
    config: ChangeRelayConfig,
}

impl ChangeRelay {
    /// Create a new ChangeRelay with default configuration.
    pub fn new(
        source: Arc<dyn ChangeSource>,
        publisher: Arc<dyn ChangePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            publisher,
            versions: None,
            clock,
            config: ChangeRelayConfig::default(),
        }
    }

    /// Bump these counters for every relayed change.
    pub fn with_versions(mut self, versions: Arc<dyn VersionStore>) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn with_config(mut self, config: ChangeRelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ChangeRelayConfig {
        &self.config
    }

    /// Run the relay loop until shutdown signal is received.
    ///
    /// A failing cycle (source unreachable) is logged and retried on the next
    /// tick; the loop only ends on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(
            source = self.source.name(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            policy = ?self.config.policy,
            "Change relay started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.cycle().await;
                        tracing::info!(source = self.source.name(), "Change relay stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.cycle().await;
                }
            }
        }
    }

    /// Process exactly one batch (scheduled invocation mode).
    pub async fn run_once(&self) -> Result<BatchReport, DomainError> {
        self.process_batch().await
    }

    async fn cycle(&self) {
        if let Err(e) = self.process_batch().await {
            tracing::error!(source = self.source.name(), error = %e, "Relay cycle failed");
        }
    }

    /// Process a single batch of pending changes.
    pub async fn process_batch(&self) -> Result<BatchReport, DomainError> {
        let batch = self.source.poll_batch(self.config.batch_size).await?;
        let mut report = BatchReport {
            fetched: batch.len(),
            ..BatchReport::default()
        };

        for change in &batch {
            let (settlement, partial) = self.relay(change).await;
            if partial {
                report.partial += 1;
            }

            match &settlement {
                Settlement::Delivered => report.delivered += 1,
                Settlement::Discarded { .. } => report.discarded += 1,
                Settlement::Retry { .. } => report.retried += 1,
                Settlement::DeadLettered { .. } => report.dead_lettered += 1,
            }

            if let Err(e) = self.source.settle(change, settlement).await {
                report.unsettled += 1;
                tracing::error!(
                    receipt = ?change.receipt,
                    error = %e,
                    "Failed to settle change"
                );
            }
        }

        match self.source.housekeeping(self.clock.now()).await {
            Ok(purged) => report.purged = purged,
            Err(e) => tracing::warn!(error = %e, "Housekeeping failed"),
        }

        if report.fetched > 0 || report.purged > 0 {
            tracing::info!(
                source = self.source.name(),
                fetched = report.fetched,
                delivered = report.delivered,
                partial = report.partial,
                discarded = report.discarded,
                retried = report.retried,
                dead_lettered = report.dead_lettered,
                purged = report.purged,
                "Relay batch processed"
            );
        }

        Ok(report)
    }

    /// Relay one change. The flag is set when a best-effort publish failed on
    /// some channel but the change was still settled as delivered.
    async fn relay(&self, change: &SourcedChange) -> (Settlement, bool) {
        let queued = match &change.change {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(receipt = ?change.receipt, error = %e, "Skipping malformed change");
                let settlement = Settlement::Discarded {
                    reason: e.message.clone(),
                };
                return (settlement, false);
            }
        };

        // Clients judge staleness by this timestamp, so it is the publish
        // time rather than when the row was queued.
        let envelope = &ChangeEnvelope {
            timestamp: self.clock.now().as_unix_secs(),
            ..queued.clone()
        };

        // Retries were already counted on their first pass.
        if change.attempts == 0 {
            if let Some(versions) = &self.versions {
                if let Err(e) = versions.bump(&envelope.data).await {
                    tracing::warn!(
                        booking_id = %envelope.data.booking_id,
                        error = %e,
                        "Failed to bump version counters"
                    );
                }
            }
        }

        let failures = self.publish_everywhere(envelope).await;
        if failures.is_empty() {
            tracing::debug!(
                kind = %envelope.kind,
                booking_id = %envelope.data.booking_id,
                "Published change"
            );
            return (Settlement::Delivered, false);
        }

        let error = failures.join("; ");
        match self.config.policy {
            DeliveryPolicy::BestEffort => {
                tracing::warn!(
                    receipt = ?change.receipt,
                    booking_id = %envelope.data.booking_id,
                    error = %error,
                    "Partial publish failure, marking handled"
                );
                (Settlement::Delivered, true)
            }
            DeliveryPolicy::AtLeastOnce { max_attempts } => {
                let attempts = change.attempts + 1;
                if attempts >= max_attempts {
                    tracing::error!(
                        receipt = ?change.receipt,
                        attempts,
                        error = %error,
                        "Giving up on change, dead-lettering"
                    );
                    (Settlement::DeadLettered { error }, false)
                } else {
                    tracing::warn!(
                        receipt = ?change.receipt,
                        attempts,
                        error = %error,
                        "Publish failed, will retry"
                    );
                    (Settlement::Retry { error }, false)
                }
            }
        }
    }

    /// Publish on every fan-out channel; returns one message per failure.
    async fn publish_everywhere(&self, envelope: &ChangeEnvelope) -> Vec<String> {
        let mut failures = Vec::new();
        for channel in ChannelAddress::fan_out(&envelope.data) {
            if let Err(e) = self.publisher.publish(&channel, envelope).await {
                failures.push(format!("{}: {}", channel, e));
            }
        }
        failures
    }
}
