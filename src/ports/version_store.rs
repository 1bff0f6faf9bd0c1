//! VersionStore port - Coarse change counters for polling clients.

use async_trait::async_trait;

use crate::domain::booking::{BookingSnapshot, VersionQuery, VersionSnapshot};
use crate::domain::foundation::DomainError;

/// Port for the global / per-specialist / per-work-location counters.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Increment the global counter and the counters of every scope the
    /// booking belongs to.
    async fn bump(&self, snapshot: &BookingSnapshot) -> Result<(), DomainError>;

    /// Current counters for a query. Scopes the query does not cover read 0;
    /// `timestamp` is left for the caller to fill.
    async fn current(&self, query: &VersionQuery) -> Result<VersionSnapshot, DomainError>;
}
