//! In-memory version counters for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::booking::{BookingSnapshot, VersionQuery, VersionSnapshot};
use crate::domain::foundation::{DomainError, SpecialistId, WorkLocationId};
use crate::ports::VersionStore;

#[derive(Debug, Default)]
struct Counters {
    global: u64,
    specialists: HashMap<SpecialistId, u64>,
    work_locations: HashMap<WorkLocationId, u64>,
}

/// Version counters held in memory.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    counters: RwLock<Counters>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn bump(&self, snapshot: &BookingSnapshot) -> Result<(), DomainError> {
        let mut counters = self.counters.write().await;
        counters.global += 1;
        if let Some(id) = snapshot.specialist_id {
            *counters.specialists.entry(id).or_default() += 1;
        }
        if let Some(id) = snapshot.work_location_id {
            *counters.work_locations.entry(id).or_default() += 1;
        }
        Ok(())
    }

    async fn current(&self, query: &VersionQuery) -> Result<VersionSnapshot, DomainError> {
        let counters = self.counters.read().await;
        Ok(VersionSnapshot {
            version: counters.global,
            specialist_version: query
                .specialist_scope()
                .and_then(|id| counters.specialists.get(&id).copied())
                .unwrap_or(0),
            work_location_version: query
                .work_location_scope()
                .and_then(|id| counters.work_locations.get(&id).copied())
                .unwrap_or(0),
            timestamp: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::BookingId;

    #[tokio::test]
    async fn bump_increments_global_and_scoped_counters() {
        let store = InMemoryVersionStore::new();
        let snapshot = BookingSnapshot::new(BookingId::new(1))
            .with_specialist(SpecialistId::new(2))
            .with_work_location(WorkLocationId::new(3));

        store.bump(&snapshot).await.unwrap();
        store.bump(&BookingSnapshot::new(BookingId::new(2))).await.unwrap();

        let specialist_view = store
            .current(&VersionQuery {
                specialist_id: Some(SpecialistId::new(2)),
                ..VersionQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(specialist_view.version, 2);
        assert_eq!(specialist_view.specialist_version, 1);

        let supervisor_view = store
            .current(&VersionQuery {
                work_location_id: Some(WorkLocationId::new(3)),
                supervisor_mode: true,
                ..VersionQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(supervisor_view.work_location_version, 1);
    }

    #[tokio::test]
    async fn unknown_scopes_read_zero() {
        let store = InMemoryVersionStore::new();
        let view = store
            .current(&VersionQuery {
                specialist_id: Some(SpecialistId::new(99)),
                ..VersionQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(view, VersionSnapshot::default());
    }
}
