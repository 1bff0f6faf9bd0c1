//! Coarse version counters used by the polling fallback.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SpecialistId, WorkLocationId};

/// Which counters a poller is interested in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist_id: Option<SpecialistId>,

    #[serde(default, alias = "workpoint_id", skip_serializing_if = "Option::is_none")]
    pub work_location_id: Option<WorkLocationId>,

    #[serde(default)]
    pub supervisor_mode: bool,
}

impl VersionQuery {
    /// Specialist counter, reported only outside supervisor mode.
    pub fn specialist_scope(&self) -> Option<SpecialistId> {
        if self.supervisor_mode {
            None
        } else {
            self.specialist_id
        }
    }

    /// Work-location counter, reported only in supervisor mode.
    pub fn work_location_scope(&self) -> Option<WorkLocationId> {
        if self.supervisor_mode {
            self.work_location_id
        } else {
            None
        }
    }
}

/// Counter values returned by the version endpoint.
///
/// Counters never decrease; `timestamp` (Unix seconds) is when the endpoint
/// answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub version: u64,
    #[serde(default)]
    pub specialist_version: u64,
    #[serde(default, alias = "workpoint_version")]
    pub work_location_version: u64,
    #[serde(default)]
    pub timestamp: i64,
}

impl VersionSnapshot {
    /// Whether any counter increased relative to `previous`.
    pub fn has_advanced(&self, previous: &VersionSnapshot) -> bool {
        self.version > previous.version
            || self.specialist_version > previous.specialist_version
            || self.work_location_version > previous.work_location_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(version: u64, specialist: u64, location: u64) -> VersionSnapshot {
        VersionSnapshot {
            version,
            specialist_version: specialist,
            work_location_version: location,
            timestamp: 0,
        }
    }

    #[test]
    fn any_increase_counts_as_advanced() {
        let base = snapshot(4, 2, 1);
        assert!(snapshot(5, 2, 1).has_advanced(&base));
        assert!(snapshot(4, 3, 1).has_advanced(&base));
        assert!(snapshot(4, 2, 2).has_advanced(&base));
        assert!(!snapshot(4, 2, 1).has_advanced(&base));
    }

    #[test]
    fn decrease_is_not_an_advance() {
        assert!(!snapshot(3, 2, 1).has_advanced(&snapshot(4, 2, 1)));
    }

    #[test]
    fn query_scopes_depend_on_supervisor_mode() {
        let query = VersionQuery {
            specialist_id: Some(SpecialistId::new(1)),
            work_location_id: Some(WorkLocationId::new(2)),
            supervisor_mode: false,
        };
        assert_eq!(query.specialist_scope(), Some(SpecialistId::new(1)));
        assert_eq!(query.work_location_scope(), None);

        let supervisor = VersionQuery {
            supervisor_mode: true,
            ..query
        };
        assert_eq!(supervisor.specialist_scope(), None);
        assert_eq!(supervisor.work_location_scope(), Some(WorkLocationId::new(2)));
    }

    #[test]
    fn missing_scoped_counters_default_to_zero() {
        let parsed: VersionSnapshot = serde_json::from_str(r#"{"version": 9}"#).unwrap();
        assert_eq!(parsed.specialist_version, 0);
        assert_eq!(parsed.version, 9);
    }
}
