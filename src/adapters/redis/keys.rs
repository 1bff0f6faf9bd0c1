//! Redis key and channel names.

use crate::domain::booking::CHANNEL_PREFIX;
use crate::domain::foundation::{SpecialistId, WorkLocationId};

/// Pattern matching every booking channel.
pub fn channel_pattern() -> String {
    format!("{}:*", CHANNEL_PREFIX)
}

pub fn global_version_key() -> String {
    format!("{}:version", CHANNEL_PREFIX)
}

pub fn specialist_version_key(id: SpecialistId) -> String {
    format!("{}:version:specialist:{}", CHANNEL_PREFIX, id)
}

pub fn work_location_version_key(id: WorkLocationId) -> String {
    format!("{}:version:work_location:{}", CHANNEL_PREFIX, id)
}
