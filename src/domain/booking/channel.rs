//! Channel naming shared by the publish side (relay) and the subscribe side
//! (edge service).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BookingSnapshot;
use crate::domain::foundation::{SpecialistId, ValidationError, WorkLocationId};

/// Prefix of every broker channel.
pub const CHANNEL_PREFIX: &str = "bookings";

/// Id segment of the admin channel.
pub const ADMIN_CHANNEL_ID: &str = "all";

/// Which audience a channel addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelScope {
    Specialist,
    WorkLocation,
    Admin,
}

impl ChannelScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelScope::Specialist => "specialist",
            ChannelScope::WorkLocation => "work_location",
            ChannelScope::Admin => "admin",
        }
    }
}

impl fmt::Display for ChannelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "specialist" => Ok(ChannelScope::Specialist),
            "work_location" => Ok(ChannelScope::WorkLocation),
            "admin" => Ok(ChannelScope::Admin),
            other => Err(ValidationError::invalid_format(
                "scope",
                format!("unknown scope '{}'", other),
            )),
        }
    }
}

/// A `(scope, id)` channel address.
///
/// The admin channel receives every change regardless of specialist or work
/// location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelAddress {
    Specialist(SpecialistId),
    WorkLocation(WorkLocationId),
    Admin,
}

impl ChannelAddress {
    /// Parses the `(scope, id)` pair from a stream endpoint path.
    pub fn parse(scope: &str, id: &str) -> Result<Self, ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("id"));
        }
        let invalid_id = |_| ValidationError::invalid_format("id", format!("'{}' is not numeric", id));

        match scope.parse::<ChannelScope>()? {
            ChannelScope::Specialist => Ok(Self::Specialist(id.parse().map_err(invalid_id)?)),
            ChannelScope::WorkLocation => Ok(Self::WorkLocation(id.parse().map_err(invalid_id)?)),
            // Any id addresses the single admin channel.
            ChannelScope::Admin => Ok(Self::Admin),
        }
    }

    /// Parses a broker channel name (`bookings:{scope}:{id}`).
    pub fn from_channel_name(name: &str) -> Result<Self, ValidationError> {
        let mut parts = name.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(CHANNEL_PREFIX), Some(scope), Some(id)) => Self::parse(scope, id),
            _ => Err(ValidationError::invalid_format(
                "channel",
                format!("'{}' is not a booking channel", name),
            )),
        }
    }

    pub fn scope(&self) -> ChannelScope {
        match self {
            ChannelAddress::Specialist(_) => ChannelScope::Specialist,
            ChannelAddress::WorkLocation(_) => ChannelScope::WorkLocation,
            ChannelAddress::Admin => ChannelScope::Admin,
        }
    }

    /// The id segment as it appears in paths and channel names.
    pub fn id(&self) -> String {
        match self {
            ChannelAddress::Specialist(id) => id.to_string(),
            ChannelAddress::WorkLocation(id) => id.to_string(),
            ChannelAddress::Admin => ADMIN_CHANNEL_ID.to_string(),
        }
    }

    /// Broker channel name.
    pub fn channel_name(&self) -> String {
        format!("{}:{}:{}", CHANNEL_PREFIX, self.scope(), self.id())
    }

    /// Path of the edge stream endpoint for this channel.
    pub fn stream_path(&self) -> String {
        format!("/events/{}/{}", self.scope(), self.id())
    }

    /// Every channel a change to this booking is published on.
    pub fn fan_out(snapshot: &BookingSnapshot) -> Vec<ChannelAddress> {
        let mut channels = Vec::with_capacity(3);
        if let Some(id) = snapshot.specialist_id {
            channels.push(ChannelAddress::Specialist(id));
        }
        if let Some(id) = snapshot.work_location_id {
            channels.push(ChannelAddress::WorkLocation(id));
        }
        channels.push(ChannelAddress::Admin);
        channels
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.channel_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::BookingId;

    #[test]
    fn fan_out_covers_specialist_location_and_admin() {
        let snapshot = BookingSnapshot::new(BookingId::new(1))
            .with_specialist(SpecialistId::new(4))
            .with_work_location(WorkLocationId::new(2));

        assert_eq!(
            ChannelAddress::fan_out(&snapshot),
            vec![
                ChannelAddress::Specialist(SpecialistId::new(4)),
                ChannelAddress::WorkLocation(WorkLocationId::new(2)),
                ChannelAddress::Admin,
            ]
        );
    }

    #[test]
    fn fan_out_always_includes_admin() {
        let snapshot = BookingSnapshot::new(BookingId::new(1));
        assert_eq!(ChannelAddress::fan_out(&snapshot), vec![ChannelAddress::Admin]);
    }

    #[test]
    fn channel_names_follow_prefix_scope_id() {
        assert_eq!(
            ChannelAddress::WorkLocation(WorkLocationId::new(8)).channel_name(),
            "bookings:work_location:8"
        );
        assert_eq!(ChannelAddress::Admin.channel_name(), "bookings:admin:all");
    }

    #[test]
    fn channel_name_parses_back_to_address() {
        let address = ChannelAddress::Specialist(SpecialistId::new(15));
        assert_eq!(
            ChannelAddress::from_channel_name(&address.channel_name()).unwrap(),
            address
        );
        assert!(ChannelAddress::from_channel_name("orders:admin:all").is_err());
    }

    #[test]
    fn parse_rejects_unknown_scope_and_bad_ids() {
        assert!(ChannelAddress::parse("team", "1").is_err());
        assert!(ChannelAddress::parse("specialist", "abc").is_err());
        assert!(ChannelAddress::parse("specialist", "").is_err());
        assert_eq!(ChannelAddress::parse("admin", "anything").unwrap(), ChannelAddress::Admin);
    }

    #[test]
    fn stream_path_matches_edge_route() {
        assert_eq!(
            ChannelAddress::Specialist(SpecialistId::new(3)).stream_path(),
            "/events/specialist/3"
        );
    }
}
