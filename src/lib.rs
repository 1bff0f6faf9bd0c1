//! Booking Realtime - Change propagation for booking calendars
//!
//! This crate moves booking mutations from the database to every open
//! calendar view: a relay drains the change queue (or diffs snapshots) and
//! publishes on Redis channels, an edge service fans those out as
//! server-sent events, and a client library keeps a view fresh with
//! reconnects, polling fallback and throttled refreshes.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
