//! Domain layer containing the booking change vocabulary.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors, state machines)
//! - `booking` - Change kinds, envelopes, queue rows, channel addressing, version counters

pub mod booking;
pub mod foundation;
