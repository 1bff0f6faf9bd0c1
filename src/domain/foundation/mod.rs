//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the change-propagation pipeline.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{BookingId, ClientId, QueueEventId, SpecialistId, WorkLocationId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
