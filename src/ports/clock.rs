//! Clock port - Source of wall-clock time, swappable in tests.

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
