//! Multi-step operations. Each one commits or rolls back as a unit.

pub mod bookings;
pub mod orders;
pub mod storage;
