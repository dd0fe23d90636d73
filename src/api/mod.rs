//! Outbound calls to other services.

pub mod notifications;
