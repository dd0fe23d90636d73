//! Single-table access. Every function takes the caller's connection so it
//! can run inside a workflow transaction.

pub mod catalog;
pub mod clients;
pub mod employees;
pub mod media;
pub mod payments;
pub mod reservations;
