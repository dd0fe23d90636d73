pub mod catalog;
pub mod clients;
pub mod employees;
pub mod health;
pub mod orders;
pub mod payments;
pub mod reservations;
pub mod storage;
