//! Core business logic for PingSpot.
//!
//! Services own the transaction boundaries: they load rows through the
//! repositories, run the domain rules from `pingspot_domain` and persist
//! the outcome.

pub mod services;
mod views;

pub use services::*;
