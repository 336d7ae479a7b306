//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as plain integers or hex strings.
//! - Datetimes are serialised as RFC 3339 timestamps.

pub mod admin;
pub mod auth;
pub mod election;
pub mod results;
pub mod vote;
