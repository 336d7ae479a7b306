//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod admin;
pub use admin::{ensure_admin_exists, Admin};

pub mod election;
pub use election::{Candidate, Election, ElectionMetadata, Initiative, Position};

pub mod vote;
pub use vote::{Vote, VoteSelection, VoteSession};

pub mod voter;
pub use voter::Voter;
