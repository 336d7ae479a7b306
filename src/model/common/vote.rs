use std::fmt::Display;

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// The two sub-ballots a voter may submit, each at most once per election.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Candidates,
    Initiatives,
}

impl Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Candidates => "candidates",
                Self::Initiatives => "initiatives",
            }
        )
    }
}

impl From<VoteType> for Bson {
    fn from(vote_type: VoteType) -> Self {
        to_bson(&vote_type).expect("Serialisation is infallible")
    }
}

/// A voter's stance on an initiative.
///
/// Only these three values exist on the wire; the legacy boolean form is a
/// deserialisation error, not a coercion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotChoice {
    Yes,
    No,
    Abstain,
}

impl Display for BallotChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Yes => "yes",
                Self::No => "no",
                Self::Abstain => "abstain",
            }
        )
    }
}

impl From<BallotChoice> for Bson {
    fn from(choice: BallotChoice) -> Self {
        to_bson(&choice).expect("Serialisation is infallible")
    }
}
