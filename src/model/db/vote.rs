use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        code::ConfirmationCode,
        election::{CandidateId, ElectionId, InitiativeId},
        vote::{BallotChoice, VoteType},
    },
    mongodb::Id,
};

/// Core vote data, as stored in the database: one row per selection.
///
/// Vote rows are written exactly once and never updated or deleted.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VoteCore {
    /// The voter who cast this vote.
    pub voter_id: Id,
    /// The election it was cast in.
    pub election_id: ElectionId,
    /// When it was cast.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
    /// What was selected.
    #[serde(flatten)]
    pub selection: VoteSelection,
}

impl VoteCore {
    pub fn new(voter_id: Id, election_id: ElectionId, selection: VoteSelection) -> Self {
        Self {
            voter_id,
            election_id,
            cast_at: Utc::now(),
            selection,
        }
    }
}

/// Either a candidate selection or an initiative stance.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(tag = "vote_type", rename_all = "lowercase")]
pub enum VoteSelection {
    Candidates {
        candidate_id: CandidateId,
        position: String,
    },
    Initiatives {
        initiative_id: InitiativeId,
        choice: BallotChoice,
    },
}

impl VoteSelection {
    /// Which sub-ballot this selection belongs to.
    pub fn vote_type(&self) -> VoteType {
        match self {
            Self::Candidates { .. } => VoteType::Candidates,
            Self::Initiatives { .. } => VoteType::Initiatives,
        }
    }
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

/// Core vote session data: one row per completed sub-ballot submission.
///
/// The session row, not the vote rows, is what makes a submission count as
/// "has voted"; a unique index over (voter, election, session type) backs
/// this up at the storage layer.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VoteSessionCore {
    /// The voter who submitted.
    pub voter_id: Id,
    /// The election submitted in.
    pub election_id: ElectionId,
    /// Which sub-ballot was submitted.
    pub session_type: VoteType,
    /// How many votes the submission contained.
    pub votes_cast: u32,
    /// The code shown to the voter as proof of completion.
    pub confirmation_code: ConfirmationCode,
    /// When the submission completed.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub completed_at: DateTime<Utc>,
}

impl VoteSessionCore {
    /// Create a completed session record with a fresh confirmation code.
    pub fn new(
        voter_id: Id,
        election_id: ElectionId,
        session_type: VoteType,
        votes_cast: u32,
    ) -> Self {
        Self {
            voter_id,
            election_id,
            session_type,
            votes_cast,
            confirmation_code: ConfirmationCode::random(),
            completed_at: Utc::now(),
        }
    }
}

/// A vote session without an ID.
pub type NewVoteSession = VoteSessionCore;

/// A vote session from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSession {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub session: VoteSessionCore,
}

impl Deref for VoteSession {
    type Target = VoteSessionCore;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}
