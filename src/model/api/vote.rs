use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        code::ConfirmationCode,
        election::{CandidateId, InitiativeId},
        vote::{BallotChoice, VoteType},
    },
    db::vote::{Vote, VoteSelection, VoteSession},
};

/// One candidate selection in a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateVoteSpec {
    pub candidate_id: CandidateId,
    pub position: String,
}

/// One initiative stance in a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeVoteSpec {
    pub initiative_id: InitiativeId,
    pub vote: BallotChoice,
}

/// The body of a candidate-only submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBallot {
    pub candidate_votes: Vec<CandidateVoteSpec>,
}

/// The body of an initiative-only submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeBallot {
    pub initiative_votes: Vec<InitiativeVoteSpec>,
}

/// The body of a combined submission; at least one list must be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotSubmission {
    #[serde(default)]
    pub candidate_votes: Vec<CandidateVoteSpec>,
    #[serde(default)]
    pub initiative_votes: Vec<InitiativeVoteSpec>,
}

/// Proof of a completed sub-ballot submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub success: bool,
    pub confirmation_code: ConfirmationCode,
    pub votes_cast: u32,
    pub session_id: String,
}

/// Receipts for a combined submission, one per non-empty sub-ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReceipt {
    pub success: bool,
    pub candidates: Option<VoteReceipt>,
    pub initiatives: Option<VoteReceipt>,
}

/// An API-friendly view of a cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDescription {
    pub vote_type: VoteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<InitiativeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote: Option<BallotChoice>,
    pub cast_at: DateTime<Utc>,
}

impl From<Vote> for VoteDescription {
    fn from(vote: Vote) -> Self {
        match vote.vote.selection {
            VoteSelection::Candidates {
                candidate_id,
                position,
            } => Self {
                vote_type: VoteType::Candidates,
                candidate_id: Some(candidate_id),
                position: Some(position),
                initiative_id: None,
                vote: None,
                cast_at: vote.vote.cast_at,
            },
            VoteSelection::Initiatives {
                initiative_id,
                choice,
            } => Self {
                vote_type: VoteType::Initiatives,
                candidate_id: None,
                position: None,
                initiative_id: Some(initiative_id),
                vote: Some(choice),
                cast_at: vote.vote.cast_at,
            },
        }
    }
}

/// An API-friendly view of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub session_type: VoteType,
    pub votes_cast: u32,
    pub confirmation_code: ConfirmationCode,
    pub completed_at: DateTime<Utc>,
}

impl From<VoteSession> for SessionDescription {
    fn from(session: VoteSession) -> Self {
        Self {
            session_type: session.session.session_type,
            votes_cast: session.session.votes_cast,
            confirmation_code: session.session.confirmation_code,
            completed_at: session.session.completed_at,
        }
    }
}

/// Voting status for one sub-ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatus {
    /// Is this sub-ballot currently accepting votes?
    pub voting_open: bool,
    /// Has the current voter completed this sub-ballot?
    pub has_voted: bool,
    /// The voter's own votes of this type.
    pub votes: Vec<VoteDescription>,
    /// The voter's completed session, if any.
    pub session: Option<SessionDescription>,
    /// Positions with exactly one registered candidate.
    pub unopposed_positions: Vec<String>,
}

/// Voting status across both sub-ballots; the top-level flags are the union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedVotingStatus {
    /// Is either sub-ballot currently accepting votes?
    pub voting_open: bool,
    /// Has the current voter completed either sub-ballot?
    pub has_voted: bool,
    pub candidates: VotingStatus,
    pub initiatives: VotingStatus,
}
