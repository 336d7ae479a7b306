use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionId, InitiativeId};

/// One candidate's standing in the results.
///
/// Field names are deliberately snake_case on the wire; the results contract
/// predates the camelCase submission contract and clients depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: CandidateId,
    pub full_name: String,
    pub position: String,
    pub vote_count: u64,
    /// Percentage of the votes cast for this candidate's position,
    /// rounded to the nearest integer; 0 when the position has no votes.
    pub percentage: u32,
    pub is_winner: bool,
    /// 1-based rank by descending vote count. Ties keep their candidate
    /// registration order and occupy consecutive ranks.
    pub ranking: u32,
}

/// The candidate results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResultSet {
    pub results: Vec<CandidateResult>,
}

/// One initiative's tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeResult {
    pub id: InitiativeId,
    pub title: String,
    pub ballot_order: u32,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub total_votes: u64,
    /// Integer-rounded percentages of the total; all 0 when no votes.
    pub yes_percentage: u32,
    pub no_percentage: u32,
    pub abstain_percentage: u32,
}

/// The initiative results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeResultSet {
    pub results: Vec<InitiativeResult>,
}

/// Aggregate participation statistics for an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionStats {
    /// Distinct voters who cast any vote.
    pub total_voters: u64,
    pub total_candidate_votes: u64,
    pub total_initiative_votes: u64,
    /// Turnout against the externally supplied eligible-voter count;
    /// absent when no count was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnout_percentage: Option<u32>,
}

/// The full results document for an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_id: ElectionId,
    pub candidates: Vec<CandidateResult>,
    pub initiatives: Vec<InitiativeResult>,
    pub stats: ElectionStats,
}

/// The partial-write observability signal: votes whose submission never
/// completed a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub election_id: ElectionId,
    pub orphaned_votes: u64,
}
