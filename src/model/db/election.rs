use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{
    election::{CandidateId, ElectionId, ElectionState, ElectionType, InitiativeId, VotingWindow},
    vote::VoteType,
};

/// Core election data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: ElectionId,
    /// Top-level metadata.
    #[serde(flatten)]
    pub metadata: ElectionMetadata,
    /// Leadership/board positions on the ballot, in display order.
    /// May be empty, in which case positions are derived from the candidates.
    pub positions: Vec<Position>,
    /// Candidates standing in this election.
    pub candidates: Vec<Candidate>,
    /// Ballot initiatives, in ballot order.
    pub initiatives: Vec<Initiative>,
}

/// A view on just the election's top-level metadata.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionMetadata {
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// What kind of election this is.
    pub election_type: ElectionType,
    /// Election state.
    pub state: ElectionState,
    /// General voting window start.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// General voting window end.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Separate candidate-voting window, when configured.
    pub candidate_window: Option<VotingWindow>,
    /// Separate initiative-voting window, when configured.
    pub initiative_window: Option<VotingWindow>,
    /// Report the sole candidate of an unopposed position as elected,
    /// bypassing the vote count.
    pub auto_elect_unopposed: bool,
}

impl Election {
    /// Look up a candidate by ID.
    pub fn candidate(&self, candidate_id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }

    /// Look up an initiative by ID.
    pub fn initiative(&self, initiative_id: InitiativeId) -> Option<&Initiative> {
        self.initiatives.iter().find(|i| i.id == initiative_id)
    }

    /// The positions on the ballot: the explicitly configured ones, or,
    /// when none were configured, the distinct positions among the
    /// candidates in first-seen order.
    pub fn ballot_positions(&self) -> Vec<Position> {
        if !self.positions.is_empty() {
            let mut positions = self.positions.clone();
            positions.sort_by_key(|p| p.display_order);
            return positions;
        }
        let mut derived: Vec<Position> = Vec::new();
        for candidate in &self.candidates {
            if !derived.iter().any(|p| p.name == candidate.position) {
                derived.push(Position {
                    name: candidate.position.clone(),
                    display_order: derived.len() as u32,
                });
            }
        }
        derived
    }

    /// The names of positions with exactly one registered candidate.
    pub fn unopposed_positions(&self) -> Vec<String> {
        self.ballot_positions()
            .into_iter()
            .map(|p| p.name)
            .filter(|name| {
                self.candidates
                    .iter()
                    .filter(|c| &c.position == name)
                    .count()
                    == 1
            })
            .collect()
    }

    /// The window that applies to the given sub-ballot: the sub-type's own
    /// window when the election configures separate periods, otherwise the
    /// general window.
    pub fn applicable_window(&self, vote_type: VoteType) -> VotingWindow {
        let specific = match vote_type {
            VoteType::Candidates => self.metadata.candidate_window,
            VoteType::Initiatives => self.metadata.initiative_window,
        };
        specific.unwrap_or(VotingWindow {
            start_time: self.metadata.start_time,
            end_time: self.metadata.end_time,
        })
    }

    /// Is the given sub-ballot currently accepting votes?
    pub fn voting_open(&self, vote_type: VoteType, now: DateTime<Utc>) -> bool {
        self.metadata.state == ElectionState::Published
            && self.applicable_window(vote_type).contains(now)
    }
}

/// A named leadership or board role on the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Role name, e.g. "President".
    pub name: String,
    /// Where this role appears on the ballot.
    pub display_order: u32,
}

/// A candidate standing for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique ID within the election.
    pub id: CandidateId,
    /// Display name.
    pub full_name: String,
    /// The position this candidate stands for.
    pub position: String,
}

/// A ballot initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    /// Unique ID within the election.
    pub id: InitiativeId,
    /// Initiative title.
    pub title: String,
    /// Full ballot text.
    pub description: String,
    /// Where this initiative appears on the ballot.
    pub ballot_order: u32,
}
