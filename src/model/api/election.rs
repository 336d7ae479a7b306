use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{ElectionId, ElectionState, ElectionType, VotingWindow},
    db::election::{Candidate, Election, ElectionMetadata, Initiative, Position},
};

/// An election specification, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// What kind of election this is.
    pub election_type: ElectionType,
    /// General voting window start.
    pub start_time: DateTime<Utc>,
    /// General voting window end.
    pub end_time: DateTime<Utc>,
    /// Separate candidate-voting window, when wanted.
    #[serde(default)]
    pub candidate_window: Option<WindowSpec>,
    /// Separate initiative-voting window, when wanted.
    #[serde(default)]
    pub initiative_window: Option<WindowSpec>,
    /// Report the sole candidate of an unopposed position as elected.
    #[serde(default)]
    pub auto_elect_unopposed: bool,
    /// Position names in display order; empty to derive from candidates.
    #[serde(default)]
    pub positions: Vec<String>,
    /// Candidate specifications.
    #[serde(default)]
    pub candidates: Vec<CandidateSpec>,
    /// Initiative specifications, in ballot order.
    #[serde(default)]
    pub initiatives: Vec<InitiativeSpec>,
}

impl ElectionSpec {
    /// Check the structural invariants: every configured window must end
    /// after it starts, and explicitly configured positions must cover all
    /// candidates.
    pub fn validate(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("Election end time must be after its start time".to_string());
        }
        for (name, window) in [
            ("candidate", &self.candidate_window),
            ("initiative", &self.initiative_window),
        ] {
            if let Some(window) = window {
                if window.end_time <= window.start_time {
                    return Err(format!(
                        "The {} voting window must end after it starts",
                        name
                    ));
                }
            }
        }
        if !self.positions.is_empty() {
            if let Some(candidate) = self
                .candidates
                .iter()
                .find(|c| !self.positions.contains(&c.position))
            {
                return Err(format!(
                    "Candidate '{}' stands for unknown position '{}'",
                    candidate.full_name, candidate.position
                ));
            }
        }
        Ok(())
    }

    /// Convert this spec into a proper Election with unique IDs.
    pub fn into_election(self, election_id: ElectionId) -> Election {
        let positions = self
            .positions
            .into_iter()
            .enumerate()
            .map(|(i, name)| Position {
                name,
                display_order: i as u32,
            })
            .collect();
        let candidates = self
            .candidates
            .into_iter()
            .enumerate()
            .map(|(i, c)| Candidate {
                id: 1 + i as u32,
                full_name: c.full_name,
                position: c.position,
            })
            .collect();
        let initiatives = self
            .initiatives
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Initiative {
                id: 1 + i as u32,
                title: spec.title,
                description: spec.description,
                ballot_order: i as u32,
            })
            .collect();
        Election {
            id: election_id,
            metadata: ElectionMetadata {
                title: self.title,
                description: self.description,
                election_type: self.election_type,
                state: ElectionState::Draft,
                start_time: self.start_time,
                end_time: self.end_time,
                candidate_window: self.candidate_window.map(Into::into),
                initiative_window: self.initiative_window.map(Into::into),
                auto_elect_unopposed: self.auto_elect_unopposed,
            },
            positions,
            candidates,
            initiatives,
        }
    }
}

/// An API-friendly voting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<WindowSpec> for VotingWindow {
    fn from(spec: WindowSpec) -> Self {
        Self {
            start_time: spec.start_time,
            end_time: spec.end_time,
        }
    }
}

impl From<VotingWindow> for WindowSpec {
    fn from(window: VotingWindow) -> Self {
        Self {
            start_time: window.start_time,
            end_time: window.end_time,
        }
    }
}

/// A candidate specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    /// Display name.
    pub full_name: String,
    /// The position this candidate stands for.
    pub position: String,
}

/// An initiative specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeSpec {
    /// Initiative title.
    pub title: String,
    /// Full ballot text.
    pub description: String,
}

/// An API-friendly election description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    /// Election unique ID.
    pub id: ElectionId,
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// What kind of election this is.
    pub election_type: ElectionType,
    /// Election state.
    pub state: ElectionState,
    /// General voting window start.
    pub start_time: DateTime<Utc>,
    /// General voting window end.
    pub end_time: DateTime<Utc>,
    /// Separate candidate-voting window, when configured.
    pub candidate_window: Option<WindowSpec>,
    /// Separate initiative-voting window, when configured.
    pub initiative_window: Option<WindowSpec>,
    /// Whether unopposed candidates are reported as elected.
    pub auto_elect_unopposed: bool,
    /// Positions on the ballot, explicit or derived.
    pub positions: Vec<Position>,
    /// Candidates standing in this election.
    pub candidates: Vec<Candidate>,
    /// Ballot initiatives.
    pub initiatives: Vec<Initiative>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        let positions = election.ballot_positions();
        Self {
            id: election.id,
            title: election.metadata.title,
            description: election.metadata.description,
            election_type: election.metadata.election_type,
            state: election.metadata.state,
            start_time: election.metadata.start_time,
            end_time: election.metadata.end_time,
            candidate_window: election.metadata.candidate_window.map(Into::into),
            initiative_window: election.metadata.initiative_window.map(Into::into),
            auto_elect_unopposed: election.metadata.auto_elect_unopposed,
            positions,
            candidates: election.candidates,
            initiatives: election.initiatives,
        }
    }
}

/// A summary of an election, shorter than the full `ElectionDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    /// Election unique ID.
    pub id: ElectionId,
    /// Election title.
    pub title: String,
    /// What kind of election this is.
    pub election_type: ElectionType,
    /// Election state.
    pub state: ElectionState,
    /// General voting window start.
    pub start_time: DateTime<Utc>,
    /// General voting window end.
    pub end_time: DateTime<Utc>,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.metadata.title,
            election_type: election.metadata.election_type,
            state: election.metadata.state,
            start_time: election.metadata.start_time,
            end_time: election.metadata.end_time,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use chrono::{Duration, Timelike, Utc};

    macro_rules! midnight_today {
        () => {{
            Utc::now()
                .with_hour(0)
                .and_then(|t| t.with_minute(0))
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap()
        }};
    }

    impl ElectionSpec {
        /// An election whose general window is currently open.
        pub fn current_example() -> Self {
            let start_time = midnight_today!();
            let end_time = start_time + Duration::days(30);
            Self {
                title: "2026 Leadership Election".to_string(),
                description: "Annual leadership election and ballot initiatives.".to_string(),
                election_type: ElectionType::Leadership,
                start_time,
                end_time,
                candidate_window: None,
                initiative_window: None,
                auto_elect_unopposed: false,
                positions: vec!["President".to_string(), "Secretary".to_string()],
                candidates: vec![
                    CandidateSpec {
                        full_name: "Alice Johnson".to_string(),
                        position: "President".to_string(),
                    },
                    CandidateSpec {
                        full_name: "Bob Martinez".to_string(),
                        position: "President".to_string(),
                    },
                    CandidateSpec {
                        full_name: "Carol Nguyen".to_string(),
                        position: "Secretary".to_string(),
                    },
                ],
                initiatives: vec![
                    InitiativeSpec {
                        title: "Community Garden Fund".to_string(),
                        description: "Allocate $2,000 to the community garden.".to_string(),
                    },
                    InitiativeSpec {
                        title: "Monthly Newsletter".to_string(),
                        description: "Publish a monthly member newsletter.".to_string(),
                    },
                ],
            }
        }

        /// An election that has not started yet.
        pub fn future_example() -> Self {
            let start_time = midnight_today!() + Duration::days(30);
            let end_time = start_time + Duration::days(30);
            Self {
                title: "2027 Board Election".to_string(),
                election_type: ElectionType::Board,
                start_time,
                end_time,
                ..Self::current_example()
            }
        }

        /// An election that has already ended.
        pub fn past_example() -> Self {
            let start_time = midnight_today!() - Duration::days(30);
            let end_time = start_time + Duration::days(7);
            Self {
                title: "2025 Leadership Election".to_string(),
                start_time,
                end_time,
                ..Self::current_example()
            }
        }

        /// Separate periods: candidate voting open now, initiative voting
        /// not open for another week.
        pub fn split_windows_example() -> Self {
            let start_time = midnight_today!();
            let end_time = start_time + Duration::days(30);
            Self {
                title: "2026 Split-Period Election".to_string(),
                candidate_window: Some(WindowSpec {
                    start_time,
                    end_time: start_time + Duration::days(14),
                }),
                initiative_window: Some(WindowSpec {
                    start_time: start_time + Duration::days(7),
                    end_time,
                }),
                start_time,
                end_time,
                ..Self::current_example()
            }
        }
    }
}
