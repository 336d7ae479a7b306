use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Our election IDs are integers.
pub type ElectionId = u32;
/// Our candidate IDs are integers, unique within an election.
pub type CandidateId = u32;
/// Our initiative IDs are integers, unique within an election.
pub type InitiativeId = u32;

/// States in the Election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionState {
    /// Under construction, only visible to admins.
    Draft,
    /// Ready, in progress, or completed. Visible to all.
    Published,
    /// Completed, hidden by default, but retrievable by all.
    Archived,
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

/// What kind of election this is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionType {
    /// Leadership roles, e.g. President.
    Leadership,
    /// Board seats.
    Board,
    /// Ballot initiatives only.
    Initiative,
}

/// A start/end pair bounding when votes are accepted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    /// Window start.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Window end.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
}

impl VotingWindow {
    /// Is the given instant inside this window?
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// A window is well-formed iff it ends after it starts.
    pub fn is_well_formed(&self) -> bool {
        self.end_time > self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn window_containment() {
        let now = Utc::now();
        let window = VotingWindow {
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
        };
        assert!(window.is_well_formed());
        assert!(window.contains(now));
        assert!(!window.contains(now - Duration::hours(2)));
        assert!(!window.contains(now + Duration::hours(2)));
    }

    #[test]
    fn backwards_window_is_malformed() {
        let now = Utc::now();
        let window = VotingWindow {
            start_time: now,
            end_time: now - Duration::seconds(1),
        };
        assert!(!window.is_well_formed());
    }
}
