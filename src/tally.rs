//! Election results aggregation.
//!
//! Every function here is a full recompute over plain in-memory vote slices;
//! there is no incremental state. Elections are low-traffic and small
//! (tens to low thousands of votes), so the HTTP layer simply refetches the
//! rows and calls back in here on every request.

use std::collections::{HashMap, HashSet};

use crate::model::{
    api::results::{CandidateResult, ElectionStats, InitiativeResult},
    common::vote::{BallotChoice, VoteType},
    db::{
        election::Election,
        vote::{Vote, VoteSelection},
    },
};

/// Integer percentage of `part` in `total`, rounded to nearest; 0 when
/// `total` is 0.
fn percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        (part as f64 * 100.0 / total as f64).round() as u32
    }
}

/// Compute per-candidate results, grouped by position in ballot order.
///
/// A candidate wins iff their count is non-zero and equals the maximum for
/// their position, so ties produce multiple winners and an unopposed
/// candidate with zero votes does not win by counting alone. When the
/// election enables `auto_elect_unopposed`, the sole candidate of a
/// one-candidate position is reported as a winner regardless of count.
///
/// Ranking is 1-based by descending count within the position; tied
/// candidates keep their registration order.
pub fn candidate_results(election: &Election, votes: &[Vote]) -> Vec<CandidateResult> {
    let mut counts: HashMap<u32, u64> = HashMap::new();
    for vote in votes {
        if let VoteSelection::Candidates { candidate_id, .. } = &vote.selection {
            // Only count selections that resolve to a registered candidate.
            if election.candidate(*candidate_id).is_some() {
                *counts.entry(*candidate_id).or_insert(0) += 1;
            }
        }
    }

    let mut results = Vec::with_capacity(election.candidates.len());
    for position in election.ballot_positions() {
        let mut standing: Vec<_> = election
            .candidates
            .iter()
            .filter(|c| c.position == position.name)
            .map(|c| (c, counts.get(&c.id).copied().unwrap_or(0)))
            .collect();
        if standing.is_empty() {
            continue;
        }

        let position_total: u64 = standing.iter().map(|(_, count)| count).sum();
        let max_count = standing
            .iter()
            .map(|(_, count)| *count)
            .max()
            .unwrap_or(0);
        let unopposed_auto_elect =
            election.metadata.auto_elect_unopposed && standing.len() == 1;

        // Stable sort keeps registration order among equal counts.
        standing.sort_by(|a, b| b.1.cmp(&a.1));

        for (rank, (candidate, count)) in standing.into_iter().enumerate() {
            let won_by_count = count > 0 && count == max_count;
            results.push(CandidateResult {
                id: candidate.id,
                full_name: candidate.full_name.clone(),
                position: position.name.clone(),
                vote_count: count,
                percentage: percentage(count, position_total),
                is_winner: won_by_count || unopposed_auto_elect,
                ranking: rank as u32 + 1,
            });
        }
    }
    results
}

/// Compute per-initiative tallies in ballot order.
pub fn initiative_results(election: &Election, votes: &[Vote]) -> Vec<InitiativeResult> {
    let mut counts: HashMap<u32, (u64, u64, u64)> = HashMap::new();
    for vote in votes {
        if let VoteSelection::Initiatives {
            initiative_id,
            choice,
        } = &vote.selection
        {
            if election.initiative(*initiative_id).is_some() {
                let tallies = counts.entry(*initiative_id).or_insert((0, 0, 0));
                match choice {
                    BallotChoice::Yes => tallies.0 += 1,
                    BallotChoice::No => tallies.1 += 1,
                    BallotChoice::Abstain => tallies.2 += 1,
                }
            }
        }
    }

    let mut initiatives = election.initiatives.clone();
    initiatives.sort_by_key(|i| i.ballot_order);
    initiatives
        .into_iter()
        .map(|initiative| {
            let (yes, no, abstain) = counts.get(&initiative.id).copied().unwrap_or((0, 0, 0));
            let total = yes + no + abstain;
            InitiativeResult {
                id: initiative.id,
                title: initiative.title,
                ballot_order: initiative.ballot_order,
                yes_votes: yes,
                no_votes: no,
                abstain_votes: abstain,
                total_votes: total,
                yes_percentage: percentage(yes, total),
                no_percentage: percentage(no, total),
                abstain_percentage: percentage(abstain, total),
            }
        })
        .collect()
}

/// Compute aggregate participation statistics.
///
/// The eligible-voter count belongs to the membership system and is passed
/// in by the caller; without it there is no turnout figure.
pub fn election_stats(votes: &[Vote], eligible_voters: Option<u64>) -> ElectionStats {
    let total_voters = votes
        .iter()
        .map(|vote| vote.voter_id)
        .collect::<HashSet<_>>()
        .len() as u64;
    let total_candidate_votes = votes
        .iter()
        .filter(|vote| vote.selection.vote_type() == VoteType::Candidates)
        .count() as u64;
    let total_initiative_votes = votes.len() as u64 - total_candidate_votes;
    ElectionStats {
        total_voters,
        total_candidate_votes,
        total_initiative_votes,
        turnout_percentage: eligible_voters
            .map(|eligible| percentage(total_voters, eligible)),
    }
}
