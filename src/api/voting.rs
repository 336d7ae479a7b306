use std::collections::HashSet;

use chrono::Utc;
use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        vote::{
            BallotSubmission, CandidateBallot, CandidateVoteSpec, CombinedReceipt,
            CombinedVotingStatus, InitiativeBallot, InitiativeVoteSpec, VoteReceipt, VotingStatus,
        },
    },
    common::{election::ElectionId, vote::VoteType},
    db::{
        election::Election,
        vote::{NewVote, NewVoteSession, Vote, VoteSelection, VoteSession},
        voter::Voter,
    },
    mongodb::{Coll, Id},
};

use super::common::visible_election_by_id;

pub fn routes() -> Vec<Route> {
    routes![
        submit_candidate_votes,
        submit_initiative_votes,
        submit_combined,
        candidate_voting_status,
        initiative_voting_status,
        combined_voting_status,
    ]
}

#[post(
    "/elections/<election_id>/vote/candidates",
    data = "<ballot>",
    format = "json"
)]
async fn submit_candidate_votes(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    ballot: Json<CandidateBallot>,
    elections: Coll<Election>,
    votes: Coll<NewVote>,
    sessions: Coll<VoteSession>,
    new_sessions: Coll<NewVoteSession>,
) -> Result<Json<VoteReceipt>> {
    let token = require_voter(token)?;
    let election = visible_election_by_id(election_id, &elections).await?;
    check_voting_open(&election, VoteType::Candidates)?;
    check_no_completed_session(&sessions, token.id, election_id, VoteType::Candidates).await?;

    let selections = validate_candidate_selections(&election, &ballot.candidate_votes)?;
    let receipt = persist_submission(
        token.id,
        election_id,
        VoteType::Candidates,
        selections,
        &votes,
        &new_sessions,
    )
    .await?;
    Ok(Json(receipt))
}

#[post(
    "/elections/<election_id>/vote/initiatives",
    data = "<ballot>",
    format = "json"
)]
async fn submit_initiative_votes(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    ballot: Json<InitiativeBallot>,
    elections: Coll<Election>,
    votes: Coll<NewVote>,
    sessions: Coll<VoteSession>,
    new_sessions: Coll<NewVoteSession>,
) -> Result<Json<VoteReceipt>> {
    let token = require_voter(token)?;
    let election = visible_election_by_id(election_id, &elections).await?;
    check_voting_open(&election, VoteType::Initiatives)?;
    check_no_completed_session(&sessions, token.id, election_id, VoteType::Initiatives).await?;

    let selections = validate_initiative_selections(&election, &ballot.initiative_votes)?;
    let receipt = persist_submission(
        token.id,
        election_id,
        VoteType::Initiatives,
        selections,
        &votes,
        &new_sessions,
    )
    .await?;
    Ok(Json(receipt))
}

#[post("/elections/<election_id>/vote", data = "<ballot>", format = "json")]
async fn submit_combined(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    ballot: Json<BallotSubmission>,
    elections: Coll<Election>,
    votes: Coll<NewVote>,
    sessions: Coll<VoteSession>,
    new_sessions: Coll<NewVoteSession>,
) -> Result<Json<CombinedReceipt>> {
    let token = require_voter(token)?;
    let ballot = ballot.0;
    if ballot.candidate_votes.is_empty() && ballot.initiative_votes.is_empty() {
        return Err(Error::bad_request("Submission contains no votes"));
    }
    let election = visible_election_by_id(election_id, &elections).await?;

    // Validate both sub-ballots in full before persisting either, so a
    // failure in one cannot leave the other half-written.
    let candidate_selections = if ballot.candidate_votes.is_empty() {
        None
    } else {
        check_voting_open(&election, VoteType::Candidates)?;
        check_no_completed_session(&sessions, token.id, election_id, VoteType::Candidates).await?;
        Some(validate_candidate_selections(
            &election,
            &ballot.candidate_votes,
        )?)
    };
    let initiative_selections = if ballot.initiative_votes.is_empty() {
        None
    } else {
        check_voting_open(&election, VoteType::Initiatives)?;
        check_no_completed_session(&sessions, token.id, election_id, VoteType::Initiatives)
            .await?;
        Some(validate_initiative_selections(
            &election,
            &ballot.initiative_votes,
        )?)
    };

    let mut receipt = CombinedReceipt {
        success: true,
        candidates: None,
        initiatives: None,
    };
    if let Some(selections) = candidate_selections {
        receipt.candidates = Some(
            persist_submission(
                token.id,
                election_id,
                VoteType::Candidates,
                selections,
                &votes,
                &new_sessions,
            )
            .await?,
        );
    }
    if let Some(selections) = initiative_selections {
        receipt.initiatives = Some(
            persist_submission(
                token.id,
                election_id,
                VoteType::Initiatives,
                selections,
                &votes,
                &new_sessions,
            )
            .await?,
        );
    }
    Ok(Json(receipt))
}

#[get("/elections/<election_id>/vote/candidates")]
async fn candidate_voting_status(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    sessions: Coll<VoteSession>,
) -> Result<Json<VotingStatus>> {
    let token = require_voter(token)?;
    let election = visible_election_by_id(election_id, &elections).await?;
    let status = sub_status(&election, token.id, VoteType::Candidates, &votes, &sessions).await?;
    Ok(Json(status))
}

#[get("/elections/<election_id>/vote/initiatives")]
async fn initiative_voting_status(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    sessions: Coll<VoteSession>,
) -> Result<Json<VotingStatus>> {
    let token = require_voter(token)?;
    let election = visible_election_by_id(election_id, &elections).await?;
    let status = sub_status(&election, token.id, VoteType::Initiatives, &votes, &sessions).await?;
    Ok(Json(status))
}

#[get("/elections/<election_id>/vote")]
async fn combined_voting_status(
    token: Option<AuthToken<Voter>>,
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    sessions: Coll<VoteSession>,
) -> Result<Json<CombinedVotingStatus>> {
    let token = require_voter(token)?;
    let election = visible_election_by_id(election_id, &elections).await?;
    let candidates =
        sub_status(&election, token.id, VoteType::Candidates, &votes, &sessions).await?;
    let initiatives =
        sub_status(&election, token.id, VoteType::Initiatives, &votes, &sessions).await?;
    Ok(Json(CombinedVotingStatus {
        voting_open: candidates.voting_open || initiatives.voting_open,
        has_voted: candidates.has_voted || initiatives.has_voted,
        candidates,
        initiatives,
    }))
}

/// Voting requires an authenticated voter; unlike the ranked admin routes,
/// the caller gets a proper 401 rather than a fall-through 404.
fn require_voter(token: Option<AuthToken<Voter>>) -> Result<AuthToken<Voter>> {
    token.ok_or_else(|| Error::unauthorized("You must be signed in as a member to vote."))
}

/// Check the applicable window for the sub-ballot is currently open.
fn check_voting_open(election: &Election, vote_type: VoteType) -> Result<()> {
    if !election.voting_open(vote_type, Utc::now()) {
        return Err(Error::bad_request(format!(
            "Voting on {} is not currently open for this election.",
            vote_type
        )));
    }
    Ok(())
}

/// Reject resubmission of an already-completed sub-ballot.
///
/// This check is a friendly fast path; two near-simultaneous submissions can
/// both pass it, and then the unique session index decides the race.
async fn check_no_completed_session(
    sessions: &Coll<VoteSession>,
    voter_id: Id,
    election_id: ElectionId,
    session_type: VoteType,
) -> Result<()> {
    let filter = doc! {
        "voter_id": voter_id,
        "election_id": election_id,
        "session_type": session_type,
    };
    if sessions.find_one(filter, None).await?.is_some() {
        return Err(Error::bad_request(format!(
            "You have already voted on {} in this election.",
            session_type
        )));
    }
    Ok(())
}

/// Check every candidate selection against the election's registered
/// candidates, with at most one selection per position.
fn validate_candidate_selections(
    election: &Election,
    selections: &[CandidateVoteSpec],
) -> Result<Vec<VoteSelection>> {
    if selections.is_empty() {
        return Err(Error::bad_request("Submission contains no votes"));
    }
    let mut seen_positions = HashSet::new();
    let mut validated = Vec::with_capacity(selections.len());
    for selection in selections {
        let candidate = election.candidate(selection.candidate_id).ok_or_else(|| {
            Error::not_found(format!(
                "Candidate with ID '{}' in election '{}'",
                selection.candidate_id, election.id
            ))
        })?;
        if candidate.position != selection.position {
            return Err(Error::bad_request(format!(
                "Candidate '{}' does not stand for position '{}'",
                candidate.full_name, selection.position
            )));
        }
        if !seen_positions.insert(candidate.position.clone()) {
            return Err(Error::bad_request(format!(
                "More than one selection for position '{}'",
                candidate.position
            )));
        }
        validated.push(VoteSelection::Candidates {
            candidate_id: candidate.id,
            position: candidate.position.clone(),
        });
    }
    Ok(validated)
}

/// Check every initiative selection against the election's registered
/// initiatives, with at most one stance per initiative.
fn validate_initiative_selections(
    election: &Election,
    selections: &[InitiativeVoteSpec],
) -> Result<Vec<VoteSelection>> {
    if selections.is_empty() {
        return Err(Error::bad_request("Submission contains no votes"));
    }
    let mut seen_initiatives = HashSet::new();
    let mut validated = Vec::with_capacity(selections.len());
    for selection in selections {
        let initiative = election.initiative(selection.initiative_id).ok_or_else(|| {
            Error::not_found(format!(
                "Initiative with ID '{}' in election '{}'",
                selection.initiative_id, election.id
            ))
        })?;
        if !seen_initiatives.insert(initiative.id) {
            return Err(Error::bad_request(format!(
                "More than one stance on initiative '{}'",
                initiative.title
            )));
        }
        validated.push(VoteSelection::Initiatives {
            initiative_id: initiative.id,
            choice: selection.vote,
        });
    }
    Ok(validated)
}

/// Write the vote rows, then the completing session row.
///
/// There is no cross-collection transaction here. If the session write
/// fails after the vote rows landed, the voter has not "voted" (the session
/// is authoritative) and may safely retry; the orphaned rows show up in the
/// reconciliation report.
async fn persist_submission(
    voter_id: Id,
    election_id: ElectionId,
    session_type: VoteType,
    selections: Vec<VoteSelection>,
    votes: &Coll<NewVote>,
    sessions: &Coll<NewVoteSession>,
) -> Result<VoteReceipt> {
    let vote_rows: Vec<NewVote> = selections
        .into_iter()
        .map(|selection| NewVote::new(voter_id, election_id, selection))
        .collect();
    let votes_cast = vote_rows.len() as u32;
    votes.insert_many(vote_rows, None).await?;

    let session = NewVoteSession::new(voter_id, election_id, session_type, votes_cast);
    let confirmation_code = session.confirmation_code.clone();
    let session_id: Id = sessions
        .insert_one(&session, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    info!(
        "Voter {} completed {} voting in election {} ({} votes, code {})",
        voter_id, session_type, election_id, votes_cast, confirmation_code
    );
    Ok(VoteReceipt {
        success: true,
        confirmation_code,
        votes_cast,
        session_id: session_id.to_string(),
    })
}

/// Resolve one sub-ballot's status for the given voter.
async fn sub_status(
    election: &Election,
    voter_id: Id,
    vote_type: VoteType,
    votes: &Coll<Vote>,
    sessions: &Coll<VoteSession>,
) -> Result<VotingStatus> {
    let vote_filter = doc! {
        "election_id": election.id,
        "voter_id": voter_id,
        "vote_type": vote_type,
    };
    let own_votes: Vec<Vote> = votes.find(vote_filter, None).await?.try_collect().await?;

    let session_filter = doc! {
        "voter_id": voter_id,
        "election_id": election.id,
        "session_type": vote_type,
    };
    let session = sessions.find_one(session_filter, None).await?;

    let unopposed_positions = match vote_type {
        VoteType::Candidates => election.unopposed_positions(),
        VoteType::Initiatives => Vec::new(),
    };

    Ok(VotingStatus {
        voting_open: election.voting_open(vote_type, Utc::now()),
        has_voted: session.is_some(),
        votes: own_votes.into_iter().map(Into::into).collect(),
        session: session.map(Into::into),
        unopposed_positions,
    })
}
