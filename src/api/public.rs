use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        election::{ElectionDescription, ElectionSummary},
        results::{CandidateResultSet, ElectionResults, InitiativeResultSet},
    },
    common::election::{ElectionId, ElectionState},
    db::{admin::Admin, election::Election, vote::Vote},
    mongodb::{u32_id_filter, Coll},
};
use crate::tally;

use super::common::{election_votes, visible_election_by_id};

pub fn routes() -> Vec<Route> {
    routes![
        elections_admin,
        elections_non_admin,
        election_admin,
        election_non_admin,
        candidate_results,
        initiative_results,
        election_results,
    ]
}

#[get("/elections?<archived>", rank = 1)]
async fn elections_admin(
    _token: AuthToken<Admin>,
    archived: Option<bool>,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionSummary>>> {
    let archived = archived.unwrap_or(false);
    metadata_for_elections(elections, true, archived).await
}

#[get("/elections?<archived>", rank = 2)]
async fn elections_non_admin(
    archived: Option<bool>,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionSummary>>> {
    let archived = archived.unwrap_or(false);
    metadata_for_elections(elections, false, archived).await
}

#[get("/elections/<election_id>", rank = 1)]
async fn election_admin(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{}'", election_id)))?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>", rank = 2)]
async fn election_non_admin(
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = visible_election_by_id(election_id, &elections).await?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>/candidate-results")]
async fn candidate_results(
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
) -> Result<Json<CandidateResultSet>> {
    let election = visible_election_by_id(election_id, &elections).await?;
    let votes = election_votes(election_id, &votes).await?;
    Ok(Json(CandidateResultSet {
        results: tally::candidate_results(&election, &votes),
    }))
}

#[get("/elections/<election_id>/initiative-results")]
async fn initiative_results(
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
) -> Result<Json<InitiativeResultSet>> {
    let election = visible_election_by_id(election_id, &elections).await?;
    let votes = election_votes(election_id, &votes).await?;
    Ok(Json(InitiativeResultSet {
        results: tally::initiative_results(&election, &votes),
    }))
}

#[get("/elections/<election_id>/results?<eligible_voters>")]
async fn election_results(
    election_id: ElectionId,
    eligible_voters: Option<u64>,
    elections: Coll<Election>,
    votes: Coll<Vote>,
) -> Result<Json<ElectionResults>> {
    let election = visible_election_by_id(election_id, &elections).await?;
    let votes = election_votes(election_id, &votes).await?;
    Ok(Json(ElectionResults {
        election_id,
        candidates: tally::candidate_results(&election, &votes),
        initiatives: tally::initiative_results(&election, &votes),
        stats: tally::election_stats(&votes, eligible_voters),
    }))
}

/// Retrieve the metadata for elections.
/// If `admin` is false, draft elections will be hidden.
/// If `archived` is true, archived elections will be returned instead of non-archived ones.
async fn metadata_for_elections(
    elections: Coll<Election>,
    admin: bool,
    archived: bool,
) -> Result<Json<Vec<ElectionSummary>>> {
    let filter = if archived {
        doc! {
            "state": ElectionState::Archived,
        }
    } else if admin {
        doc! {
            "$or": [{"state": ElectionState::Draft}, {"state": ElectionState::Published}],
        }
    } else {
        doc! {
            "state": ElectionState::Published,
        }
    };

    let elections = elections
        .find(filter, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let metadata = elections.into_iter().map(Into::into).collect();

    Ok(Json(metadata))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::{
        common::vote::BallotChoice,
        db::vote::{NewVote, VoteSelection},
        mongodb::Id,
    };

    use super::*;

    #[backend_test(admin)]
    async fn admins_see_drafts_in_listings(client: Client, db: Database) {
        insert_elections(&db).await;

        let response = client
            .get(uri!(elections_admin(Some(false))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let listed: Vec<ElectionSummary> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let mut states: Vec<_> = listed.iter().map(|e| e.state).collect();
        states.sort_by_key(|s| format!("{s:?}"));
        assert_eq!(states, vec![ElectionState::Draft, ElectionState::Published]);
    }

    #[backend_test]
    async fn non_admins_only_see_published(client: Client, db: Database) {
        insert_elections(&db).await;

        let response = client
            .get(uri!(elections_non_admin(Some(false))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<ElectionSummary> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].state, ElectionState::Published);

        // Archived elections are retrievable on request.
        let response = client
            .get(uri!(elections_non_admin(Some(true))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<ElectionSummary> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].state, ElectionState::Archived);

        // Drafts do not resolve for non-admins.
        let draft_id = Coll::<Election>::from_db(&db)
            .find_one(doc! { "state": ElectionState::Draft }, None)
            .await
            .unwrap()
            .unwrap()
            .id;
        let response = client
            .get(uri!(election_non_admin(draft_id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn candidate_results_with_a_tie(client: Client, db: Database) {
        let election = Election::published_example();
        Coll::<Election>::from_db(&db)
            .insert_one(&election, None)
            .await
            .unwrap();
        // President: Alice 3, Bob 3. Secretary: Carol 0.
        insert_candidate_votes(&db, &election, &[(1, 3), (2, 3)]).await;

        let response = client
            .get(uri!(candidate_results(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body: CandidateResultSet =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        let alice = &body.results[0];
        let bob = &body.results[1];
        let carol = &body.results[2];
        assert_eq!((alice.full_name.as_str(), alice.vote_count), ("Alice Johnson", 3));
        assert_eq!((bob.full_name.as_str(), bob.vote_count), ("Bob Martinez", 3));
        assert!(alice.is_winner && bob.is_winner);
        assert_eq!((alice.percentage, bob.percentage), (50, 50));

        assert_eq!(carol.vote_count, 0);
        assert!(!carol.is_winner);

        let total: u64 = body.results.iter().map(|r| r.vote_count).sum();
        assert_eq!(total, 6);
    }

    #[backend_test]
    async fn initiative_results_with_percentages(client: Client, db: Database) {
        let election = Election::published_example();
        Coll::<Election>::from_db(&db)
            .insert_one(&election, None)
            .await
            .unwrap();
        insert_initiative_votes(
            &db,
            &election,
            &[
                (1, BallotChoice::Yes),
                (1, BallotChoice::Yes),
                (1, BallotChoice::No),
                (1, BallotChoice::Abstain),
            ],
        )
        .await;

        let response = client
            .get(uri!(initiative_results(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body: InitiativeResultSet =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        let garden = &body.results[0];
        assert_eq!(garden.total_votes, 4);
        assert_eq!(
            (garden.yes_percentage, garden.no_percentage, garden.abstain_percentage),
            (50, 25, 25)
        );
    }

    #[backend_test]
    async fn full_results_include_turnout(client: Client, db: Database) {
        let election = Election::published_example();
        Coll::<Election>::from_db(&db)
            .insert_one(&election, None)
            .await
            .unwrap();
        insert_candidate_votes(&db, &election, &[(1, 2), (2, 1)]).await;
        insert_initiative_votes(&db, &election, &[(2, BallotChoice::Yes)]).await;

        let response = client
            .get(uri!(election_results(election.id, Some(10u64))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body: ElectionResults =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        assert_eq!(body.stats.total_candidate_votes, 3);
        assert_eq!(body.stats.total_initiative_votes, 1);
        // Each inserted vote row used a distinct synthetic voter.
        assert_eq!(body.stats.total_voters, 4);
        assert_eq!(body.stats.turnout_percentage, Some(40));

        // Without the injected eligible count there is no turnout figure.
        let response = client
            .get(uri!(election_results(election.id, Option::<u64>::None)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body: ElectionResults =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body.stats.turnout_percentage, None);
    }

    #[backend_test]
    async fn results_for_draft_elections_are_hidden(client: Client, db: Database) {
        let election = Election::draft_example();
        Coll::<Election>::from_db(&db)
            .insert_one(&election, None)
            .await
            .unwrap();

        let response = client
            .get(uri!(candidate_results(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    async fn insert_elections(db: &Database) {
        Coll::<Election>::from_db(db)
            .insert_many(
                [
                    Election::published_example(),
                    Election::draft_example(),
                    Election::archived_example(),
                ],
                None,
            )
            .await
            .unwrap();
    }

    /// Insert `count` candidate votes per (candidate, count) pair, each from
    /// a distinct synthetic voter.
    async fn insert_candidate_votes(db: &Database, election: &Election, counts: &[(u32, u64)]) {
        let mut rows = Vec::new();
        for (candidate_id, count) in counts {
            let position = election.candidate(*candidate_id).unwrap().position.clone();
            for _ in 0..*count {
                rows.push(NewVote::new(
                    Id::new(),
                    election.id,
                    VoteSelection::Candidates {
                        candidate_id: *candidate_id,
                        position: position.clone(),
                    },
                ));
            }
        }
        Coll::<NewVote>::from_db(db)
            .insert_many(rows, None)
            .await
            .unwrap();
    }

    async fn insert_initiative_votes(
        db: &Database,
        election: &Election,
        stances: &[(u32, BallotChoice)],
    ) {
        let rows: Vec<NewVote> = stances
            .iter()
            .map(|(initiative_id, choice)| {
                NewVote::new(
                    Id::new(),
                    election.id,
                    VoteSelection::Initiatives {
                        initiative_id: *initiative_id,
                        choice: *choice,
                    },
                )
            })
            .collect();
        Coll::<NewVote>::from_db(db)
            .insert_many(rows, None)
            .await
            .unwrap();
    }
}
