use std::collections::HashSet;

use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{auth::AuthToken, election::{ElectionDescription, ElectionSpec}, results::ReconciliationReport},
    common::{election::{ElectionId, ElectionState}, vote::VoteType},
    db::{admin::Admin, election::Election, vote::{Vote, VoteSession}},
    mongodb::{u32_id_filter, Coll, Counter, Id, ELECTION_ID_COUNTER_ID},
};

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        publish_election,
        archive_election,
        election_reconciliation,
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    _token: AuthToken<Admin>,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    counters: Coll<Counter>,
) -> Result<Json<ElectionDescription>> {
    let spec = spec.0;
    spec.validate().map_err(Error::bad_request)?;

    // Allocate an ID and insert the election as a draft.
    let election_id = Counter::next(&counters, ELECTION_ID_COUNTER_ID).await?;
    let election = spec.into_election(election_id);
    elections.insert_one(&election, None).await?;
    info!("Created election {} '{}'", election_id, election.metadata.title);

    Ok(Json(election.into()))
}

#[post("/elections/<election_id>/publish")]
async fn publish_election(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<()> {
    let filter = doc! {
        "_id": election_id,
        "state": ElectionState::Draft,
    };
    let update = doc! {
        "$set": {
            "state": ElectionState::Published,
        }
    };
    let result = elections.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::bad_request(format!(
            "Election {} doesn't exist or isn't a draft; cannot publish.",
            election_id
        )));
    }
    Ok(())
}

#[post("/elections/<election_id>/archive")]
async fn archive_election(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<()> {
    let filter = doc! {
        "_id": election_id,
        "$or": [{"state": ElectionState::Draft}, {"state": ElectionState::Published}],
    };
    let update = doc! {
        "$set": {
            "state": ElectionState::Archived,
        }
    };
    let result = elections.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::bad_request(format!(
            "Election {} doesn't exist or is already archived.",
            election_id
        )));
    }
    Ok(())
}

/// The partial-write observability signal: count vote rows whose submission
/// never completed a session. These come from the inherent
/// votes-then-session write ordering and clear themselves when the voter
/// retries.
#[get("/elections/<election_id>/reconciliation")]
async fn election_reconciliation(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    sessions: Coll<VoteSession>,
) -> Result<Json<ReconciliationReport>> {
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{}'", election_id)))?;

    let election_filter = doc! { "election_id": election.id };
    let sessions: Vec<VoteSession> = sessions
        .find(election_filter.clone(), None)
        .await?
        .try_collect()
        .await?;
    let completed: HashSet<(Id, VoteType)> = sessions
        .iter()
        .map(|session| (session.voter_id, session.session_type))
        .collect();

    let votes: Vec<Vote> = votes
        .find(election_filter, None)
        .await?
        .try_collect()
        .await?;
    let orphaned_votes = votes
        .iter()
        .filter(|vote| !completed.contains(&(vote.voter_id, vote.selection.vote_type())))
        .count() as u64;

    if orphaned_votes > 0 {
        warn!(
            "Election {} has {} orphaned votes with no completed session",
            election_id, orphaned_votes
        );
    }
    Ok(Json(ReconciliationReport {
        election_id,
        orphaned_votes,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::{
        api::election::WindowSpec,
        db::vote::{NewVote, NewVoteSession, VoteSelection},
    };

    use super::*;

    #[backend_test(admin)]
    async fn create_election_assigns_ids(client: Client, db: Database) {
        let spec = ElectionSpec::current_example();
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let description: ElectionDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(description.state, ElectionState::Draft);
        assert_eq!(
            description
                .candidates
                .iter()
                .map(|c| c.id)
                .collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            description
                .initiatives
                .iter()
                .map(|i| i.id)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );

        // The election is present in the DB under the allocated ID.
        let stored = Coll::<crate::model::db::election::ElectionMetadata>::from_db(&db)
            .find_one(u32_id_filter(description.id), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, spec.title);
        assert_eq!(stored.state, ElectionState::Draft);

        // A second election gets the next ID.
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&ElectionSpec::future_example()).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let second: ElectionDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(second.id, description.id + 1);
    }

    #[backend_test(admin)]
    async fn malformed_specs_are_rejected(client: Client, db: Database) {
        // General window ends before it starts.
        let mut spec = ElectionSpec::current_example();
        spec.end_time = spec.start_time - Duration::days(1);
        create_expect_status(&client, &spec, Status::BadRequest).await;

        // A sub-window ends before it starts.
        let mut spec = ElectionSpec::current_example();
        spec.candidate_window = Some(WindowSpec {
            start_time: Utc::now(),
            end_time: Utc::now() - Duration::hours(1),
        });
        create_expect_status(&client, &spec, Status::BadRequest).await;

        // A candidate standing for a position outside the configured list.
        let mut spec = ElectionSpec::current_example();
        spec.candidates[0].position = "Grand Vizier".to_string();
        create_expect_status(&client, &spec, Status::BadRequest).await;

        // Nothing was created.
        let count = Coll::<Election>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[backend_test(admin)]
    async fn publish_archive_lifecycle(client: Client, db: Database) {
        // Operating on a missing election fails.
        publish_expect_status(&client, 999, Status::BadRequest).await;
        archive_expect_status(&client, 999, Status::BadRequest).await;

        let election = create_election_for_spec(&client, &ElectionSpec::current_example()).await;

        // Publish the draft.
        publish_expect_status(&client, election.id, Status::Ok).await;
        assert_eq!(state_of(&db, election.id).await, ElectionState::Published);

        // Publishing twice fails.
        publish_expect_status(&client, election.id, Status::BadRequest).await;

        // Archive it.
        archive_expect_status(&client, election.id, Status::Ok).await;
        assert_eq!(state_of(&db, election.id).await, ElectionState::Archived);

        // Archiving twice fails, and archived elections cannot be published.
        archive_expect_status(&client, election.id, Status::BadRequest).await;
        publish_expect_status(&client, election.id, Status::BadRequest).await;
    }

    #[backend_test]
    async fn admin_routes_are_hidden_without_login(client: Client) {
        // With no admin token the ranked routes fall through to nothing.
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&ElectionSpec::current_example()).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn reconciliation_counts_orphaned_votes(client: Client, db: Database) {
        let election = Election::published_example();
        Coll::<Election>::from_db(&db)
            .insert_one(&election, None)
            .await
            .unwrap();

        // A completed submission: two votes and their session.
        let complete_voter = Id::new();
        let rows = vec![
            NewVote::new(
                complete_voter,
                election.id,
                VoteSelection::Candidates {
                    candidate_id: 1,
                    position: "President".to_string(),
                },
            ),
            NewVote::new(
                complete_voter,
                election.id,
                VoteSelection::Candidates {
                    candidate_id: 3,
                    position: "Secretary".to_string(),
                },
            ),
        ];
        Coll::<NewVote>::from_db(&db)
            .insert_many(rows, None)
            .await
            .unwrap();
        Coll::<NewVoteSession>::from_db(&db)
            .insert_one(
                NewVoteSession::new(complete_voter, election.id, VoteType::Candidates, 2),
                None,
            )
            .await
            .unwrap();

        // An interrupted submission: a vote row with no session.
        Coll::<NewVote>::from_db(&db)
            .insert_one(
                NewVote::new(
                    Id::new(),
                    election.id,
                    VoteSelection::Candidates {
                        candidate_id: 2,
                        position: "President".to_string(),
                    },
                ),
                None,
            )
            .await
            .unwrap();

        let response = client
            .get(uri!(election_reconciliation(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let report: ReconciliationReport =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(report.orphaned_votes, 1);

        // Unknown elections have no report.
        let response = client
            .get(uri!(election_reconciliation(election.id + 1)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    async fn create_election_for_spec(client: &Client, spec: &ElectionSpec) -> ElectionDescription {
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    async fn create_expect_status(client: &Client, spec: &ElectionSpec, status: Status) {
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), status);
    }

    async fn publish_expect_status(client: &Client, id: ElectionId, status: Status) {
        let response = client.post(uri!(publish_election(id))).dispatch().await;
        assert_eq!(response.status(), status);
    }

    async fn archive_expect_status(client: &Client, id: ElectionId, status: Status) {
        let response = client.post(uri!(archive_election(id))).dispatch().await;
        assert_eq!(response.status(), status);
    }

    async fn state_of(db: &Database, id: ElectionId) -> ElectionState {
        Coll::<Election>::from_db(db)
            .find_one(u32_id_filter(id), None)
            .await
            .unwrap()
            .unwrap()
            .metadata
            .state
    }
}
