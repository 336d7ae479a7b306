use mongodb::bson::doc;
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, ElectionState},
    db::{election::Election, vote::Vote},
    mongodb::Coll,
};

/// Look up an election that is visible to non-admins, i.e. published or
/// archived. Drafts are indistinguishable from missing elections.
pub async fn visible_election_by_id(
    election_id: ElectionId,
    elections: &Coll<Election>,
) -> Result<Election> {
    let filter = doc! {
        "_id": election_id,
        "$or": [{"state": ElectionState::Published}, {"state": ElectionState::Archived}],
    };
    elections
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{}'", election_id)))
}

/// Fetch every vote cast in the given election.
pub async fn election_votes(election_id: ElectionId, votes: &Coll<Vote>) -> Result<Vec<Vote>> {
    let all_votes = votes
        .find(doc! { "election_id": election_id }, None)
        .await?
        .try_collect()
        .await?;
    Ok(all_votes)
}
