use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        auth::VoterAuth,
        voter::{UserVotes, VoterSession},
    },
    state::{SharedElection, VoteOutcome},
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, user_votes]
}

#[post("/votes/<candidate_id>")]
pub async fn cast_vote(
    _voter: VoterAuth,
    candidate_id: &str,
    election: &State<SharedElection>,
) -> Result<Json<VoterSession>> {
    let mut election = election.lock().await;
    match election.vote_for_candidate(candidate_id) {
        VoteOutcome::Recorded(_) => {}
        VoteOutcome::NoSession => {
            return Err(Error::Status(
                Status::Unauthorized,
                "No voter signed in".to_string(),
            ))
        }
        VoteOutcome::UnknownCandidate => {
            return Err(Error::not_found(format!("Candidate {candidate_id}")))
        }
        VoteOutcome::AlreadyVoted(category) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Already voted for {category}"),
            ))
        }
    }
    election
        .user_session()
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::Status(Status::Unauthorized, "No voter signed in".to_string()))
}

#[get("/votes")]
pub async fn user_votes(_voter: VoterAuth, election: &State<SharedElection>) -> Json<UserVotes> {
    Json(election.lock().await.user_votes())
}
