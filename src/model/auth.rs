//! Request guards gating routes on the current sessions.

use rocket::{
    http::Status,
    outcome::try_outcome,
    request::{self, FromRequest},
    Request, State,
};

use crate::model::{admin::AdminSession, voter::VoterSession};
use crate::state::SharedElection;

/// Why a session guard refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    NoAdminSession,
    NoVoterSession,
}

/// An administrator is signed in.
pub struct AdminAuth(pub AdminSession);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminAuth {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let election = try_outcome!(req
            .guard::<&State<SharedElection>>()
            .await
            .map_failure(|(status, _)| (status, SessionError::NoAdminSession)));
        let session = election.lock().await.admin_session().cloned();
        match session {
            Some(session) => request::Outcome::Success(AdminAuth(session)),
            None => request::Outcome::Failure((Status::Unauthorized, SessionError::NoAdminSession)),
        }
    }
}

/// A voter is signed in.
pub struct VoterAuth(pub VoterSession);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for VoterAuth {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let election = try_outcome!(req
            .guard::<&State<SharedElection>>()
            .await
            .map_failure(|(status, _)| (status, SessionError::NoVoterSession)));
        let session = election.lock().await.user_session().cloned();
        match session {
            Some(session) => request::Outcome::Success(VoterAuth(session)),
            None => request::Outcome::Failure((Status::Unauthorized, SessionError::NoVoterSession)),
        }
    }
}
