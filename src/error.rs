use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{serde_json::json, Json},
    Request,
};
use thiserror::Error;

use crate::{analysis::AnalysisError, logging::RequestId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found<S: AsRef<str>>(what: S) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.as_ref()))
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::Status(Status::BadRequest, msg.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Analysis(AnalysisError::AlreadyTraining) => Status::Conflict,
            Self::Analysis(_) => Status::BadRequest,
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        debug!("req{} failed with {status}: {self}", RequestId::of(req));
        (status, Json(json!({ "error": self.to_string() }))).respond_to(req)
    }
}
