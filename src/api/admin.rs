use rocket::{
    http::{ContentType, Header},
    serde::json::Json,
    Route, State,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        auth::AdminAuth,
        candidate::{Candidate, CandidateUpdate, NewCandidate},
    },
    results::{export_placeholder_png, EXPORT_FILE_NAME},
    state::SharedElection,
};

pub fn routes() -> Vec<Route> {
    routes![
        get_admins,
        create_candidate,
        modify_candidate,
        delete_candidate,
        export_results,
    ]
}

/// A file download.
#[derive(Responder)]
pub struct Attachment {
    body: Vec<u8>,
    content_type: ContentType,
    disposition: Header<'static>,
}

impl Attachment {
    pub fn new(body: Vec<u8>, content_type: ContentType, file_name: &str) -> Self {
        Self {
            body,
            content_type,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{file_name}\""),
            ),
        }
    }
}

/// Public view of an administrator account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSummary {
    pub name: String,
    pub email: String,
}

#[get("/admins")]
async fn get_admins(_admin: AdminAuth, election: &State<SharedElection>) -> Json<Vec<AdminSummary>> {
    let admins = election
        .lock()
        .await
        .admins()
        .iter()
        .map(|admin| AdminSummary {
            name: admin.name.clone(),
            email: admin.email.clone(),
        })
        .collect();
    Json(admins)
}

#[post("/candidates", data = "<new_candidate>", format = "json")]
pub async fn create_candidate(
    _admin: AdminAuth,
    new_candidate: Json<NewCandidate>,
    election: &State<SharedElection>,
) -> Result<Json<Candidate>> {
    new_candidate.validate().map_err(Error::bad_request)?;
    let candidate = election.lock().await.add_candidate(new_candidate.0);
    Ok(Json(candidate))
}

#[patch("/candidates/<id>", data = "<update>", format = "json")]
pub async fn modify_candidate(
    _admin: AdminAuth,
    id: &str,
    update: Json<CandidateUpdate>,
    election: &State<SharedElection>,
) -> Result<Json<Candidate>> {
    update.validate().map_err(Error::bad_request)?;
    election
        .lock()
        .await
        .update_candidate(id, update.0)
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("Candidate {id}")))
}

#[delete("/candidates/<id>")]
pub async fn delete_candidate(
    _admin: AdminAuth,
    id: &str,
    election: &State<SharedElection>,
) -> Result<()> {
    if election.lock().await.delete_candidate(id) {
        Ok(())
    } else {
        Err(Error::not_found(format!("Candidate {id}")))
    }
}

#[get("/results/export")]
pub async fn export_results(_admin: AdminAuth) -> Attachment {
    Attachment::new(export_placeholder_png(), ContentType::PNG, EXPORT_FILE_NAME)
}
