use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        candidate::{Candidate, Category},
        theme::ThemeBody,
    },
    results::{by_category, ResultsSummary},
    state::{SharedElection, SharedTheme},
};

pub fn routes() -> Vec<Route> {
    routes![
        candidates,
        candidate,
        results,
        get_theme,
        put_theme,
        toggle_theme
    ]
}

#[get("/candidates?<category>")]
pub async fn candidates(
    category: Option<Category>,
    election: &State<SharedElection>,
) -> Json<Vec<Candidate>> {
    let election = election.lock().await;
    let candidates = by_category(election.candidates(), category)
        .into_iter()
        .cloned()
        .collect();
    Json(candidates)
}

#[get("/candidates/<id>")]
pub async fn candidate(id: &str, election: &State<SharedElection>) -> Result<Json<Candidate>> {
    election
        .lock()
        .await
        .candidate(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("Candidate {id}")))
}

#[get("/results?<category>")]
pub async fn results(
    category: Option<Category>,
    election: &State<SharedElection>,
) -> Json<ResultsSummary> {
    let election = election.lock().await;
    Json(ResultsSummary::new(election.candidates(), category))
}

#[get("/theme")]
pub async fn get_theme(theme: &State<SharedTheme>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: theme.lock().await.theme(),
    })
}

#[put("/theme", data = "<body>", format = "json")]
pub async fn put_theme(body: Json<ThemeBody>, theme: &State<SharedTheme>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: theme.lock().await.set(body.theme),
    })
}

#[post("/theme/toggle")]
pub async fn toggle_theme(theme: &State<SharedTheme>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: theme.lock().await.toggle(),
    })
}
