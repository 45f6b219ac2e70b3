use rocket::{http::Status, serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        admin::{AdminCredentials, AdminRegistration, AdminSession},
        voter::{Dni, DniRequest, VoterSession},
    },
    state::SharedElection,
};

pub fn routes() -> Vec<Route> {
    routes![
        session,
        login_voter,
        logout_voter,
        login_admin,
        register_admin,
        logout_admin
    ]
}

/// Who is currently signed in.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub user: Option<VoterSession>,
    pub admin: Option<AdminSession>,
}

#[get("/session")]
pub async fn session(election: &State<SharedElection>) -> Json<SessionView> {
    let election = election.lock().await;
    Json(SessionView {
        user: election.user_session().cloned(),
        admin: election.admin_session().cloned(),
    })
}

#[post("/auth/voter", data = "<request>", format = "json")]
pub async fn login_voter(
    request: Json<DniRequest>,
    election: &State<SharedElection>,
) -> Result<Json<VoterSession>> {
    let dni: Dni = request.dni.trim().parse().map_err(Error::bad_request)?;
    let session = election.lock().await.login_user(&dni);
    Ok(Json(session))
}

#[delete("/auth/voter")]
pub async fn logout_voter(election: &State<SharedElection>) -> Status {
    election.lock().await.logout_user();
    Status::Ok
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn login_admin(
    credentials: Json<AdminCredentials>,
    election: &State<SharedElection>,
) -> Result<Json<AdminSession>> {
    let mut election = election.lock().await;
    if !election.login_admin(&credentials.email, &credentials.password) {
        return Err(Error::Status(
            Status::Unauthorized,
            "No admin found with the provided email and password combination.".to_string(),
        ));
    }
    // Present: login just succeeded.
    election
        .admin_session()
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::Status(Status::InternalServerError, "Session lost".to_string()))
}

#[post("/auth/admin/register", data = "<registration>", format = "json")]
pub async fn register_admin(
    registration: Json<AdminRegistration>,
    election: &State<SharedElection>,
) -> Result<Json<AdminSession>> {
    registration.validate().map_err(Error::bad_request)?;
    let mut election = election.lock().await;
    if !election.register_admin(
        registration.name.trim(),
        registration.email.trim(),
        &registration.password,
    ) {
        return Err(Error::Status(
            Status::Conflict,
            format!("Admin email already in use: {}", registration.email.trim()),
        ));
    }
    election
        .admin_session()
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::Status(Status::InternalServerError, "Session lost".to_string()))
}

#[delete("/auth/admin")]
pub async fn logout_admin(election: &State<SharedElection>) -> Status {
    election.lock().await.logout_admin();
    Status::Ok
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::json},
    };

    use crate::storage::{KeyValueStore, MemoryStore};

    use super::*;

    async fn current_session(client: &Client) -> SessionView {
        let response = client.get(uri!(session)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn admin_login_valid(client: Client, store: Arc<MemoryStore>) {
        let response = client
            .post(uri!(login_admin))
            .header(ContentType::JSON)
            .body(json!(AdminCredentials::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let session = current_session(&client).await.admin.unwrap();
        assert_eq!(session.name, "Admin Demo");
        assert!(store.get("adminSession").unwrap().is_some());
    }

    #[backend_test]
    async fn admin_login_invalid(client: Client) {
        let response = client
            .post(uri!(login_admin))
            .header(ContentType::JSON)
            .body(json!(AdminCredentials::wrong_password()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .post(uri!(login_admin))
            .header(ContentType::JSON)
            .body(json!({ "email": "nadie@demo.com", "password": "Demo123!" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        assert!(current_session(&client).await.admin.is_none());
    }

    #[backend_test]
    async fn register_then_duplicate(client: Client) {
        let response = client
            .post(uri!(register_admin))
            .header(ContentType::JSON)
            .body(json!(AdminRegistration::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            current_session(&client).await.admin.map(|a| a.email),
            Some("lucia@example.com".to_string())
        );

        let response = client
            .post(uri!(register_admin))
            .header(ContentType::JSON)
            .body(json!(AdminRegistration::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test]
    async fn register_requires_fields(client: Client) {
        let response = client
            .post(uri!(register_admin))
            .header(ContentType::JSON)
            .body(json!(AdminRegistration::empty()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn admin_logout(client: Client, store: Arc<MemoryStore>) {
        assert!(current_session(&client).await.admin.is_some());

        let response = client.delete(uri!(logout_admin)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(current_session(&client).await.admin.is_none());
        assert!(store.get("adminSession").unwrap().is_none());
    }

    #[backend_test]
    async fn voter_login_validates_dni(client: Client) {
        for dni in ["123456", "12345678901", "12a4567"] {
            let response = client
                .post(uri!(login_voter))
                .header(ContentType::JSON)
                .body(json!({ "dni": dni }).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status(), "{dni}");
        }
        assert!(current_session(&client).await.user.is_none());
    }

    #[backend_test]
    async fn voter_login_and_logout(client: Client) {
        let response = client
            .post(uri!(login_voter))
            .header(ContentType::JSON)
            .body(json!(DniRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let session: VoterSession =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(
            session,
            VoterSession {
                dni: "1234567".to_string(),
                voted_presidencia: false,
                voted_alcaldia: false,
            }
        );

        let response = client.delete(uri!(logout_voter)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(current_session(&client).await.user.is_none());
    }
}
