use serde::{Deserialize, Serialize};

use crate::storage::{Persisted, ADMINS_KEY, ADMIN_SESSION_KEY};

/// An administrator account.
///
/// This is a demonstration system: the password is kept and compared as
/// plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Admin {
    /// Exact match on both email and password.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }

    pub fn session(&self) -> AdminSession {
        AdminSession {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

impl Persisted for Vec<Admin> {
    const KEY: &'static str = ADMINS_KEY;
}

/// The administrator currently signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub email: String,
    pub name: String,
}

impl Persisted for AdminSession {
    const KEY: &'static str = ADMIN_SESSION_KEY;
}

/// Credentials submitted to sign in.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

/// Details submitted to create a new administrator account.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminRegistration {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err("Name, email and password are all required".to_string());
        }
        Ok(())
    }
}
