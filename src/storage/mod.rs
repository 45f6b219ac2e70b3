//! Key-value persistence standing in for browser local storage.
//!
//! Values are JSON text. Callers never touch a medium directly; they go
//! through [`Repo`], so the in-memory and on-disk stores are interchangeable.

use rocket::serde::json::serde_json::Error as JsonError;
use thiserror::Error;

mod file;
mod memory;
mod repo;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repo::{Persisted, Repo};

pub const CANDIDATES_KEY: &str = "candidates";
pub const ADMINS_KEY: &str = "admins";
pub const USER_SESSION_KEY: &str = "userSession";
pub const ADMIN_SESSION_KEY: &str = "adminSession";
pub const THEME_KEY: &str = "theme";

/// Key of the per-voter vote record.
pub fn votes_key(dni: &str) -> String {
    format!("votes_{dni}")
}

/// Errors raised by a storage medium.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("could not encode `{key}`: {source}")]
    Encode { key: String, source: JsonError },
    #[error("could not decode `{key}`: {source}")]
    Decode { key: String, source: JsonError },
    #[error("storage is read-only")]
    ReadOnly,
}

/// A synchronous string-keyed text store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing what was there.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
