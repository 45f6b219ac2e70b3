use std::marker::PhantomData;
use std::sync::Arc;

use rocket::serde::json::serde_json;
use serde::{de::DeserializeOwned, Serialize};

use super::{KeyValueStore, StoreError};

/// A type that lives under a fixed storage key.
pub trait Persisted {
    /// The key the value is stored under.
    const KEY: &'static str;
}

/// A typed, JSON-encoded view of a single key in a [`KeyValueStore`].
pub struct Repo<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Repo<T>
where
    T: Persisted,
{
    /// Get a handle on the well-known key for `T`.
    pub fn from_store(store: &Arc<dyn KeyValueStore>) -> Self {
        Self::keyed(store, T::KEY)
    }
}

impl<T> Repo<T> {
    /// Get a handle on an arbitrary key.
    pub fn keyed<K: Into<String>>(store: &Arc<dyn KeyValueStore>, key: K) -> Self {
        Self {
            store: Arc::clone(store),
            key: key.into(),
            phantom: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Delete the stored value.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}

impl<T> Repo<T>
where
    T: Serialize,
{
    /// Encode and store `value`.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.set(&self.key, &text)
    }
}

impl<T> Repo<T>
where
    T: DeserializeOwned,
{
    /// Load and decode the stored value, if there is one.
    pub fn load(&self) -> Result<Option<T>, StoreError> {
        match self.store.get(&self.key)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: self.key.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}
