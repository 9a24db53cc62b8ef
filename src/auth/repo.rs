use serde::{de::DeserializeOwned, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo_types::{
    CredentialRecord, Session, CREDENTIALS_KEY, LAST_USERNAME_CHANGE_KEY, SESSION_KEY,
};
use crate::storage::{KeyValueStore, StoreError};

/// Malformed payloads read as absent.
fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = kv.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, key, "ignoring malformed stored value");
            None
        }
    }
}

fn write_json<T: Serialize>(kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    kv.set(key, &raw)
}

impl CredentialRecord {
    pub fn load(kv: &dyn KeyValueStore) -> Option<CredentialRecord> {
        read_json(kv, CREDENTIALS_KEY)
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), StoreError> {
        write_json(kv, CREDENTIALS_KEY, self)
    }
}

impl Session {
    /// Fresh session for the record; ids are never reused.
    pub fn issue(record: &CredentialRecord) -> Session {
        Session {
            id: Uuid::new_v4().simple().to_string(),
            email: record.email.clone(),
            username: record.username.clone(),
            display_name: record.display_name.clone(),
        }
    }

    pub fn load(kv: &dyn KeyValueStore) -> Option<Session> {
        read_json(kv, SESSION_KEY)
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), StoreError> {
        write_json(kv, SESSION_KEY, self)
    }

    pub fn clear(kv: &dyn KeyValueStore) -> Result<(), StoreError> {
        kv.remove(SESSION_KEY)
    }
}

pub fn load_last_username_change(kv: &dyn KeyValueStore) -> Option<OffsetDateTime> {
    let raw = kv.get(LAST_USERNAME_CHANGE_KEY)?;
    match OffsetDateTime::parse(&raw, &Rfc3339) {
        Ok(at) => Some(at),
        Err(e) => {
            warn!(error = %e, "ignoring malformed last username change timestamp");
            None
        }
    }
}

pub fn save_last_username_change(
    kv: &dyn KeyValueStore,
    at: OffsetDateTime,
) -> Result<(), StoreError> {
    let raw = at.format(&Rfc3339)?;
    kv.set(LAST_USERNAME_CHANGE_KEY, &raw)
}
