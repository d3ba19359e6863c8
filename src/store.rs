use std::collections::HashMap;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// In-memory collection of secret records, keyed by unique name.
///
/// Values are envelope tokens; the store never sees plaintext.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Store {
    secrets: HashMap<String, SecretEntry>,
    creation_date: String,
}

/// One stored secret: a name, its envelope token, and timestamps.
#[derive(Serialize, Deserialize, Debug)]
pub struct SecretEntry {
    name: String,
    token: String,
    created: String,
    updated: String,
}

impl SecretEntry {
    pub(crate) fn new(name: String, token: String) -> Self {
        let now = Local::now().to_string();
        Self {
            name,
            token,
            created: now.clone(),
            updated: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn updated(&self) -> &str {
        &self.updated
    }

    pub(crate) fn update_token(&mut self, new_token: String) {
        self.token = new_token;
        self.updated = Local::now().to_string();
    }
}

impl Store {
    pub fn new() -> Self {
        Store {
            secrets: HashMap::new(),
            creation_date: Local::now().to_string(),
        }
    }

    pub fn set(&mut self, name: &str, token: &str) -> Result<(), StoreError> {
        if self.secrets.contains_key(name) {
            Err(StoreError::AlreadyExists(name.to_string()))
        } else {
            self.secrets.insert(
                name.to_string(),
                SecretEntry::new(name.to_string(), token.to_string()),
            );
            Ok(())
        }
    }

    pub fn token(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(|e| e.token())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        if self.secrets.remove(name).is_some() {
            Ok(())
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }

    pub fn update(&mut self, name: &str, token: &str) -> Result<(), StoreError> {
        match self.secrets.get_mut(name) {
            Some(secret) => {
                secret.update_token(token.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.secrets.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SecretEntry> {
        self.secrets.values()
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_new_store_works() {
        let store = Store::new();
        assert_eq!(store.len(), 0);
        assert_ne!(store.creation_date, "");
    }

    #[test]
    fn set_records_name_and_timestamps() {
        let mut store = Store::new();
        store.set("API_KEY", "token-a").unwrap();

        let entry = store.entries().next().unwrap();
        assert_eq!(entry.name(), "API_KEY");
        assert_eq!(entry.token(), "token-a");
        assert_ne!(entry.created(), "");
        assert_eq!(entry.created(), entry.updated());
    }

    #[test]
    fn set_existing_name_fails() {
        let mut store = Store::new();
        store.set("A", "t1").unwrap();
        match store.set("A", "t2") {
            Err(StoreError::AlreadyExists(name)) => assert_eq!(name, "A"),
            other => panic!("expected AlreadyExists, got: {other:?}"),
        }
    }

    #[test]
    fn update_replaces_token() {
        let mut store = Store::new();
        store.set("A", "t1").unwrap();
        store.update("A", "t2").unwrap();
        assert_eq!(store.token("A").unwrap(), "t2");
    }

    #[test]
    fn update_missing_name_fails() {
        let mut store = Store::new();
        match store.update("A", "t1") {
            Err(StoreError::NotFound(name)) => assert_eq!(name, "A"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn remove_works() {
        let mut store = Store::new();
        store.set("A", "t1").unwrap();
        store.remove("A").unwrap();
        assert_eq!(store.token("A"), None);
    }

    #[test]
    fn remove_missing_name_fails() {
        let mut store = Store::new();
        match store.remove("A") {
            Err(StoreError::NotFound(name)) => assert_eq!(name, "A"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn token_of_missing_name_is_none() {
        let store = Store::new();
        assert_eq!(store.token("A"), None);
    }

    #[test]
    fn store_roundtrips_through_json() {
        let mut store = Store::new();
        store.set("A", "t1").unwrap();
        store.set("B", "t2").unwrap();

        let data = serde_json::to_vec(&store).unwrap();
        let parsed: Store = serde_json::from_slice(&data).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.token("A").unwrap(), "t1");
        assert_eq!(parsed.token("B").unwrap(), "t2");
    }
}
