use std::sync::RwLock;

use crate::storage::{keys, SafeStorage};

use super::token::TokenGrant;

/// In-memory credential holder mirrored to durable storage.
///
/// The access credential is read from storage once, at construction; after
/// that memory is authoritative and storage is only written. The CSRF token
/// is only needed by the refresh request, so it is read from storage on
/// demand.
#[derive(Debug)]
pub struct TokenStore {
    storage: SafeStorage,
    credential: RwLock<Option<String>>,
}

impl TokenStore {
    /// Load the persisted credential, if any.
    pub fn load(storage: SafeStorage) -> Self {
        let credential = storage.get(keys::ACCESS_TOKEN);
        Self {
            storage,
            credential: RwLock::new(credential),
        }
    }

    pub fn credential(&self) -> Option<String> {
        match self.credential.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    pub fn set_credential(&self, token: Option<String>) {
        self.storage.put(keys::ACCESS_TOKEN, token.as_deref());
        match self.credential.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.storage.get(keys::CSRF_TOKEN)
    }

    pub fn set_csrf_token(&self, token: Option<&str>) {
        self.storage.put(keys::CSRF_TOKEN, token);
    }

    /// Store a freshly issued grant. A grant without a CSRF token keeps the
    /// previous one.
    pub fn apply_grant(&self, grant: &TokenGrant) {
        self.set_credential(Some(grant.access_token.clone()));
        if let Some(csrf) = grant.csrf_token.as_deref() {
            self.set_csrf_token(Some(csrf));
        }
    }

    /// Drop the credential and the CSRF token from memory and storage.
    pub fn clear(&self) {
        self.set_credential(None);
        self.set_csrf_token(None);
    }
}
