#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lms_client::auth::TokenStore;
use lms_client::client::AuthorizedClient;
use lms_client::session::Session;
use lms_client::storage::{keys, KeyValueStorage, MemoryStorage, SafeStorage, StorageError};
use lms_client::transport::ReqwestTransport;
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

/// A client wired to a mock backend and in-memory storage.
pub struct Fixture {
    pub server: MockServer,
    pub storage: Arc<MemoryStorage>,
    pub client: Arc<AuthorizedClient>,
}

pub async fn fixture(seed: &[(&str, &str)]) -> Fixture {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::seeded(seed.iter().copied()));
    let client = client_for(&server, SafeStorage::new(storage.clone()));
    Fixture {
        server,
        storage,
        client,
    }
}

pub fn client_for(server: &MockServer, storage: SafeStorage) -> Arc<AuthorizedClient> {
    let tokens = Arc::new(TokenStore::load(storage.clone()));
    let session = Arc::new(Session::new(tokens, storage));
    let transport = Arc::new(ReqwestTransport::new(
        reqwest::Client::new(),
        server.uri(),
        Duration::from_secs(5),
    ));
    Arc::new(AuthorizedClient::new(transport, session))
}

/// Storage seeded with an expired credential, a CSRF token, and a cached user.
pub fn stale_session() -> Vec<(&'static str, &'static str)> {
    vec![
        (keys::ACCESS_TOKEN, "stale"),
        (keys::CSRF_TOKEN, "csrf-1"),
        (keys::USER, r#"{"id":"u1","name":"Ada","email":"ada@example.edu","roles":["student"]}"#),
    ]
}

pub fn user_json(role: &str) -> Value {
    json!({
        "_id": "u1",
        "name": "Ada",
        "email": "ada@example.edu",
        "role": role,
    })
}

pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == path)
        .collect()
}

pub fn header_of(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Storage whose every operation fails.
#[derive(Default)]
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}
