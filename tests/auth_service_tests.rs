mod auth_support;

use lms_client::auth::{AuthService, LoginRequest, RegisterRequest};
use lms_client::error::LmsError;
use lms_client::session::Role;
use lms_client::storage::{keys, KeyValueStorage};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use auth_support::{fixture, requests_to, stale_session, user_json};

#[tokio::test]
async fn login_stores_grant_and_user() {
    let fx = fixture(&[]).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ada@example.edu", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "csrfToken": "csrf-1",
            "user": user_json("instructor"),
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let user = AuthService::new(fx.client.clone())
        .login(&LoginRequest::new("ada@example.edu", "hunter2"))
        .await
        .unwrap();

    assert_eq!(user.roles, vec![Role::Instructor]);
    assert_eq!(fx.client.tokens().credential().as_deref(), Some("access-1"));
    assert_eq!(fx.storage.get(keys::CSRF_TOKEN).unwrap().as_deref(), Some("csrf-1"));
    let state = fx.client.session().snapshot();
    assert!(state.is_authenticated);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn rejected_login_does_not_refresh() {
    let fx = fixture(&[]).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .expect(1)
        .mount(&fx.server)
        .await;

    let err = AuthService::new(fx.client.clone())
        .login(&LoginRequest::new("ada@example.edu", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, LmsError::Unauthorized(_)));
    assert!(requests_to(&fx.server, "/auth/refresh").await.is_empty());
    assert!(fx.storage.is_empty());
}

#[tokio::test]
async fn register_sends_role_and_signs_in() {
    let fx = fixture(&[]).await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "name": "Ada",
            "email": "ada@example.edu",
            "password": "hunter2",
            "role": "student"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json("student"),
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    AuthService::new(fx.client.clone())
        .register(&RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.edu".to_string(),
            password: "hunter2".to_string(),
            role: Some(Role::Student),
        })
        .await
        .unwrap();

    assert!(fx.client.session().has_role("student"));
    assert_eq!(fx.client.tokens().csrf_token(), None);
}

#[tokio::test]
async fn logout_clears_local_session_even_when_server_fails() {
    let fx = fixture(&stale_session()).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&fx.server)
        .await;

    let service = AuthService::new(fx.client.clone());
    service.logout().await;
    service.logout().await;

    assert!(fx.storage.is_empty());
    assert!(!fx.client.session().is_authenticated());
}

#[tokio::test]
async fn me_returns_profile() {
    let fx = fixture(&[(keys::ACCESS_TOKEN, "valid")]).await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("admin")))
        .mount(&fx.server)
        .await;

    let user = AuthService::new(fx.client.clone()).me().await.unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "ada@example.edu");
}

#[test]
fn credentials_are_redacted_in_debug_output() {
    let debug = format!("{:?}", LoginRequest::new("ada@example.edu", "hunter2"));
    assert!(debug.contains("ada@example.edu"));
    assert!(!debug.contains("hunter2"));
}
