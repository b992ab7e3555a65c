//! End-to-end tests of the issuer application through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use lcp_api::auth::AuthConfig;
use lcp_api::localization::Localizer;
use lcp_api::{issuer_app, IssuerState};
use lcp_core::license::LICENSE_CONTENT_TYPE;
use lcp_core::{License, UserRights};
use lcp_crypto::{user_key_from_passphrase, Ed25519KeyPair};
use lcp_license::{
    key_check_matches, verify_license, BuilderConfig, LicenseBuilder, LicenseSigner, LinkTemplates,
};
use lcp_sync::Credentials;

const USER: &str = "admin";
const PASSWORD: &str = "s3cret";

fn test_app() -> (Router, IssuerState) {
    let signer = Arc::new(LicenseSigner::new(Ed25519KeyPair::generate()));
    let builder = LicenseBuilder::new(
        BuilderConfig {
            provider: "https://provider.example".into(),
            links: LinkTemplates {
                hint: "https://provider.example/hint".into(),
                publication: "https://cdn.example/{content_id}.epub".into(),
                status: Some("https://lsd.example/licenses/{license_id}/status".into()),
            },
            default_rights: UserRights {
                print: Some(10),
                copy: Some(100),
                ..UserRights::default()
            },
        },
        signer,
    );
    let state = IssuerState::new(builder, None);
    let app = issuer_app(
        state.clone(),
        AuthConfig::new(Credentials::new(USER, PASSWORD)),
        Localizer::default(),
    );
    (app, state)
}

fn basic() -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{USER}:{PASSWORD}"));
    format!("Basic {token}")
}

fn authed(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic())
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

fn json_body(value: serde_json::Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn content_request() -> serde_json::Value {
    serde_json::json!({
        "content-id": "c1",
        "content-encryption-key": base64::engine::general_purpose::STANDARD.encode([7u8; 32]),
        "protected-content-location": "/var/lcp/c1.epub",
        "protected-content-length": 1024,
        "protected-content-sha256": "ab".repeat(32),
    })
}

fn license_request() -> serde_json::Value {
    serde_json::json!({
        "user": { "id": "u1", "email": "reader@example.org", "encrypted": ["email"] },
        "encryption": { "user_key": { "text_hint": "your library card", "clear_value": "open sesame" } },
        "rights": { "end": "2099-01-01T00:00:00Z" }
    })
}

async fn store_content(app: &Router) {
    let response = app
        .clone()
        .oneshot(authed("PUT", "/contents/c1", json_body(content_request())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn generate(app: &Router) -> License {
    let response = app
        .clone()
        .oneshot(authed("POST", "/contents/c1/license", json_body(license_request())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], LICENSE_CONTENT_TYPE);
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ── Health and docs ──────────────────────────────────────────────────

#[tokio::test]
async fn health_and_openapi_are_public() {
    let (app, _) = test_app();
    for (uri, expected) in [("/health/liveness", "ok"), ("/health/readiness", "ready")] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, expected.as_bytes());
    }

    let response = app
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(spec["paths"]["/contents/{content_id}/license"].is_object());
}

// ── Auth ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn contents_require_credentials() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/contents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
}

#[tokio::test]
async fn unknown_path_is_not_found_without_credentials() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/no/such/route").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    let problem: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        problem["type"],
        "http://readium.org/license-status-document/error/notfound"
    );
}

// ── Contents ─────────────────────────────────────────────────────────

#[tokio::test]
async fn content_put_creates_then_replaces() {
    let (app, state) = test_app();
    store_content(&app).await;

    let response = app
        .clone()
        .oneshot(authed("PUT", "/contents/c1", json_body(content_request())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.contents.list().len(), 1);

    let response = app
        .oneshot(authed("GET", "/contents", Body::empty()))
        .await
        .unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(listed[0]["id"], "c1");
    assert!(listed[0].get("encryption_key").is_none());
}

#[tokio::test]
async fn content_with_short_key_is_rejected() {
    let (app, _) = test_app();
    let mut request = content_request();
    request["content-encryption-key"] =
        base64::engine::general_purpose::STANDARD.encode([7u8; 16]).into();
    let response = app
        .oneshot(authed("PUT", "/contents/c1", json_body(request)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ── License generation ───────────────────────────────────────────────

#[tokio::test]
async fn generated_license_is_signed_and_checkable() {
    let (app, state) = test_app();
    store_content(&app).await;
    let license = generate(&app).await;

    assert!(!license.id.is_empty());
    verify_license(&license, None).unwrap();
    let user_key = user_key_from_passphrase("open sesame");
    assert!(key_check_matches(&license, &user_key[..]).unwrap());
    assert!(license.encryption.user_key.clear_value.is_none());
    assert_ne!(license.user.email.as_deref(), Some("reader@example.org"));
    assert_eq!(license.rights.print, Some(10));
    assert_eq!(
        license.link("status").map(|l| l.href.as_str()),
        Some(format!("https://lsd.example/licenses/{}/status", license.id).as_str())
    );
    assert!(state.licenses.get(&license.id).is_some());
}

#[tokio::test]
async fn license_for_unknown_content_is_not_found() {
    let (app, _) = test_app();
    let response = app
        .oneshot(authed("POST", "/contents/missing/license", json_body(license_request())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn license_without_user_key_is_bad_request() {
    let (app, _) = test_app();
    store_content(&app).await;
    let response = app
        .oneshot(authed(
            "POST",
            "/contents/c1/license",
            json_body(serde_json::json!({ "user": { "id": "u1" } })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ── License fetch ────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_without_body_returns_partial_license() {
    let (app, _) = test_app();
    store_content(&app).await;
    let license = generate(&app).await;

    let response = app
        .oneshot(authed("GET", &format!("/licenses/{}", license.id), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let partial: License = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(partial.id, license.id);
    assert!(partial.encryption.user_key.key_check.is_none());
    assert!(partial.encryption.user_key.value.is_none());
    assert!(partial.encryption.content_key.is_none());
}

#[tokio::test]
async fn fetch_with_user_data_regenerates() {
    let (app, _) = test_app();
    store_content(&app).await;
    let license = generate(&app).await;

    let response = app
        .oneshot(authed(
            "POST",
            &format!("/licenses/{}", license.id),
            json_body(license_request()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fresh: License = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(fresh.id, license.id);
    assert!(fresh.updated.is_some());
    verify_license(&fresh, None).unwrap();
    let user_key = user_key_from_passphrase("open sesame");
    assert!(key_check_matches(&fresh, &user_key[..]).unwrap());
}

#[tokio::test]
async fn fetch_unknown_license_is_not_found() {
    let (app, _) = test_app();
    let response = app
        .oneshot(authed("GET", "/licenses/nope", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Rights update ────────────────────────────────────────────────────

#[tokio::test]
async fn patch_moves_rights_end_and_resigns() {
    let (app, state) = test_app();
    store_content(&app).await;
    let license = generate(&app).await;

    let response = app
        .oneshot(authed(
            "PATCH",
            &format!("/licenses/{}", license.id),
            json_body(serde_json::json!({
                "id": license.id,
                "rights": { "end": "2098-06-01T00:00:00Z" }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state.licenses.get(&license.id).unwrap().license;
    assert_eq!(
        stored.rights.end.map(|e| e.to_rfc3339()),
        Some("2098-06-01T00:00:00Z".to_string())
    );
    assert_eq!(stored.rights.print, Some(10));
    assert_ne!(stored.signature, license.signature);
    verify_license(&stored, None).unwrap();
}

// ── Listings ─────────────────────────────────────────────────────────

#[tokio::test]
async fn listings_page_with_link_header() {
    let (app, _) = test_app();
    store_content(&app).await;
    for _ in 0..3 {
        generate(&app).await;
    }

    let response = app
        .clone()
        .oneshot(authed("GET", "/licenses?page=1&per_page=2", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let link = response.headers()[header::LINK].to_str().unwrap().to_string();
    assert!(link.contains("page=2&per_page=2>; rel=\"next\""));
    let page: Vec<License> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(|l| l.encryption.content_key.is_none()));

    let response = app
        .clone()
        .oneshot(authed("GET", "/contents/c1/licenses?page=2&per_page=2", Body::empty()))
        .await
        .unwrap();
    let page: Vec<License> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(page.len(), 1);

    let response = app
        .oneshot(authed("GET", "/licenses?page=0", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
