//! # lcp-api — License Issuer and Status Services
//!
//! Two Axum applications built on the same middleware stack:
//!
//! - **Issuer** ([`issuer_app`], binary `lcpserver`): registers encrypted
//!   publications and issues, regenerates and updates signed licenses.
//! - **Status** ([`status_app`], binary `lsdserver`): tracks each license's
//!   status and drives device registration, return, renewal, cancellation
//!   and revocation, pushing new end dates back to the issuer.
//!
//! ## Routes
//!
//! - `/contents/*`, `/licenses/*` — Issuer (all behind Basic auth)
//! - `/licenses/*` — Status (public reading-app routes, privileged provider routes)
//! - `/compliancetest` — Status, compliance mode only
//! - `/health/*`, `/openapi.json` — Unauthenticated
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → Extensions → Problem localization → CatchPanic → Auth (privileged routes)
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - No business logic in route handlers: transitions live in `lcp-state`,
//!   envelopes in `lcp-license`, cross-service calls in `lcp-sync`.
//! - All errors map to `application/problem+json` responses via `AppError`.

pub mod auth;
pub mod compliance;
pub mod config;
pub mod error;
pub mod extractors;
pub mod localization;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use error::AppError;
pub use state::{IssuerState, StatusState};

use std::any::Any;

use axum::http::Uri;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::localization::Localizer;

/// Assemble the issuer application.
///
/// Health checks and `/openapi.json` are mounted outside the auth
/// middleware.
pub fn issuer_app(state: IssuerState, auth: AuthConfig, localizer: Localizer) -> Router {
    let api = Router::new()
        .merge(routes::contents::router())
        .merge(routes::licenses::router())
        .route_layer(from_fn(auth::auth_middleware));

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::issuer_router());

    let app = Router::new()
        .merge(unauthenticated)
        .merge(api)
        .fallback(no_route)
        .with_state(state);
    service_layers(app, auth, localizer)
}

/// Assemble the status application.
///
/// Reading-app routes are public; provider routes require Basic auth. The
/// compliance control route exists only when the state runs a compliance
/// session.
pub fn status_app(state: StatusState, auth: AuthConfig) -> Router {
    let privileged =
        routes::status::privileged_router().route_layer(from_fn(auth::auth_middleware));

    let mut public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(routes::status::public_router())
        .merge(openapi::status_router());
    if state.compliance.is_some() {
        tracing::info!("compliance mode enabled");
        public = public.merge(routes::compliance::router());
    }

    let localizer = state.localizer.clone();
    let app = Router::new()
        .merge(public)
        .merge(privileged)
        .fallback(no_route)
        .with_state(state);
    service_layers(app, auth, localizer)
}

fn service_layers(app: Router, auth: AuthConfig, localizer: Localizer) -> Router {
    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(localization::localize_problems))
        .layer(Extension(localizer))
        .layer(Extension(auth))
        .layer(TraceLayer::new_for_http())
}

/// A panicking handler answers a generic 500 problem.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Unmatched paths answer a 404 problem, with or without credentials.
async fn no_route(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

/// GET /health/liveness — The process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — The service accepts traffic.
async fn readiness() -> &'static str {
    "ready"
}
