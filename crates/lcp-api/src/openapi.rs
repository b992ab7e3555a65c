//! # OpenAPI Specification Assembly
//!
//! One document per service, each served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::{IssuerState, StatusState};

/// Adds the Basic security scheme of the privileged routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Basic)
                        .description(Some(
                            "HTTP Basic authentication with the credentials of the `auth` config section.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document of the license issuer.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LCP License Server",
        version = "0.1.0",
        description = "Registers encrypted publications and issues signed licenses for them.\n\nAll routes except `/health/*` and `/openapi.json` require HTTP Basic authentication."
    ),
    paths(
        // ── Contents ─────────────────────────────────────────────────────
        crate::routes::contents::store_content,
        crate::routes::contents::list_contents,
        crate::routes::contents::generate_license,
        crate::routes::contents::list_content_licenses,
        // ── Licenses ─────────────────────────────────────────────────────
        crate::routes::licenses::list_licenses,
        crate::routes::licenses::fetch_license,
        crate::routes::licenses::update_license,
    ),
    components(schemas(
        crate::error::Problem,
        crate::routes::contents::ContentRequest,
        crate::routes::contents::ContentResponse,
        crate::routes::LicenseDocument,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "contents", description = "Encrypted publications and their master keys"),
        (name = "licenses", description = "License generation, retrieval and rights updates"),
    )
)]
pub struct IssuerApiDoc;

/// OpenAPI document of the license status service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LCP License Status Server",
        version = "0.1.0",
        description = "Tracks the status of issued licenses: device registration, loan return and renewal, provider cancellation and revocation."
    ),
    paths(
        // ── Reading applications ─────────────────────────────────────────
        crate::routes::status::get_status,
        crate::routes::status::register_device,
        crate::routes::status::return_license,
        crate::routes::status::renew_license,
        crate::routes::status::fresh_license,
        // ── Provider ─────────────────────────────────────────────────────
        crate::routes::status::create_status,
        crate::routes::status::change_status,
        crate::routes::status::filter_statuses,
        crate::routes::status::registered_devices,
        // ── Compliance ───────────────────────────────────────────────────
        crate::routes::compliance::compliance_test,
    ),
    components(schemas(
        crate::error::Problem,
        crate::routes::status::StatusChangeRequest,
        crate::routes::status::StatusSummary,
        crate::routes::LicenseDocument,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "status", description = "License status documents and transitions"),
        (name = "compliance", description = "Compliance test session control"),
    )
)]
pub struct StatusApiDoc;

pub fn issuer_router() -> Router<IssuerState> {
    Router::new().route("/openapi.json", get(|| async { Json(IssuerApiDoc::openapi()) }))
}

pub fn status_router() -> Router<StatusState> {
    Router::new().route("/openapi.json", get(|| async { Json(StatusApiDoc::openapi()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_spec_has_license_paths() {
        let spec = IssuerApiDoc::openapi();
        assert_eq!(spec.info.title, "LCP License Server");
        assert!(spec.paths.paths.contains_key("/contents/{content_id}/license"));
        assert!(spec.paths.paths.contains_key("/licenses/{license_id}"));
    }

    #[test]
    fn status_spec_has_transition_paths() {
        let spec = StatusApiDoc::openapi();
        for path in [
            "/licenses/{license_id}/status",
            "/licenses/{license_id}/register",
            "/licenses/{license_id}/return",
            "/licenses/{license_id}/renew",
            "/licenses",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn license_bodies_are_documented_with_license_media_type() {
        use utoipa::openapi::PathItemType;

        let issuer = IssuerApiDoc::openapi();
        let status = StatusApiDoc::openapi();
        for (spec, path, method) in [
            (&issuer, "/contents/{content_id}/license", PathItemType::Post),
            (&issuer, "/licenses/{license_id}", PathItemType::Patch),
            (&status, "/licenses", PathItemType::Post),
        ] {
            let body = spec.paths.paths[path].operations[&method]
                .request_body
                .as_ref()
                .unwrap_or_else(|| panic!("no request body on {path}"));
            assert!(
                body.content
                    .contains_key("application/vnd.readium.lcp.license.v1.0+json"),
                "wrong media type on {path}"
            );
        }
    }

    #[test]
    fn basic_auth_scheme_registered() {
        let spec = StatusApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("basic_auth"));
    }
}
