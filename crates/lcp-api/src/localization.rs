//! # Localization
//!
//! Status document messages and problem titles in the configured
//! languages. The language of a response is negotiated from
//! `Accept-Language`; anything unsupported falls back to the configured
//! default.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use lcp_state::StatusKind;

use crate::config::LocalizationSection;
use crate::error::Problem;

/// A language with a message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Fr,
}

impl Language {
    /// Match a BCP 47 tag on its primary subtag (`fr-CA` → French).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?.trim().to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en-US",
            Self::Fr => "fr-FR",
        }
    }
}

// ─── Catalogs ────────────────────────────────────────────────────────

fn status_message(language: Language, status: StatusKind) -> &'static str {
    match (language, status) {
        (Language::En, StatusKind::Ready) => "The license is ready to be used",
        (Language::En, StatusKind::Active) => "The license is active",
        (Language::En, StatusKind::Returned) => "The license has been returned",
        (Language::En, StatusKind::Cancelled) => "The license has been cancelled",
        (Language::En, StatusKind::Revoked) => "The license has been revoked",
        (Language::En, StatusKind::Expired) => "The license has expired",
        (Language::Fr, StatusKind::Ready) => "La licence est prête à être utilisée",
        (Language::Fr, StatusKind::Active) => "La licence est active",
        (Language::Fr, StatusKind::Returned) => "La licence a été restituée",
        (Language::Fr, StatusKind::Cancelled) => "La licence a été annulée",
        (Language::Fr, StatusKind::Revoked) => "La licence a été révoquée",
        (Language::Fr, StatusKind::Expired) => "La licence a expiré",
    }
}

fn problem_title(language: Language, status: StatusCode) -> Option<&'static str> {
    match language {
        Language::En => status.canonical_reason(),
        Language::Fr => match status {
            StatusCode::BAD_REQUEST => Some("Requête incorrecte"),
            StatusCode::UNAUTHORIZED => Some("Non autorisé"),
            StatusCode::FORBIDDEN => Some("Interdit"),
            StatusCode::NOT_FOUND => Some("Introuvable"),
            StatusCode::INTERNAL_SERVER_ERROR => Some("Erreur interne du serveur"),
            other => other.canonical_reason(),
        },
    }
}

// ─── Localizer ───────────────────────────────────────────────────────

/// Languages a deployment serves and the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localizer {
    supported: Vec<Language>,
    default: Language,
}

impl Default for Localizer {
    fn default() -> Self {
        Self {
            supported: vec![Language::En],
            default: Language::En,
        }
    }
}

impl Localizer {
    /// Build from configuration; unknown language tags are skipped with a
    /// warning and an unknown default falls back to English.
    pub fn from_config(section: &LocalizationSection) -> Self {
        let mut supported = Vec::new();
        for tag in &section.languages {
            match Language::from_tag(tag) {
                Some(lang) if !supported.contains(&lang) => supported.push(lang),
                Some(_) => {}
                None => tracing::warn!(language = %tag, "no catalog for configured language"),
            }
        }
        let default = Language::from_tag(&section.default_language).unwrap_or(Language::En);
        if !supported.contains(&default) {
            supported.push(default);
        }
        Self { supported, default }
    }

    /// Pick the best supported language for an `Accept-Language` value.
    pub fn negotiate(&self, accept_language: Option<&str>) -> Language {
        let Some(header) = accept_language else {
            return self.default;
        };
        let mut ranges: Vec<(&str, f32)> = header
            .split(',')
            .filter_map(|item| {
                let mut parts = item.split(';');
                let tag = parts.next()?.trim();
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                (!tag.is_empty() && quality > 0.0).then_some((tag, quality))
            })
            .collect();
        // Stable: equal weights keep header order.
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranges
            .into_iter()
            .find_map(|(tag, _)| Language::from_tag(tag).filter(|l| self.supported.contains(l)))
            .unwrap_or(self.default)
    }

    /// Language negotiated from request headers.
    pub fn for_headers(&self, headers: &HeaderMap) -> Language {
        self.negotiate(
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        )
    }

    pub fn status_message(&self, language: Language, status: StatusKind) -> &'static str {
        status_message(language, status)
    }

    pub fn problem_title(&self, language: Language, status: StatusCode) -> String {
        problem_title(language, status)
            .unwrap_or_default()
            .to_string()
    }
}

// ─── Middleware ──────────────────────────────────────────────────────

/// Rewrite problem bodies with a localized title and the request path as
/// `instance`.
///
/// Responses carrying a [`Problem`] extension are re-rendered; every other
/// response passes through untouched.
pub async fn localize_problems(request: Request, next: Next) -> Response {
    let localizer = request
        .extensions()
        .get::<Localizer>()
        .cloned()
        .unwrap_or_default();
    let language = localizer.for_headers(request.headers());
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let Some(mut problem) = response.extensions().get::<Problem>().cloned() else {
        return response;
    };

    let status = StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    problem.title = localizer.problem_title(language, status);
    if problem.instance.is_none() {
        problem.instance = Some(path);
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(problem.clone());
    let body = serde_json::to_vec(&problem).unwrap_or_default();
    Response::from_parts(parts, Body::from(body))
}
