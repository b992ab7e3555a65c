//! Status document rendering.
//!
//! A status document is the public view of a [`LicenseStatus`]: its state,
//! update times, a human-readable message, the links a reading application
//! follows to act on the license, the renewal bound and the event history.

use serde::{Deserialize, Serialize};

use lcp_core::license::{LICENSE_CONTENT_TYPE, STATUS_CONTENT_TYPE};
use lcp_core::{Link, Timestamp};

use crate::event::{StatusEvent, TransactionEvent};
use crate::status::{LicenseStatus, StatusKind, StatusPolicy};

/// Base URLs used to build status document links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkConfig {
    /// Public base URL of the status service.
    pub status_base_url: String,
    /// Public base URL of the issuer.
    pub issuer_base_url: String,
    /// Template of the `license` link; `{license_id}` is substituted.
    /// Defaults to `{issuer_base_url}/licenses/{license_id}`.
    pub license_link_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated {
    pub license: Timestamp,
    pub status: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialRights {
    pub end: Timestamp,
}

/// The status document served with `application/vnd.readium.license.status.v1.0+json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub id: String,
    pub status: StatusKind,
    pub updated: Updated,
    pub message: String,
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_rights: Option<PotentialRights>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<StatusEvent>,
}

impl StatusDocument {
    /// Render `status` with its events. `message` is already localized.
    pub fn render(
        status: &LicenseStatus,
        events: &[TransactionEvent],
        policy: &StatusPolicy,
        links: &LinkConfig,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: status.license_ref.clone(),
            status: status.status,
            updated: Updated {
                license: status.license_updated,
                status: status.status_updated,
            },
            message: message.into(),
            links: build_links(status, policy, links),
            potential_rights: status
                .potential_rights_end
                .map(|end| PotentialRights { end }),
            events: events.iter().map(StatusEvent::from).collect(),
        }
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }
}

fn build_links(status: &LicenseStatus, policy: &StatusPolicy, cfg: &LinkConfig) -> Vec<Link> {
    let id = &status.license_ref;
    let license_href = match cfg.license_link_url.as_deref() {
        Some(template) if !template.is_empty() => template.replace("{license_id}", id),
        _ => format!("{}/licenses/{id}", cfg.issuer_base_url.trim_end_matches('/')),
    };
    let base = format!("{}/licenses/{id}", cfg.status_base_url.trim_end_matches('/'));

    let mut links = vec![Link {
        media_type: Some(LICENSE_CONTENT_TYPE.to_string()),
        ..Link::new("license", license_href)
    }];
    let has_end = status.current_end_license.is_some();
    if policy.register {
        links.push(templated("register", format!("{base}/register{{?id,name}}")));
    }
    if policy.return_ && has_end {
        links.push(templated("return", format!("{base}/return{{?id,name}}")));
    }
    if policy.renew && has_end {
        links.push(templated("renew", format!("{base}/renew{{?end,id,name}}")));
    }
    links
}

fn templated(rel: &str, href: String) -> Link {
    Link {
        media_type: Some(STATUS_CONTENT_TYPE.to_string()),
        templated: Some(true),
        ..Link::new(rel, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DeviceInfo, EventType};

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    fn record(end: Option<Timestamp>) -> LicenseStatus {
        LicenseStatus {
            license_ref: "lic-1".into(),
            status: StatusKind::Active,
            device_count: 1,
            potential_rights_end: end,
            current_end_license: end,
            status_updated: ts(200),
            license_updated: ts(100),
        }
    }

    fn links() -> LinkConfig {
        LinkConfig {
            status_base_url: "http://lsd.example/".into(),
            issuer_base_url: "http://lcp.example".into(),
            license_link_url: None,
        }
    }

    #[test]
    fn loan_document_has_all_links() {
        let events = vec![TransactionEvent::new(
            "lic-1",
            &DeviceInfo::new("d1", "reader"),
            EventType::Register,
            ts(150),
        )];
        let doc = StatusDocument::render(
            &record(Some(ts(1_000))),
            &events,
            &StatusPolicy::default(),
            &links(),
            "Your license is active.",
        );
        assert_eq!(doc.link("license").unwrap().href, "http://lcp.example/licenses/lic-1");
        assert_eq!(
            doc.link("register").unwrap().href,
            "http://lsd.example/licenses/lic-1/register{?id,name}"
        );
        assert_eq!(
            doc.link("renew").unwrap().href,
            "http://lsd.example/licenses/lic-1/renew{?end,id,name}"
        );
        assert_eq!(doc.link("return").unwrap().templated, Some(true));

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["id"], "lic-1");
        assert_eq!(v["status"], "active");
        assert_eq!(v["updated"]["license"], "1970-01-01T00:01:40Z");
        assert_eq!(v["potential_rights"]["end"], "1970-01-01T00:16:40Z");
        assert_eq!(v["events"][0]["type"], "register");
        assert_eq!(v["links"][0]["type"], LICENSE_CONTENT_TYPE);
        assert!(v.get("device_count").is_none());
    }

    #[test]
    fn purchase_document_has_no_return_or_renew() {
        let doc = StatusDocument::render(
            &record(None),
            &[],
            &StatusPolicy::default(),
            &links(),
            "",
        );
        assert!(doc.link("return").is_none());
        assert!(doc.link("renew").is_none());
        assert!(doc.link("register").is_some());

        let v = serde_json::to_value(&doc).unwrap();
        assert!(v.get("potential_rights").is_none());
        assert!(v.get("events").is_none());
    }

    #[test]
    fn license_link_template_and_disabled_features() {
        let cfg = LinkConfig {
            license_link_url: Some("https://cms.example/lic/{license_id}.lcpl".into()),
            ..links()
        };
        let policy = StatusPolicy {
            register: false,
            renew: false,
            return_: false,
            ..StatusPolicy::default()
        };
        let doc = StatusDocument::render(&record(Some(ts(1_000))), &[], &policy, &cfg, "");
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].href, "https://cms.example/lic/lic-1.lcpl");
    }
}
