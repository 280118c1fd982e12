//! # Profile Documents
//!
//! schema.org JSON-LD, the shape every current client publishes:
//!
//! ```json
//! {
//!   "@context": "http://schema.org",
//!   "@type": "Person",
//!   "@id": "some-name.id",
//!   "name": "John Doe",
//!   "account": [{"@type": "Account", "service": "github", "identifier": "jdoe", ...}],
//!   "apps": {"https://app.example": "https://gaia.example/hub/1ADDR/"}
//! }
//! ```
//!
//! Known fields are typed; anything else survives a round trip through
//! `extra`. The accessor methods are the ones wallets use to render a
//! profile card.

use crate::proofs::Proof;
use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SCHEMA_ORG_CONTEXT: &str = "http://schema.org";
pub const PERSON_TYPE: &str = "Person";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(rename = "@type", default = "image_type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn image_type() -> String {
    "ImageObject".to_string()
}

impl Image {
    pub fn new(name: &str, content_url: &str) -> Self {
        Self {
            type_: image_type(),
            name: Some(name.to_string()),
            content_url: Some(content_url.to_string()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSite {
    #[serde(rename = "@type", default = "website_type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn website_type() -> String {
    "WebSite".to_string()
}

impl WebSite {
    pub fn new(url: &str) -> Self {
        Self {
            type_: website_type(),
            url: Some(url.to_string()),
        }
    }
}

/// A linked account: social profile, payment address or key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "@type", default = "account_type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn account_type() -> String {
    "Account".to_string()
}

impl Account {
    /// An empty `Account` with the right `@type`.
    pub fn new() -> Self {
        Self {
            type_: account_type(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(rename = "@type", default = "postal_address_type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_country: Option<String>,
}

fn postal_address_type() -> String {
    "PostalAddress".to_string()
}

/// Minimal schema.org `Thing` for `knows` / `worksFor` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// ProfileDocument
// ---------------------------------------------------------------------------

/// A JSON-LD profile. `@context` and `@type` are required; `@id` defaults
/// to empty because legacy-lifted profiles have no better value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<Image>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<Vec<WebSite>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Vec<Account>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_for: Option<Vec<Thing>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knows: Option<Vec<Thing>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "taxID", skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// App origin to storage bucket URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apps: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileDocument {
    /// An empty `Person` with the given `@id`.
    pub fn person(id: &str) -> Self {
        Self {
            context: SCHEMA_ORG_CONTEXT.to_string(),
            type_: PERSON_TYPE.to_string(),
            id: id.to_string(),
            name: None,
            given_name: None,
            family_name: None,
            description: None,
            image: None,
            website: None,
            account: None,
            works_for: None,
            knows: None,
            address: None,
            birth_date: None,
            tax_id: None,
            apps: None,
            extra: Map::new(),
        }
    }

    /// Serialize back to JSON. Fails only if an `extra` value cannot be
    /// represented, which the caller should surface rather than drop.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn is_person(&self) -> bool {
        self.type_ == PERSON_TYPE
    }

    /// `name`, or given and family name joined.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        match (&self.given_name, &self.family_name) {
            (None, None) => None,
            (given, family) => {
                let parts: Vec<&str> = [given.as_deref(), family.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .collect();
                Some(parts.join(" "))
            }
        }
    }

    /// `givenName`, else everything but the last word of `name`.
    pub fn given_name(&self) -> Option<String> {
        if let Some(given) = self.given_name.as_ref().filter(|s| !s.is_empty()) {
            return Some(given.clone());
        }
        let name = self.name.as_ref()?;
        let words: Vec<&str> = name.split(' ').collect();
        Some(words[..words.len() - 1].join(" "))
    }

    /// `familyName`, else the last word of `name`.
    pub fn family_name(&self) -> Option<String> {
        if let Some(family) = &self.family_name {
            return Some(family.clone());
        }
        self.name
            .as_ref()
            .and_then(|name| name.split(' ').last())
            .map(str::to_string)
    }

    /// `contentUrl` of the image named `avatar`.
    pub fn avatar_url(&self) -> Option<&str> {
        self.image
            .as_ref()?
            .iter()
            .find(|image| image.name.as_deref() == Some("avatar"))
            .and_then(|image| image.content_url.as_deref())
    }

    /// Accounts backed by a valid proof with the same service, identifier
    /// and proof URL.
    pub fn verified_accounts(&self, proofs: &[Proof]) -> Vec<Account> {
        let Some(accounts) = &self.account else {
            return Vec::new();
        };
        accounts
            .iter()
            .filter(|account| {
                proofs.iter().any(|proof| {
                    proof.valid
                        && account.service.as_deref() == Some(proof.service.as_str())
                        && account.identifier.as_deref() == Some(proof.identifier.as_str())
                        && account.proof_url.as_deref() == Some(proof.proof_url.as_str())
                })
            })
            .cloned()
            .collect()
    }

    /// Street, locality, postal code and country joined with `, `.
    pub fn formatted_address(&self) -> Option<String> {
        let address = self.address.as_ref()?;
        let parts: Vec<&str> = [
            &address.street_address,
            &address.address_locality,
            &address.postal_code,
            &address.address_country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// `birthDate` as `"January 2, 1990"`. Accepts plain dates and RFC 3339.
    pub fn formatted_birth_date(&self) -> Option<String> {
        let raw = self.birth_date.as_deref()?;
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))?;
        let month = MONTH_NAMES[date.month0() as usize];
        Some(format!("{month} {}, {}", date.day(), date.year()))
    }

    pub fn connections(&self) -> &[Thing] {
        self.knows.as_deref().unwrap_or_default()
    }

    pub fn organizations(&self) -> &[Thing] {
        self.works_for.as_deref().unwrap_or_default()
    }

    /// Storage bucket URL this profile advertises for `app_origin`.
    pub fn app_bucket_url(&self, app_origin: &str) -> Option<&str> {
        self.apps.as_ref()?.get(app_origin).map(String::as_str)
    }
}
