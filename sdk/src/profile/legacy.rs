//! # Legacy Person Format
//!
//! Before JSON-LD, profiles were flat objects keyed by service:
//!
//! ```json
//! {"name": {"formatted": "John Doe"}, "bio": "..", "twitter": {"username": "jdoe", "proof": {"url": ".."}}}
//! ```
//!
//! Some of these were written straight into zone files. [`lift_legacy_person`]
//! converts them into a [`ProfileDocument`]. The conversion is one way and
//! drops what has no JSON-LD counterpart (proof messages and signatures).
//!
//! Old profiles were hand-edited, so every field is read loosely: a field
//! with the wrong shape (`"name": "flat string"`) is treated as absent and
//! never fails the lift.

use crate::profile::document::{Account, Image, PostalAddress, ProfileDocument, WebSite};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const LEGACY_CONTEXT: &str = "http://schema.org/";

/// `Some` when the field has the expected shape, `None` otherwise.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Formatted {
    #[serde(default, deserialize_with = "lenient")]
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlRef {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BitcoinRef {
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialRef {
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub proof: Option<UrlRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthRef {
    #[serde(rename = "publicKeychain", default, deserialize_with = "lenient")]
    pub public_keychain: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PgpRef {
    #[serde(default, deserialize_with = "lenient")]
    pub fingerprint: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// The flat legacy shape. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonLegacy {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<Formatted>,
    #[serde(default, deserialize_with = "lenient")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Formatted>,
    #[serde(default, deserialize_with = "lenient")]
    pub avatar: Option<UrlRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub cover: Option<UrlRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bitcoin: Option<BitcoinRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub twitter: Option<SocialRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub facebook: Option<SocialRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub github: Option<SocialRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub auth: Option<Vec<AuthRef>>,
    #[serde(default, deserialize_with = "lenient")]
    pub pgp: Option<PgpRef>,
}

fn social_account(service: &str, social: &Option<SocialRef>) -> Option<Account> {
    let social = social.as_ref()?;
    let username = social.username.clone()?;
    Some(Account {
        service: Some(service.to_string()),
        identifier: Some(username),
        proof_type: Some("http".to_string()),
        proof_url: social.proof.as_ref().and_then(|p| p.url.clone()),
        ..Account::new()
    })
}

fn image(name: &str, source: &Option<UrlRef>) -> Option<Image> {
    let url = source.as_ref()?.url.as_deref()?;
    Some(Image::new(name, url))
}

/// Lift a legacy person into the JSON-LD model.
pub fn lift_legacy_person(legacy: &PersonLegacy) -> ProfileDocument {
    let mut person = ProfileDocument::person("");
    person.context = LEGACY_CONTEXT.to_string();

    person.name = legacy.name.as_ref().and_then(|n| n.formatted.clone());
    person.description = legacy.bio.clone();
    person.address = legacy.location.as_ref().map(|location| PostalAddress {
        type_: "PostalAddress".to_string(),
        address_locality: location.formatted.clone(),
        ..PostalAddress::default()
    });

    let images: Vec<Image> = [image("avatar", &legacy.avatar), image("cover", &legacy.cover)]
        .into_iter()
        .flatten()
        .collect();
    if !images.is_empty() {
        person.image = Some(images);
    }

    person.website = legacy.website.as_deref().map(|url| vec![WebSite::new(url)]);

    let mut accounts = Vec::new();
    if let Some(address) = legacy.bitcoin.as_ref().and_then(|b| b.address.clone()) {
        accounts.push(Account {
            service: Some("bitcoin".to_string()),
            identifier: Some(address),
            role: Some("payment".to_string()),
            ..Account::new()
        });
    }
    accounts.extend(social_account("twitter", &legacy.twitter));
    accounts.extend(social_account("facebook", &legacy.facebook));
    accounts.extend(social_account("github", &legacy.github));
    if let Some(keychain) = legacy
        .auth
        .as_ref()
        .and_then(|auth| auth.first())
        .and_then(|first| first.public_keychain.clone())
    {
        accounts.push(Account {
            service: Some("bip32".to_string()),
            identifier: Some(keychain),
            role: Some("key".to_string()),
            ..Account::new()
        });
    }
    if let Some(PgpRef {
        fingerprint: Some(fingerprint),
        url: Some(url),
    }) = &legacy.pgp
    {
        accounts.push(Account {
            service: Some("pgp".to_string()),
            identifier: Some(fingerprint.clone()),
            role: Some("key".to_string()),
            content_url: Some(url.clone()),
            ..Account::new()
        });
    }
    if !accounts.is_empty() {
        person.account = Some(accounts);
    }

    person
}

/// Parse legacy JSON text and lift it.
///
/// Fails only when `text` is not JSON. JSON that is not an object lifts to
/// a bare person.
pub fn person_from_legacy_json(text: &str) -> Result<ProfileDocument, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let legacy = match value {
        Value::Object(_) => serde_json::from_value(value)?,
        _ => PersonLegacy::default(),
    };
    Ok(lift_legacy_person(&legacy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_legacy_profile() {
        let text = json!({
            "name": {"formatted": "John Doe"},
            "bio": "Bitcoin developer",
            "location": {"formatted": "New York"},
            "avatar": {"url": "https://s3.example/avatar.png"},
            "cover": {"url": "https://s3.example/cover.png"},
            "website": "https://johndoe.example",
            "bitcoin": {"address": "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U"},
            "twitter": {"username": "jdoe", "proof": {"url": "https://twitter.com/jdoe/status/1"}},
            "github": {"username": "jdoe"},
            "auth": [{"publicKeychain": "xpub661MyMwAqRbcF"}],
            "pgp": {"fingerprint": "DEADBEEF", "url": "https://keys.example/jdoe.asc"},
            "v": "0.2"
        })
        .to_string();

        let person = person_from_legacy_json(&text).unwrap();
        assert_eq!(person.context, "http://schema.org/");
        assert_eq!(person.type_, "Person");
        assert_eq!(person.id, "");
        assert_eq!(person.name.as_deref(), Some("John Doe"));
        assert_eq!(person.description.as_deref(), Some("Bitcoin developer"));
        assert_eq!(
            person.address.as_ref().unwrap().address_locality.as_deref(),
            Some("New York")
        );
        assert_eq!(person.avatar_url(), Some("https://s3.example/avatar.png"));
        assert_eq!(person.image.as_ref().unwrap().len(), 2);
        assert_eq!(
            person.website.as_ref().unwrap()[0].url.as_deref(),
            Some("https://johndoe.example")
        );

        let accounts = person.account.unwrap();
        let services: Vec<&str> = accounts
            .iter()
            .filter_map(|a| a.service.as_deref())
            .collect();
        assert_eq!(services, ["bitcoin", "twitter", "github", "bip32", "pgp"]);
        assert_eq!(accounts[0].role.as_deref(), Some("payment"));
        assert_eq!(
            accounts[1].proof_url.as_deref(),
            Some("https://twitter.com/jdoe/status/1")
        );
        assert_eq!(accounts[2].proof_type.as_deref(), Some("http"));
        assert_eq!(accounts[2].proof_url, None);
        assert_eq!(
            accounts[4].content_url.as_deref(),
            Some("https://keys.example/jdoe.asc")
        );
    }

    #[test]
    fn test_empty_object_is_a_bare_person() {
        let person = person_from_legacy_json("{}").unwrap();
        assert_eq!(person.type_, "Person");
        assert!(person.name.is_none());
        assert!(person.account.is_none());
        assert!(person.image.is_none());
    }

    #[test]
    fn test_only_non_json_fails() {
        assert!(person_from_legacy_json("").is_err());
        assert!(person_from_legacy_json("$ORIGIN nope").is_err());
        assert!(person_from_legacy_json("{\"name\": ").is_err());

        let person = person_from_legacy_json("[1, 2]").unwrap();
        assert_eq!(person.type_, "Person");
        assert!(person.name.is_none());
    }

    #[test]
    fn test_wrongly_shaped_fields_are_skipped() {
        let person = person_from_legacy_json(r#"{"name": "flat string", "bio": "b"}"#).unwrap();
        assert!(person.name.is_none());
        assert_eq!(person.description.as_deref(), Some("b"));

        let text = json!({
            "name": {"formatted": 42},
            "location": "New York",
            "avatar": {"url": "https://s3.example/a.png"},
            "cover": "https://s3.example/c.png",
            "website": {"url": "https://x.example"},
            "bitcoin": "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U",
            "twitter": {"username": "jdoe", "proof": "https://twitter.com/jdoe/status/1"},
            "github": {"username": ["jdoe"]},
            "auth": {"publicKeychain": "xpub"},
            "pgp": null
        })
        .to_string();
        let person = person_from_legacy_json(&text).unwrap();
        assert!(person.name.is_none());
        assert!(person.address.is_none());
        assert!(person.website.is_none());
        assert_eq!(person.image.as_ref().unwrap().len(), 1);
        assert_eq!(person.avatar_url(), Some("https://s3.example/a.png"));

        let accounts = person.account.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].service.as_deref(), Some("twitter"));
        assert_eq!(accounts[0].proof_url, None);
    }

    #[test]
    fn test_pgp_needs_both_fields() {
        let person = person_from_legacy_json(r#"{"pgp": {"fingerprint": "AB"}}"#).unwrap();
        assert!(person.account.is_none());
    }
}
