//! # Proof Services
//!
//! Each social network that can host a proof is a [`ProofService`]: it
//! knows which URLs are acceptable proof locations for an identifier and
//! how to dig the statement (and, for some, the account name) out of the
//! fetched page.
//!
//! | Service      | Proof URL rule                            | Statement from     |
//! |--------------|-------------------------------------------|--------------------|
//! | `facebook`   | `facebook.com/{id}` prefix                | `og:description`   |
//! | `github`     | `gist.github.com/{id}` prefix, + `/raw`   | raw gist body      |
//! | `hackerNews` | exactly `news.ycombinator.com/user?id={id}` | page body        |
//! | `instagram`  | `www.instagram.com/` prefix               | `og:description`   |
//! | `linkedIn`   | `www.linkedin.com/feed/update/` prefix    | page body          |
//! | `twitter`    | `twitter.com/{id}` prefix                 | `og:description`   |
//!
//! Page scraping is limited to `<meta property="og:description">`.

use crate::proofs::Proof;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof url {url} is not valid for service {service}")]
    InvalidProofUrl { url: String, service: String },
}

/// Upgrade to `https://`, adding the scheme when missing.
pub fn prefix_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else if url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// `content` of the first `<meta property="og:description">` tag.
pub fn og_description(html: &str) -> Option<String> {
    let mut rest = html;
    while let Some(start) = rest.find("<meta") {
        let tag_start = &rest[start..];
        let end = tag_start.find('>')?;
        let tag = &tag_start[..end];
        if attribute(tag, "property").as_deref() == Some("og:description") {
            return attribute(tag, "content");
        }
        rest = &tag_start[end..];
    }
    None
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let needle = format!("{name}={quote}");
        if let Some(at) = tag.find(&needle) {
            let value = &tag[at + needle.len()..];
            let close = value.find(quote)?;
            return Some(value[..close].to_string());
        }
    }
    None
}

fn strip_curly_quotes(statement: &str) -> String {
    statement
        .trim()
        .replacen('\u{201c}', "", 1)
        .replacen('\u{201d}', "", 1)
}

/// Capabilities of a proof-hosting service.
pub trait ProofService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prefixes a proof URL may start with, before the identifier.
    fn base_urls(&self) -> &'static [&'static str];

    /// The URL to fetch for `proof`, or why it cannot be a proof location.
    fn proof_url(&self, proof: &Proof) -> Result<String, ProofError> {
        let url = prefix_scheme(&proof.proof_url.to_lowercase());
        let matches = self.base_urls().iter().any(|base| {
            url.starts_with(&format!("{base}{}", proof.identifier).to_lowercase())
        });
        if matches {
            Ok(url)
        } else {
            Err(self.invalid(proof))
        }
    }

    /// Account name shown on the fetched page.
    fn proof_identity(&self, body: &str) -> String {
        body.to_string()
    }

    fn proof_statement(&self, body: &str) -> String {
        body.to_string()
    }

    /// Whether the page must name the account before its statement counts.
    fn should_validate_identity_in_body(&self) -> bool {
        false
    }

    fn invalid(&self, proof: &Proof) -> ProofError {
        ProofError::InvalidProofUrl {
            url: proof.proof_url.clone(),
            service: self.name().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

pub struct Facebook;

impl ProofService for Facebook {
    fn name(&self) -> &'static str {
        "facebook"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://facebook.com/", "https://www.facebook.com/"]
    }

    fn proof_statement(&self, body: &str) -> String {
        og_description(body)
            .map(|s| strip_curly_quotes(&s))
            .unwrap_or_default()
    }
}

pub struct Github;

impl ProofService for Github {
    fn name(&self) -> &'static str {
        "github"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://gist.github.com/"]
    }

    /// Gists are fetched in raw form.
    fn proof_url(&self, proof: &Proof) -> Result<String, ProofError> {
        let url = prefix_scheme(&proof.proof_url.to_lowercase());
        let prefix = format!("{}{}", self.base_urls()[0], proof.identifier).to_lowercase();
        if !url.starts_with(&prefix) {
            return Err(self.invalid(proof));
        }
        let raw = if url.ends_with('/') { "raw" } else { "/raw" };
        Ok(format!("{url}{raw}"))
    }
}

pub struct HackerNews;

impl ProofService for HackerNews {
    fn name(&self) -> &'static str {
        "hackerNews"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://news.ycombinator.com/user?id="]
    }

    /// Must be the profile page itself, nothing below it.
    fn proof_url(&self, proof: &Proof) -> Result<String, ProofError> {
        let url = prefix_scheme(&proof.proof_url.to_lowercase());
        if url == format!("{}{}", self.base_urls()[0], proof.identifier) {
            Ok(url)
        } else {
            Err(self.invalid(proof))
        }
    }
}

pub struct Instagram;

impl Instagram {
    fn normalize(url: &str) -> String {
        let url = prefix_scheme(url);
        match url.strip_prefix("https://instagram.com") {
            Some(rest) => format!("https://www.instagram.com{rest}"),
            None => url,
        }
    }
}

impl ProofService for Instagram {
    fn name(&self) -> &'static str {
        "instagram"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://www.instagram.com/"]
    }

    /// Post URLs do not contain the account name, so only the host is
    /// checked here and the account is checked against the page.
    fn proof_url(&self, proof: &Proof) -> Result<String, ProofError> {
        let url = Self::normalize(&proof.proof_url);
        if self.base_urls().iter().any(|base| url.starts_with(base)) {
            Ok(url)
        } else {
            Err(self.invalid(proof))
        }
    }

    /// `"... (@alice): ..."` → `alice`.
    fn proof_identity(&self, body: &str) -> String {
        let Some(description) = og_description(body) else {
            warn!("instagram page has no og:description");
            return String::new();
        };
        let head = description.split(':').next().unwrap_or_default();
        let inner = head
            .find('(')
            .and_then(|open| {
                let after = &head[open + 1..];
                after.find(')').map(|close| &after[..close])
            })
            .filter(|inner| !inner.is_empty());
        match inner {
            Some(handle) => handle.chars().skip(1).collect(),
            None => {
                warn!(description = head, "could not find an instagram handle");
                String::new()
            }
        }
    }

    fn proof_statement(&self, body: &str) -> String {
        og_description(body)
            .and_then(|d| d.split(':').nth(1).map(strip_curly_quotes))
            .unwrap_or_default()
    }

    fn should_validate_identity_in_body(&self) -> bool {
        true
    }
}

pub struct LinkedIn;

impl ProofService for LinkedIn {
    fn name(&self) -> &'static str {
        "linkedIn"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://www.linkedin.com/feed/update/"]
    }

    fn proof_url(&self, proof: &Proof) -> Result<String, ProofError> {
        let url = prefix_scheme(&proof.proof_url.to_lowercase());
        if self.base_urls().iter().any(|base| url.starts_with(base)) {
            Ok(url)
        } else {
            Err(self.invalid(proof))
        }
    }
}

pub struct Twitter;

impl ProofService for Twitter {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn base_urls(&self) -> &'static [&'static str] {
        &["https://twitter.com/"]
    }

    fn proof_statement(&self, body: &str) -> String {
        og_description(body)
            .map(|s| strip_curly_quotes(&s))
            .unwrap_or_default()
    }
}

/// Look a service up by the name used in profile `account` entries.
pub fn proof_service(name: &str) -> Option<&'static dyn ProofService> {
    match name {
        "facebook" => Some(&Facebook),
        "github" => Some(&Github),
        "hackerNews" => Some(&HackerNews),
        "instagram" => Some(&Instagram),
        "linkedIn" => Some(&LinkedIn),
        "twitter" => Some(&Twitter),
        _ => None,
    }
}
