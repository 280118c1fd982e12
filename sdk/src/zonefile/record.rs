//! The validated, single-URI view of a profile zone file.

use crate::config::{
    TOKEN_FILE_URI_NAME, TOKEN_FILE_URI_PRIORITY, TOKEN_FILE_URI_WEIGHT, ZONE_FILE_TTL,
};
use crate::error::ParameterError;
use crate::zonefile::codec::{
    parse_zone_file, render_zone_file, ParsedZoneFile, UriRecord, ZoneFileError,
};
use reqwest::Url;

/// Prefix `https://` onto a URL that has no scheme separator.
pub fn with_default_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Token file URL from the first URI record, scheme defaulted to https.
pub fn token_file_url(zone: &ParsedZoneFile) -> Option<String> {
    zone.uri
        .first()
        .map(|record| record.target.trim())
        .filter(|target| !target.is_empty())
        .map(with_default_scheme)
}

/// A name's routing record: origin, TTL and one `_http._tcp` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneFileRecord {
    origin: String,
    ttl: u32,
    uri: UriRecord,
}

fn validate_origin(origin: &str) -> Result<(), ParameterError> {
    if origin.is_empty() || !origin.contains('.') {
        return Err(ParameterError::new(
            "origin",
            "must be a fully qualified name containing '.'",
            origin,
        ));
    }
    Ok(())
}

fn normalize_target(url: &str) -> Result<String, ParameterError> {
    let normalized = with_default_scheme(url.trim());
    let parsed = Url::parse(&normalized)
        .map_err(|e| ParameterError::new("token_file_url", format!("not a URL: {e}"), url))?;
    match parsed.host_str() {
        Some(host) if host.contains('.') => Ok(normalized),
        _ => Err(ParameterError::new(
            "token_file_url",
            "hostname must contain '.'",
            url,
        )),
    }
}

impl ZoneFileRecord {
    /// Build the record a name owner publishes.
    ///
    /// `token_file_url` may omit its scheme, in which case `https://` is used.
    pub fn new(origin: &str, token_file_url: &str) -> Result<Self, ZoneFileError> {
        validate_origin(origin)?;
        let target = normalize_target(token_file_url)?;
        Ok(Self {
            origin: origin.to_string(),
            ttl: ZONE_FILE_TTL,
            uri: UriRecord {
                name: TOKEN_FILE_URI_NAME.to_string(),
                ttl: None,
                priority: TOKEN_FILE_URI_PRIORITY,
                weight: TOKEN_FILE_URI_WEIGHT,
                target,
            },
        })
    }

    /// Parse and validate zone file text fetched from the network.
    pub fn from_text(text: &str) -> Result<Self, ZoneFileError> {
        let parsed = parse_zone_file(text)?;
        let origin = parsed.origin.clone().ok_or(ZoneFileError::MissingOrigin)?;
        let mut uri = parsed.uri.into_iter().next().ok_or(ZoneFileError::MissingUri)?;

        validate_origin(&origin)?;
        uri.target = normalize_target(&uri.target)?;
        Ok(Self {
            origin,
            ttl: parsed.ttl.unwrap_or(ZONE_FILE_TTL),
            uri,
        })
    }

    pub fn to_text(&self) -> String {
        render_zone_file(&ParsedZoneFile {
            origin: Some(self.origin.clone()),
            ttl: Some(self.ttl),
            uri: vec![self.uri.clone()],
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn uri(&self) -> &UriRecord {
        &self.uri
    }

    pub fn token_file_url(&self) -> &str {
        &self.uri.target
    }
}

/// Zone file text pointing `origin` at `token_file_url`.
pub fn make_profile_zone_file(origin: &str, token_file_url: &str) -> Result<String, ZoneFileError> {
    Ok(ZoneFileRecord::new(origin, token_file_url)?.to_text())
}
