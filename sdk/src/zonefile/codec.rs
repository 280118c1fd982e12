//! # Zone File Codec
//!
//! Just enough RFC 1035 master-file syntax to read and write the records
//! names actually publish: `$ORIGIN`, `$TTL` and `URI` records.
//!
//! ```text
//! $ORIGIN some-name.id
//! $TTL 3600
//! _http._tcp IN URI 10 1 "https://gaia.blockstack.org/hub/1ADDR/0/profile.json"
//! ```
//!
//! ## Leniency
//!
//! Lines the codec does not recognise (other record types, garbage) are
//! skipped. Historical zone files are sometimes raw JSON profiles, and those
//! have to come out of the parser as "no origin" rather than as an error so
//! the resolver can try the legacy format. A line only counts as a record
//! when it starts with a bare owner name, so JSON lines that happen to
//! contain `URI` are skipped too. A line that *is* recognisable as a
//! directive or a URI record but is broken still fails the whole parse.

use crate::config::ZONE_FILE_TTL;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

/// Errors produced while parsing or validating zone files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneFileError {
    #[error("malformed zone file at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("zone file has no $ORIGIN")]
    MissingOrigin,

    #[error("zone file has no URI record")]
    MissingUri,

    #[error(transparent)]
    InvalidParameter(#[from] crate::error::ParameterError),
}

/// One `URI` resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub priority: u16,
    pub weight: u16,
    pub target: String,
}

/// Everything the codec understood in a zone file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedZoneFile {
    #[serde(rename = "$origin", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(rename = "$ttl", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub uri: Vec<UriRecord>,
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

struct Line {
    tokens: Vec<String>,
    unterminated_quote: bool,
}

/// Split on whitespace, keeping quoted runs together and dropping `;` comments.
fn tokenize(raw: &str) -> Line {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quote = false;

    for ch in raw.chars() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                in_token = true;
            }
            ';' if !in_quote => break,
            c if c.is_whitespace() && !in_quote => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    Line {
        tokens,
        unterminated_quote: in_quote,
    }
}

/// Owner names are bare DNS labels (`@`, `*`, `_http._tcp`, `www`). Lines
/// starting with JSON punctuation or a quoted string never are.
fn has_owner_name(raw: &str, first: &str) -> bool {
    let quoted = raw.trim_start().starts_with('"');
    !quoted
        && first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | '*'))
}

fn is_class(token: &str) -> bool {
    matches!(token.to_ascii_uppercase().as_str(), "IN" | "CH" | "HS" | "CS")
}

// ---------------------------------------------------------------------------
// Parse / render
// ---------------------------------------------------------------------------

fn malformed(line: usize, reason: impl Into<String>) -> ZoneFileError {
    ZoneFileError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn parse_uri_record(line_no: usize, line: &Line, uri_at: usize) -> Result<UriRecord, ZoneFileError> {
    if line.unterminated_quote {
        return Err(malformed(line_no, "unterminated quote in URI record"));
    }
    let tokens = &line.tokens;

    let mut ttl = None;
    for token in &tokens[1..uri_at] {
        if let Ok(value) = token.parse::<u32>() {
            ttl = Some(value);
        } else if !is_class(token) {
            return Err(malformed(line_no, format!("unexpected token {token:?} before URI")));
        }
    }

    let rdata = &tokens[uri_at + 1..];
    let [priority, weight, target] = rdata else {
        return Err(malformed(
            line_no,
            format!("URI record needs priority, weight and target, got {} fields", rdata.len()),
        ));
    };
    let priority = priority
        .parse()
        .map_err(|_| malformed(line_no, format!("bad URI priority {priority:?}")))?;
    let weight = weight
        .parse()
        .map_err(|_| malformed(line_no, format!("bad URI weight {weight:?}")))?;

    Ok(UriRecord {
        name: tokens[0].clone(),
        ttl,
        priority,
        weight,
        target: target.clone(),
    })
}

/// Parse zone file text.
pub fn parse_zone_file(text: &str) -> Result<ParsedZoneFile, ZoneFileError> {
    let mut parsed = ParsedZoneFile::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = tokenize(raw);
        let Some(first) = line.tokens.first() else {
            continue;
        };

        if first.eq_ignore_ascii_case("$ORIGIN") {
            match line.tokens.as_slice() {
                [_, origin] => parsed.origin = Some(origin.clone()),
                _ => return Err(malformed(line_no, "$ORIGIN takes exactly one name")),
            }
        } else if first.eq_ignore_ascii_case("$TTL") {
            match line.tokens.as_slice() {
                [_, ttl] => {
                    let ttl = ttl
                        .parse()
                        .map_err(|_| malformed(line_no, format!("bad $TTL {ttl:?}")))?;
                    parsed.ttl = Some(ttl);
                }
                _ => return Err(malformed(line_no, "$TTL takes exactly one value")),
            }
        } else if !has_owner_name(raw, first) {
            continue;
        } else if let Some(uri_at) = line
            .tokens
            .iter()
            .skip(1)
            .position(|t| t.eq_ignore_ascii_case("URI"))
        {
            parsed.uri.push(parse_uri_record(line_no, &line, uri_at + 1)?);
        }
    }

    Ok(parsed)
}

/// Render in the `{$origin}\n{$ttl}\n{uri}\n` layout.
pub fn render_zone_file(zone: &ParsedZoneFile) -> String {
    let mut out = String::new();
    if let Some(origin) = &zone.origin {
        let _ = writeln!(out, "$ORIGIN {origin}");
    }
    if let Some(ttl) = zone.ttl {
        let _ = writeln!(out, "$TTL {ttl}");
    }
    for record in &zone.uri {
        let _ = write!(out, "{}", record.name);
        if let Some(ttl) = record.ttl {
            let _ = write!(out, " {ttl}");
        }
        let _ = writeln!(
            out,
            " IN URI {} {} \"{}\"",
            record.priority, record.weight, record.target
        );
    }
    out.push('\n');
    out
}

impl ParsedZoneFile {
    /// A single-URI zone file with the standard TTL.
    pub fn with_uri(origin: &str, record: UriRecord) -> Self {
        Self {
            origin: Some(origin.to_string()),
            ttl: Some(ZONE_FILE_TTL),
            uri: vec![record],
        }
    }
}
