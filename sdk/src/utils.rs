//! Small helpers shared across modules: expiry times, version comparison
//! and URL fiddling.

use crate::error::ParameterError;
use chrono::{DateTime, Duration, Months, Utc};
use reqwest::Url;

/// One calendar year from now.
pub fn next_year() -> DateTime<Utc> {
    let now = Utc::now();
    now.checked_add_months(Months::new(12))
        .unwrap_or(now + Duration::days(365))
}

/// One calendar month from now.
pub fn next_month() -> DateTime<Utc> {
    let now = Utc::now();
    now.checked_add_months(Months::new(1))
        .unwrap_or(now + Duration::days(30))
}

pub fn next_hour() -> DateTime<Utc> {
    Utc::now() + Duration::hours(1)
}

/// `true` if `v1 >= v2`, comparing dotted numeric versions component-wise.
///
/// Missing or non-numeric components count as zero, so `1.1` equals
/// `1.1.0`.
pub fn is_later_version(v1: &str, v2: &str) -> bool {
    fn components(version: &str) -> Vec<u64> {
        version
            .split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    }
    let (mut a, mut b) = (components(v1), components(v2));
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a >= b
}

/// Set `key=value` in the query string of `uri`, replacing the first
/// existing value (key matched case-insensitively) or appending it.
/// Keys and values are form-encoded.
pub fn update_query_string_parameter(
    uri: &str,
    key: &str,
    value: &str,
) -> Result<String, ParameterError> {
    let mut url = Url::parse(uri)
        .map_err(|e| ParameterError::new("uri", format!("not an absolute URL: {e}"), uri))?;

    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if !replaced && k.eq_ignore_ascii_case(key) {
                replaced = true;
                (key.to_string(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Ok(url.to_string())
}

/// Both URLs are absolute and share scheme, host and effective port.
pub fn is_same_origin_absolute_url(uri1: &str, uri2: &str) -> bool {
    let (Ok(a), Ok(b)) = (Url::parse(uri1), Url::parse(uri2)) else {
        return false;
    };
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
