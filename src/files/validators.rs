//! Cache validators and the 304 header allow-list.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use http::header::{
    CACHE_CONTROL, CONTENT_LOCATION, DATE, ETAG, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, VARY,
};
use http::{HeaderMap, HeaderName};
use sha2::{Digest, Sha256};

/// Headers kept on a `304 Not Modified` response.
pub const NOT_MODIFIED_HEADERS: [HeaderName; 6] = [
    CACHE_CONTROL,
    CONTENT_LOCATION,
    DATE,
    ETAG,
    EXPIRES,
    VARY,
];

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Quoted entity tag for a file with the given modification time and size.
pub fn etag_for(modified: SystemTime, size: u64) -> String {
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let digest = Sha256::digest(format!("{}-{}", nanos, size).as_bytes());
    format!("\"{}\"", hex::encode(&digest[..16]))
}

/// Format a time as an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Compare the validators of a full response with those sent by the client.
///
/// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
/// when it is absent.
pub fn is_not_modified(response_headers: &HeaderMap, request_headers: &HeaderMap) -> bool {
    if let Some(if_none_match) = request_headers.get(IF_NONE_MATCH) {
        let (Ok(if_none_match), Some(etag)) = (
            if_none_match.to_str(),
            response_headers.get(ETAG).and_then(|v| v.to_str().ok()),
        ) else {
            return false;
        };

        return if_none_match
            .split(',')
            .map(|tag| tag.trim())
            .map(|tag| tag.strip_prefix("W/").unwrap_or(tag))
            .any(|tag| tag == "*" || tag == etag);
    }

    let if_modified_since = request_headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date);
    let last_modified = response_headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date);

    match (if_modified_since, last_modified) {
        (Some(since), Some(modified)) => modified <= since,
        _ => false,
    }
}

/// Reduce a full response header set to the ones allowed on a 304.
pub fn not_modified_headers(headers: &HeaderMap) -> HeaderMap {
    let mut kept = HeaderMap::new();
    for (name, value) in headers {
        if NOT_MODIFIED_HEADERS.contains(name) {
            kept.append(name.clone(), value.clone());
        }
    }
    kept
}
