use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Header metadata wire format
// ---------------------------------------------------------------------------
//
// The published comment body is:
//
//   <!-- cfnpr {"workflow":"preview","version":"0.1.0"} -->
//   <visible markdown>
//
// The HTML comment renders invisibly on the PR and is the only state the
// tool keeps between CI runs. Everything outside this module sees only the
// decoded header map and body string.

/// Headers carried on a published comment.
pub type HeaderMap = BTreeMap<String, String>;

/// Matching criteria for locating a prior comment. `Some(v)` requires the
/// header to equal `v`; `None` requires the header to be absent.
pub type RequiredHeaders = BTreeMap<String, Option<String>>;

const MARKER: &str = "cfnpr";

fn header_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^(<!--.*?-->\r?\n)?(.*)$").expect("static regex"))
}

fn payload_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<!--\s*cfnpr\s+(?P<args>.*?)\s*-->").expect("static regex"))
}

/// Encode headers and body into the stored comment body.
pub fn encode_body(headers: &HeaderMap, body: &str) -> String {
    let payload = serde_json::to_string(headers).unwrap_or_else(|_| "{}".to_string());
    format!("<!-- {MARKER} {payload} -->\n{}\n", body.trim())
}

/// Decode a stored comment body into headers and trimmed visible body.
///
/// A leading HTML comment that isn't ours, or a marker with a malformed
/// payload, decodes to an empty header map — never an error. Legacy comments
/// with no metadata at all come back with empty headers and the full body.
pub fn decode_body(raw: &str) -> (HeaderMap, String) {
    let caps = match header_line_re().captures(raw) {
        Some(caps) => caps,
        None => return (HeaderMap::new(), raw.trim().to_string()),
    };

    let headers = caps
        .get(1)
        .and_then(|line| payload_re().captures(line.as_str()))
        .and_then(|p| serde_json::from_str::<HeaderMap>(&p["args"]).ok())
        .unwrap_or_default();

    let body = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
    (headers, body)
}

/// Does a comment's header map satisfy the required headers?
///
/// Extra headers on the comment are ignored; a `None` requirement means the
/// key must be absent.
pub fn matching_headers(headers: &HeaderMap, required: &RequiredHeaders) -> bool {
    required.iter().all(|(key, want)| match want {
        Some(value) => headers.get(key) == Some(value),
        None => !headers.contains_key(key),
    })
}

// ---------------------------------------------------------------------------
// PrComment
// ---------------------------------------------------------------------------

/// The single tracked comment for a pull request. `comment_url` is `None`
/// until first publish; the remote comment body is the source of truth
/// between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrComment {
    pub issue_url: String,
    pub comment_url: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl PrComment {
    /// A comment that doesn't exist remotely yet, carrying the non-null
    /// entries of the headers it will be published with.
    pub fn unsaved(issue_url: impl Into<String>, required: &RequiredHeaders) -> Self {
        let headers = required
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect();
        Self {
            issue_url: issue_url.into(),
            comment_url: None,
            headers,
            body: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
