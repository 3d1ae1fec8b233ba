use crate::api::GithubClient;
use crate::error::{GithubError, Result};
use cfnpr_core::comment::{decode_body, encode_body, matching_headers, PrComment, RequiredHeaders};
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find the tracked comment for a pull request, or synthesize a
/// not-yet-created one.
///
/// Pages through every comment on the issue, keeping only those written by
/// `username`. Comments with no decodable headers (legacy or foreign) are
/// never matched. The `version` header is written on every upsert but is not
/// a matching criterion, so callers must not put it in `required`.
pub async fn find_comment(
    gh: &GithubClient,
    issue_url: &str,
    username: &str,
    required: &RequiredHeaders,
) -> Result<PrComment> {
    debug!("searching for comment with headers {required:?}");
    let url = format!("{issue_url}/comments");

    for payload in gh.paged_get(&url, &[]).await? {
        if payload.pointer("/user/login").and_then(Value::as_str) != Some(username) {
            continue;
        }
        let body = payload.get("body").and_then(Value::as_str).unwrap_or("");
        let (headers, body) = decode_body(body);

        if headers.is_empty() {
            continue;
        }
        if !matching_headers(&headers, required) {
            debug!("skipping comment with headers {headers:?}");
            continue;
        }

        let comment_url = payload
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| GithubError::Shape {
                url: url.clone(),
                detail: "comment without url".to_string(),
            })?
            .to_string();
        debug!("found existing comment {comment_url}");
        return Ok(PrComment {
            issue_url: issue_url.to_string(),
            comment_url: Some(comment_url),
            headers,
            body,
        });
    }

    debug!("no existing comment for {issue_url}");
    Ok(PrComment::unsaved(issue_url, required))
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

/// Publish `new_body` as the tracked comment: update in place when the
/// comment already exists, otherwise create it and capture the new URL.
///
/// Always stamps the current tool version into the headers; every other
/// existing header is kept. A non-2xx response propagates — the comment is
/// the sole visible result of the run, so there is no fallback.
pub async fn upsert(gh: &GithubClient, comment: &mut PrComment, new_body: &str) -> Result<()> {
    let mut headers = comment.headers.clone();
    headers.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    let payload = serde_json::json!({ "body": encode_body(&headers, new_body) });

    match &comment.comment_url {
        Some(url) => {
            gh.patch(url, &payload).await?;
        }
        None => {
            let create_url = format!("{}/comments", comment.issue_url);
            let resp = gh.post(&create_url, &payload).await?;
            let url = resp
                .get("url")
                .and_then(Value::as_str)
                .ok_or_else(|| GithubError::Shape {
                    url: create_url,
                    detail: "created comment carried no url".to_string(),
                })?;
            comment.comment_url = Some(url.to_string());
        }
    }

    comment.headers = headers;
    comment.body = new_body.trim().to_string();
    Ok(())
}
