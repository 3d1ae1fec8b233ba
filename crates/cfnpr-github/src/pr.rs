use crate::api::GithubClient;
use crate::error::{GithubError, Result};
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// CiEvent
// ---------------------------------------------------------------------------

/// The identity of the CI run, read from the CodeBuild environment.
#[derive(Debug, Clone)]
pub struct CiEvent {
    /// `owner/repo`, stripped of the clone-URL scheme and `.git` suffix.
    pub repo: String,
    pub event_type: String,
    pub trigger: Option<String>,
    pub commit: Option<String>,
}

impl CiEvent {
    pub fn from_env() -> Result<Self> {
        let repo_url = std::env::var("CODEBUILD_SOURCE_REPO_URL")
            .map_err(|_| GithubError::MissingEnv("CODEBUILD_SOURCE_REPO_URL".to_string()))?;
        Ok(Self {
            repo: repo_slug(&repo_url),
            event_type: std::env::var("CODEBUILD_WEBHOOK_EVENT").unwrap_or_else(|_| "PUSH".to_string()),
            trigger: std::env::var("CODEBUILD_WEBHOOK_TRIGGER").ok(),
            commit: std::env::var("CODEBUILD_RESOLVED_SOURCE_VERSION").ok(),
        })
    }
}

fn repo_slug(clone_url: &str) -> String {
    clone_url
        .trim_start_matches("https://github.com/")
        .trim_end_matches(".git")
        .to_string()
}

// ---------------------------------------------------------------------------
// PR resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRefs {
    pub pr_url: String,
    pub issue_url: String,
}

/// Resolve which pull request this CI run belongs to.
///
/// Webhook builds for `PULL_REQUEST_*` events carry the PR number in the
/// trigger (`pr/123`). Push builds scan the repo's pull requests for one
/// whose merge commit matches the built commit. Anything else — or a push
/// with no matching PR — is an explicit error, handled by the caller.
pub async fn find_pr(gh: &GithubClient, event: &CiEvent) -> Result<PrRefs> {
    if event.event_type.starts_with("PULL_REQUEST_") {
        let trigger = event
            .trigger
            .as_deref()
            .ok_or_else(|| GithubError::MissingEnv("CODEBUILD_WEBHOOK_TRIGGER".to_string()))?;
        let number = trigger.rsplit('/').next().unwrap_or(trigger);
        return Ok(PrRefs {
            pr_url: format!("{}/repos/{}/pulls/{number}", gh.api_base(), event.repo),
            issue_url: format!("{}/repos/{}/issues/{number}", gh.api_base(), event.repo),
        });
    }

    if event.event_type == "PUSH" {
        let commit = event.commit.as_deref().unwrap_or("unknown");
        let url = format!("{}/repos/{}/pulls", gh.api_base(), event.repo);
        for pr in gh.paged_get(&url, &[("state", "all")]).await? {
            if pr.get("merge_commit_sha").and_then(Value::as_str) == Some(commit) {
                debug!("commit {commit} belongs to {}", pr["url"]);
                let pr_url = str_at(&pr, "/url", &url)?;
                let issue_url = str_at(&pr, "/_links/issue/href", &url)?;
                return Ok(PrRefs { pr_url, issue_url });
            }
        }
        return Err(GithubError::NoPullRequest(format!(
            "no PR found in {} for commit {commit} (was it pushed directly to the target branch?)",
            event.repo
        )));
    }

    Err(GithubError::UnrelatedEvent(event.event_type.clone()))
}

fn str_at(value: &Value, pointer: &str, url: &str) -> Result<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GithubError::Shape {
            url: url.to_string(),
            detail: format!("missing {pointer}"),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_slug_strips_scheme_and_suffix() {
        assert_eq!(
            repo_slug("https://github.com/acme/aws-users.git"),
            "acme/aws-users"
        );
        assert_eq!(repo_slug("acme/aws-users"), "acme/aws-users");
    }

    #[tokio::test]
    async fn webhook_event_parses_pr_number_from_trigger() {
        let gh = GithubClient::with_base("t", "https://api.github.com");
        let event = CiEvent {
            repo: "acme/aws-users".to_string(),
            event_type: "PULL_REQUEST_UPDATED".to_string(),
            trigger: Some("pr/123".to_string()),
            commit: Some("abc".to_string()),
        };
        let refs = find_pr(&gh, &event).await.unwrap();
        assert_eq!(
            refs.pr_url,
            "https://api.github.com/repos/acme/aws-users/pulls/123"
        );
        assert_eq!(
            refs.issue_url,
            "https://api.github.com/repos/acme/aws-users/issues/123"
        );
    }

    #[tokio::test]
    async fn unrelated_event_is_an_explicit_error() {
        let gh = GithubClient::with_base("t", "https://api.github.com");
        let event = CiEvent {
            repo: "acme/aws-users".to_string(),
            event_type: "RELEASED".to_string(),
            trigger: None,
            commit: None,
        };
        assert!(matches!(
            find_pr(&gh, &event).await,
            Err(GithubError::UnrelatedEvent(_))
        ));
    }
}
