use crate::error::Result;
use crate::types::{Changeset, Stack};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// ChangesetOps
// ---------------------------------------------------------------------------

/// The remote changeset service, as seen by the orchestrator.
///
/// Implementations resolve per-account credentials from the stack's account
/// id; the orchestrator never sees a credential. `describe_changeset` must be
/// an idempotent read, safe to call repeatedly while polling.
#[async_trait]
pub trait ChangesetOps: Send + Sync {
    /// Submit a create request and immediately re-describe the changeset to
    /// obtain its initial snapshot.
    async fn create_changeset(&self, stack: &Stack, name: &str) -> Result<Changeset>;

    /// Fetch the current snapshot of a changeset.
    async fn describe_changeset(&self, stack: &Stack, changeset_id: &str) -> Result<Changeset>;

    /// Trigger execution of a created changeset. Mutates real infrastructure.
    async fn execute_changeset(&self, stack: &Stack, changeset_id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Changeset naming
// ---------------------------------------------------------------------------

/// Derive a deterministic changeset name from the CI build identity, so a
/// rerun of the same build replaces its own changeset rather than colliding
/// with an in-flight one from a stale run.
///
/// Falls back to a timestamp when no build identity is available (e.g. a
/// local invocation).
pub fn changeset_name(
    trigger: Option<&str>,
    commit: Option<&str>,
    build_number: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let name = match (trigger, commit, build_number) {
        (None, None, None) => format!("cfnpr-{}", now.format("%Y%m%d%H%M%S")),
        _ => format!(
            "cfnpr-{}-{}-{}",
            trigger.unwrap_or("unknown-pr"),
            commit.map(short_commit).unwrap_or("unknown-commit"),
            build_number.unwrap_or("0"),
        ),
    };
    sanitize(&name)
}

/// Read the build identity from the CodeBuild environment.
pub fn changeset_name_from_env() -> String {
    let trigger = std::env::var("CODEBUILD_WEBHOOK_TRIGGER").ok();
    let commit = std::env::var("CODEBUILD_RESOLVED_SOURCE_VERSION").ok();
    let build = std::env::var("CODEBUILD_BUILD_NUMBER").ok();
    changeset_name(
        trigger.as_deref(),
        commit.as_deref(),
        build.as_deref(),
        Utc::now(),
    )
}

fn short_commit(commit: &str) -> &str {
    if commit.len() > 7 && commit.is_char_boundary(7) {
        &commit[..7]
    } else {
        commit
    }
}

/// CloudFormation changeset names must match `[a-zA-Z][-a-zA-Z0-9]*` and be
/// at most 128 characters. The `cfnpr-` prefix guarantees the leading alpha.
fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    out.truncate(128);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
