use super::RunArgs;
use anyhow::Context;
use cfnpr_core::client::changeset_name_from_env;
use cfnpr_core::comment::RequiredHeaders;
use cfnpr_core::orchestrator::{await_all, create_all};
use cfnpr_core::render::render_summary;
use cfnpr_core::stacks::{load_stacks, validate_templates};
use cfnpr_github::comments::{find_comment, upsert};
use cfnpr_github::pr::{find_pr, CiEvent};
use cfnpr_github::GithubClient;
use tracing::info;

/// Create a changeset for every declared stack, wait for all of them, and
/// publish the rendered diff as the single tracked comment on the PR.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let stacks = load_stacks(&args.stacks)?;
    validate_templates(&stacks)?;
    let name = changeset_name_from_env();

    let ops = args.changeset_ops().await;
    let reports = create_all(&ops, &stacks, &name).await;
    let reports = await_all(&ops, reports, &args.poll_config()).await;

    let summary = render_summary(&reports, &args.region);
    println!("{summary}");

    publish(&summary).await.context("publishing the PR comment")?;

    let failures = reports.iter().filter(|r| r.is_failure()).count();
    if failures > 0 {
        anyhow::bail!("{failures} of {} changesets failed", reports.len());
    }
    Ok(())
}

/// Upsert the summary onto the pull request this run belongs to. Any failure
/// here fails the run: reviewers rely on the comment as the sole visible
/// result, so there is no fallback output channel.
async fn publish(summary: &str) -> anyhow::Result<()> {
    let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN is not set")?;
    let gh = GithubClient::new(token);

    let event = CiEvent::from_env()?;
    let refs = find_pr(&gh, &event).await?;
    let username = gh.current_user().await?;

    let mut required = RequiredHeaders::new();
    required.insert("workflow".to_string(), Some("preview".to_string()));

    let mut comment = find_comment(&gh, &refs.issue_url, &username, &required).await?;
    upsert(&gh, &mut comment, summary).await?;

    if let Some(url) = &comment.comment_url {
        info!("published changeset summary to {url}");
    }
    Ok(())
}
