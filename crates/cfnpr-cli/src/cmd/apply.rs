use super::RunArgs;
use cfnpr_core::client::changeset_name_from_env;
use cfnpr_core::orchestrator::{await_all, create_all, execute_all, Outcome};
use cfnpr_core::render::render_changes;
use cfnpr_core::stacks::{load_stacks, validate_templates};
use tracing::{error, info};

/// Create changesets for every declared stack, execute the ones that carry
/// changes, and wait for execution to finish. Run after the PR merges.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let stacks = load_stacks(&args.stacks)?;
    validate_templates(&stacks)?;
    let name = changeset_name_from_env();

    let ops = args.changeset_ops().await;
    let poll = args.poll_config();

    let reports = create_all(&ops, &stacks, &name).await;
    let reports = await_all(&ops, reports, &poll).await;

    let reports = execute_all(&ops, reports).await;
    let reports = await_all(&ops, reports, &poll).await;

    let mut failures = 0;
    for report in &reports {
        match &report.outcome {
            Outcome::Failed(e) => {
                error!("{}: {e}", report.stack);
                failures += 1;
            }
            Outcome::Changeset(cs) if report.is_failure() => {
                error!(
                    "{}: changeset ended in {} ({})",
                    report.stack,
                    cs.status,
                    cs.status_reason.as_deref().unwrap_or("no reason given")
                );
                failures += 1;
            }
            Outcome::Changeset(_) if report.is_no_op() => {
                info!("{}: no changes", report.stack);
            }
            Outcome::Changeset(cs) => {
                info!("{}: {}", report.stack, cs.status);
                print!("{}", render_changes(cs));
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} changesets failed", reports.len());
    }
    Ok(())
}
