use crate::client::ChangesetOps;
use crate::error::CoreError;
use crate::types::{Changeset, ChangesetStatus, Stack};
use std::time::Duration;
use tracing::{debug, error, info};

// ---------------------------------------------------------------------------
// No-op detection
// ---------------------------------------------------------------------------

/// The fixed reason CloudFormation attaches to a FAILED changeset whose
/// template would produce no changes. Matched verbatim.
pub const NO_CHANGES_REASON: &str = "The submitted information didn't contain changes. \
     Submit different information to create a change set.";

/// A FAILED changeset with the no-changes reason is a no-op, not an error.
/// It is excluded from the diff, from execution, and from failure accounting.
pub fn is_no_op(changeset: &Changeset) -> bool {
    changeset.status == ChangesetStatus::Failed
        && changeset.status_reason.as_deref() == Some(NO_CHANGES_REASON)
}

pub fn is_failed(changeset: &Changeset) -> bool {
    changeset.status == ChangesetStatus::Failed && !is_no_op(changeset)
}

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

/// Backoff and deadline for changeset polling. The deadline is deliberate:
/// an indefinite poll loop turns a stuck changeset into a stuck CI job.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub initial: Duration,
    pub max: Duration,
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            deadline: Duration::from_secs(30 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// StackReport
// ---------------------------------------------------------------------------

/// Per-stack result, carried through the whole run so one stack's remote
/// rejection never aborts its siblings.
#[derive(Debug)]
pub enum Outcome {
    Changeset(Changeset),
    Failed(CoreError),
}

#[derive(Debug)]
pub struct StackReport {
    pub stack: Stack,
    pub outcome: Outcome,
}

impl StackReport {
    pub fn changeset(&self) -> Option<&Changeset> {
        match &self.outcome {
            Outcome::Changeset(cs) => Some(cs),
            Outcome::Failed(_) => None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.changeset().is_some_and(is_no_op)
    }

    /// True when this stack should fail the run: the remote call errored,
    /// creation FAILED for a real reason, or execution failed.
    pub fn is_failure(&self) -> bool {
        match &self.outcome {
            Outcome::Failed(_) => true,
            Outcome::Changeset(cs) => {
                is_failed(cs) || cs.status == ChangesetStatus::ExecuteFailed
            }
        }
    }

    /// True when there is a real changeset to show and execute.
    pub fn has_changes(&self) -> bool {
        match &self.outcome {
            Outcome::Changeset(cs) => !is_no_op(cs) && !is_failed(cs),
            Outcome::Failed(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Submit a changeset for every stack, in declaration order. Per-stack
/// rejections are captured in the report, not propagated.
pub async fn create_all(
    ops: &dyn ChangesetOps,
    stacks: &[Stack],
    name: &str,
) -> Vec<StackReport> {
    let mut reports = Vec::with_capacity(stacks.len());
    for stack in stacks {
        info!("creating changeset '{name}' for {stack}");
        let outcome = match ops.create_changeset(stack, name).await {
            Ok(cs) => Outcome::Changeset(cs),
            Err(e) => {
                error!("changeset creation rejected for {stack}: {e}");
                Outcome::Failed(e)
            }
        };
        reports.push(StackReport {
            stack: stack.clone(),
            outcome,
        });
    }
    reports
}

/// Poll every pending changeset to a terminal status, concurrently. Report
/// order is preserved. Already-failed reports pass through untouched.
pub async fn await_all(
    ops: &dyn ChangesetOps,
    reports: Vec<StackReport>,
    poll: &PollConfig,
) -> Vec<StackReport> {
    let pending = reports.into_iter().map(|report| async move {
        let StackReport { stack, outcome } = report;
        let outcome = match outcome {
            Outcome::Changeset(cs) => await_one(ops, &stack, cs, poll).await,
            failed @ Outcome::Failed(_) => failed,
        };
        StackReport { stack, outcome }
    });
    futures::future::join_all(pending).await
}

/// Poll a single changeset with doubling backoff until terminal or past the
/// deadline. Sleeping here never blocks a sibling stack's poll.
async fn await_one(
    ops: &dyn ChangesetOps,
    stack: &Stack,
    mut changeset: Changeset,
    poll: &PollConfig,
) -> Outcome {
    let start = tokio::time::Instant::now();
    let mut delay = poll.initial;

    // A describe issued shortly after execution starts can still report the
    // pre-execution status. Once we know execution has begun, a
    // creation-phase status is a stale read and must not end the poll.
    let executing = changeset.status == ChangesetStatus::ExecuteInProgress;

    loop {
        let stale = executing && creation_phase(&changeset.status);
        if changeset.status.is_terminal() && !stale {
            info!(
                "changeset for {stack} reached {} after {:?}",
                changeset.status,
                start.elapsed()
            );
            return Outcome::Changeset(changeset);
        }

        if start.elapsed() >= poll.deadline {
            return Outcome::Failed(CoreError::Timeout {
                account: stack.account_name.clone(),
                stack: stack.stack_name.clone(),
                elapsed_secs: start.elapsed().as_secs(),
            });
        }

        debug!(
            "changeset for {stack} is {}, retrying in {delay:?}",
            changeset.status
        );
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(poll.max);

        changeset = match ops.describe_changeset(stack, &changeset.id).await {
            Ok(cs) => cs,
            Err(e) => return Outcome::Failed(e),
        };
    }
}

fn creation_phase(status: &ChangesetStatus) -> bool {
    matches!(
        status,
        ChangesetStatus::CreatePending
            | ChangesetStatus::CreateInProgress
            | ChangesetStatus::CreateComplete
    )
}

/// Execute every changeset that is neither no-op nor failed, marking each
/// executed one as in progress. Callers re-poll with [`await_all`] to observe
/// the execution outcome; describing here instead would race the service and
/// could return the pre-execution snapshot.
pub async fn execute_all(
    ops: &dyn ChangesetOps,
    reports: Vec<StackReport>,
) -> Vec<StackReport> {
    let mut out = Vec::with_capacity(reports.len());
    for mut report in reports {
        let id = match &report.outcome {
            Outcome::Changeset(cs) if report.has_changes() => Some(cs.id.clone()),
            _ => None,
        };

        if let Some(id) = id {
            info!("executing changeset for {}", report.stack);
            match ops.execute_changeset(&report.stack, &id).await {
                Ok(()) => {
                    if let Outcome::Changeset(cs) = &mut report.outcome {
                        cs.status = ChangesetStatus::ExecuteInProgress;
                    }
                }
                Err(e) => {
                    error!("execution rejected for {}: {e}", report.stack);
                    report.outcome = Outcome::Failed(e);
                }
            }
        }
        out.push(report);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
