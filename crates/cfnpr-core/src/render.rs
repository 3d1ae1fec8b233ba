use crate::orchestrator::{is_failed, is_no_op, Outcome, StackReport};
use crate::types::{ChangeAction, Changeset, Replacement, ResourceChange};
use std::fmt::Write;

// ---------------------------------------------------------------------------
// Per-change lines
// ---------------------------------------------------------------------------

/// Plain-text line for one change, or `None` for actions we don't recognize.
///
/// Skipping unrecognized actions is deliberate: CloudFormation is the sole
/// producer of the action enum, and a value we have never seen must not break
/// rendering.
pub fn change_line(change: &ResourceChange) -> Option<String> {
    let verb = verb_for(change)?;
    Some(format!(
        "{verb} {} {}\n",
        change.resource_type, change.logical_resource_id
    ))
}

/// Unified-diff-style line for one change: `+` add, `-` remove, `!` for
/// modify, replace, and undetermined.
pub fn diff_line(change: &ResourceChange) -> Option<String> {
    let (prefix, verb) = match change.action {
        ChangeAction::Add => ('+', "Add"),
        ChangeAction::Remove => ('-', "Remove"),
        ChangeAction::Modify => ('!', modify_verb(change.replacement)),
        ChangeAction::Dynamic => ('!', "Undetermined Change to"),
        ChangeAction::Unrecognized(_) => return None,
    };
    Some(format!(
        "{prefix} {verb} {} {}\n",
        change.resource_type, change.logical_resource_id
    ))
}

fn verb_for(change: &ResourceChange) -> Option<&'static str> {
    match change.action {
        ChangeAction::Add => Some("Add"),
        ChangeAction::Modify => Some(modify_verb(change.replacement)),
        ChangeAction::Remove => Some("Remove"),
        ChangeAction::Dynamic => Some("Undetermined Change to"),
        ChangeAction::Unrecognized(_) => None,
    }
}

fn modify_verb(replacement: Replacement) -> &'static str {
    match replacement {
        Replacement::True => "Replace",
        _ => "Update",
    }
}

// ---------------------------------------------------------------------------
// Per-changeset rendering
// ---------------------------------------------------------------------------

/// One line per change, in input order.
pub fn render_changes(changeset: &Changeset) -> String {
    changeset
        .resource_changes
        .iter()
        .filter_map(change_line)
        .collect()
}

/// The change list as a fenced diff block for markdown rendering.
pub fn render_diff(changeset: &Changeset) -> String {
    let body: String = changeset
        .resource_changes
        .iter()
        .filter_map(diff_line)
        .collect();
    format!("```diff\n{body}```\n")
}

/// Deep link into the console's changeset view. Reproduced byte-for-byte
/// from the console's own URL format; no semantic validation.
pub fn console_url(region: &str, stack_id: &str, changeset_id: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/cloudformation/home?region={region}\
         #/stacks/changesets/changes?stackId={stack_id}&changeSetId={changeset_id}"
    )
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Assemble the markdown body published to the pull request: one section per
/// stack, in declaration order.
pub fn render_summary(reports: &[StackReport], region: &str) -> String {
    let mut out = String::from("## Infrastructure changes\n");

    for report in reports {
        let _ = write!(out, "\n### {}\n\n", report.stack);
        match &report.outcome {
            Outcome::Failed(e) => {
                let _ = write!(out, ":x: {e}\n");
            }
            Outcome::Changeset(cs) if is_no_op(cs) => {
                out.push_str("No changes.\n");
            }
            Outcome::Changeset(cs) if is_failed(cs) => {
                let reason = cs.status_reason.as_deref().unwrap_or("no reason given");
                let _ = write!(out, ":x: Changeset failed: {reason}\n");
            }
            Outcome::Changeset(cs) => {
                out.push_str(&render_diff(cs));
                let _ = write!(
                    out,
                    "\n[View changeset in the console]({})\n",
                    console_url(region, &cs.stack_id, &cs.id)
                );
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::NO_CHANGES_REASON;
    use crate::types::{ChangesetStatus, Stack};
    use std::path::PathBuf;

    fn change(action: ChangeAction, replacement: Replacement) -> ResourceChange {
        ResourceChange {
            action,
            resource_type: "AWS::S3::Bucket".to_string(),
            logical_resource_id: "MyBucket".to_string(),
            replacement,
        }
    }

    fn changeset_with(changes: Vec<ResourceChange>) -> Changeset {
        Changeset {
            id: "cs-1".to_string(),
            name: "cfnpr-test".to_string(),
            stack_id: "arn:aws:cloudformation:eu-west-1:111122223333:stack/users/abc".to_string(),
            stack_name: "users".to_string(),
            status: ChangesetStatus::CreateComplete,
            status_reason: None,
            resource_changes: changes,
        }
    }

    #[test]
    fn add_renders_plain_line() {
        let cs = changeset_with(vec![change(ChangeAction::Add, Replacement::Unknown)]);
        assert_eq!(render_changes(&cs), "Add AWS::S3::Bucket MyBucket\n");
    }

    #[test]
    fn modify_verb_depends_on_replacement() {
        assert_eq!(
            change_line(&change(ChangeAction::Modify, Replacement::True)).unwrap(),
            "Replace AWS::S3::Bucket MyBucket\n"
        );
        assert_eq!(
            change_line(&change(ChangeAction::Modify, Replacement::False)).unwrap(),
            "Update AWS::S3::Bucket MyBucket\n"
        );
        assert_eq!(
            change_line(&change(ChangeAction::Modify, Replacement::Conditional)).unwrap(),
            "Update AWS::S3::Bucket MyBucket\n"
        );
    }

    #[test]
    fn dynamic_renders_undetermined() {
        assert_eq!(
            change_line(&change(ChangeAction::Dynamic, Replacement::Unknown)).unwrap(),
            "Undetermined Change to AWS::S3::Bucket MyBucket\n"
        );
    }

    #[test]
    fn unrecognized_action_emits_no_line() {
        let cs = changeset_with(vec![
            change(ChangeAction::Add, Replacement::Unknown),
            change(
                ChangeAction::Unrecognized("Import".to_string()),
                Replacement::Unknown,
            ),
            change(ChangeAction::Remove, Replacement::Unknown),
        ]);
        assert_eq!(
            render_changes(&cs),
            "Add AWS::S3::Bucket MyBucket\nRemove AWS::S3::Bucket MyBucket\n"
        );
    }

    #[test]
    fn diff_prefixes() {
        assert!(diff_line(&change(ChangeAction::Add, Replacement::Unknown))
            .unwrap()
            .starts_with("+ "));
        assert!(diff_line(&change(ChangeAction::Remove, Replacement::Unknown))
            .unwrap()
            .starts_with("- "));
        assert!(diff_line(&change(ChangeAction::Modify, Replacement::True))
            .unwrap()
            .starts_with("! Replace"));
        assert!(diff_line(&change(ChangeAction::Modify, Replacement::False))
            .unwrap()
            .starts_with("! Update"));
        let dynamic = diff_line(&change(ChangeAction::Dynamic, Replacement::Unknown)).unwrap();
        assert_eq!(dynamic, "! Undetermined Change to AWS::S3::Bucket MyBucket\n");
        assert!(diff_line(&change(
            ChangeAction::Unrecognized("Import".to_string()),
            Replacement::Unknown
        ))
        .is_none());
    }

    #[test]
    fn rendering_is_pure_and_order_preserving() {
        let cs = changeset_with(vec![
            change(ChangeAction::Remove, Replacement::Unknown),
            change(ChangeAction::Add, Replacement::Unknown),
        ]);
        let first = render_changes(&cs);
        assert_eq!(first, render_changes(&cs));
        assert!(first.starts_with("Remove"));
    }

    #[test]
    fn diff_block_is_fenced() {
        let cs = changeset_with(vec![change(ChangeAction::Add, Replacement::Unknown)]);
        assert_eq!(
            render_diff(&cs),
            "```diff\n+ Add AWS::S3::Bucket MyBucket\n```\n"
        );
    }

    #[test]
    fn console_url_format() {
        assert_eq!(
            console_url("eu-west-1", "arn:stack", "arn:cs"),
            "https://eu-west-1.console.aws.amazon.com/cloudformation/home?region=eu-west-1\
             #/stacks/changesets/changes?stackId=arn:stack&changeSetId=arn:cs"
        );
    }

    #[test]
    fn summary_sections_per_stack() {
        let stack = Stack {
            account_id: "111122223333".to_string(),
            account_name: "platform".to_string(),
            stack_name: "users".to_string(),
            template_path: PathBuf::from("t.yaml"),
        };

        let mut no_op = changeset_with(vec![]);
        no_op.status = ChangesetStatus::Failed;
        no_op.status_reason = Some(NO_CHANGES_REASON.to_string());

        let reports = vec![
            StackReport {
                stack: stack.clone(),
                outcome: Outcome::Changeset(changeset_with(vec![change(
                    ChangeAction::Add,
                    Replacement::Unknown,
                )])),
            },
            StackReport {
                stack: Stack {
                    stack_name: "roles".to_string(),
                    ..stack
                },
                outcome: Outcome::Changeset(no_op),
            },
        ];

        let summary = render_summary(&reports, "eu-west-1");
        assert!(summary.contains("### platform/users"));
        assert!(summary.contains("```diff\n+ Add AWS::S3::Bucket MyBucket\n```"));
        assert!(summary.contains("console.aws.amazon.com"));
        assert!(summary.contains("### platform/roles"));
        assert!(summary.contains("No changes."));
        // No-op changesets get no diff and no console link in their section.
        let roles_section = summary.split("### platform/roles").nth(1).unwrap();
        assert!(!roles_section.contains("```diff"));
    }

    #[test]
    fn summary_shows_rejection() {
        let report = StackReport {
            stack: Stack {
                account_id: "1".to_string(),
                account_name: "platform".to_string(),
                stack_name: "users".to_string(),
                template_path: PathBuf::from("t.yaml"),
            },
            outcome: Outcome::Failed(crate::error::CoreError::RemoteService {
                account: "platform".to_string(),
                stack: "users".to_string(),
                message: "Stack [users] does not exist".to_string(),
            }),
        };
        let summary = render_summary(&[report], "eu-west-1");
        assert!(summary.contains("does not exist"));
    }
}
