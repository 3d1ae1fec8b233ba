use aws_sdk_cloudformation::operation::describe_change_set::DescribeChangeSetOutput;
use cfnpr_core::types::{ChangeAction, Changeset, ChangesetStatus, Replacement, ResourceChange};

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

/// CloudFormation reports creation progress in `Status` and execution
/// progress in a separate `ExecutionStatus` field. We fold both into one
/// lifecycle status: once execution has started, the execution status is the
/// one that matters.
pub(crate) fn status_from(status: Option<&str>, execution_status: Option<&str>) -> ChangesetStatus {
    if let Some(exec) = execution_status {
        if exec.starts_with("EXECUTE_") {
            return ChangesetStatus::from_api(exec);
        }
    }
    ChangesetStatus::from_api(status.unwrap_or(""))
}

pub(crate) fn change_from(
    action: Option<&str>,
    resource_type: Option<&str>,
    logical_resource_id: Option<&str>,
    replacement: Option<&str>,
) -> ResourceChange {
    ResourceChange {
        action: ChangeAction::from_api(action.unwrap_or("")),
        resource_type: resource_type.unwrap_or("").to_string(),
        logical_resource_id: logical_resource_id.unwrap_or("").to_string(),
        replacement: Replacement::from_api(replacement.unwrap_or("")),
    }
}

// ---------------------------------------------------------------------------
// Snapshot mapping
// ---------------------------------------------------------------------------

pub(crate) fn changeset_from(out: &DescribeChangeSetOutput) -> Changeset {
    let resource_changes = out
        .changes()
        .iter()
        .filter_map(|c| c.resource_change())
        .map(|rc| {
            change_from(
                rc.action().map(|a| a.as_str()),
                rc.resource_type(),
                rc.logical_resource_id(),
                rc.replacement().map(|r| r.as_str()),
            )
        })
        .collect();

    Changeset {
        id: out.change_set_id().unwrap_or("").to_string(),
        name: out.change_set_name().unwrap_or("").to_string(),
        stack_id: out.stack_id().unwrap_or("").to_string(),
        stack_name: out.stack_name().unwrap_or("").to_string(),
        status: status_from(
            out.status().map(|s| s.as_str()),
            out.execution_status().map(|s| s.as_str()),
        ),
        status_reason: out.status_reason().map(str::to_string),
        resource_changes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_status_when_execution_not_started() {
        assert_eq!(
            status_from(Some("CREATE_IN_PROGRESS"), Some("UNAVAILABLE")),
            ChangesetStatus::CreateInProgress
        );
        assert_eq!(
            status_from(Some("CREATE_COMPLETE"), Some("AVAILABLE")),
            ChangesetStatus::CreateComplete
        );
        assert_eq!(
            status_from(Some("FAILED"), None),
            ChangesetStatus::Failed
        );
    }

    #[test]
    fn execution_status_takes_over_once_started() {
        assert_eq!(
            status_from(Some("CREATE_COMPLETE"), Some("EXECUTE_IN_PROGRESS")),
            ChangesetStatus::ExecuteInProgress
        );
        assert_eq!(
            status_from(Some("CREATE_COMPLETE"), Some("EXECUTE_COMPLETE")),
            ChangesetStatus::ExecuteComplete
        );
        assert_eq!(
            status_from(Some("CREATE_COMPLETE"), Some("EXECUTE_FAILED")),
            ChangesetStatus::ExecuteFailed
        );
    }

    #[test]
    fn missing_fields_become_empty_change() {
        let change = change_from(None, None, None, None);
        assert_eq!(change.action, ChangeAction::Unrecognized(String::new()));
        assert_eq!(change.replacement, Replacement::Unknown);
    }

    #[test]
    fn change_fields_are_carried_through() {
        let change = change_from(
            Some("Modify"),
            Some("AWS::IAM::Role"),
            Some("DeployRole"),
            Some("True"),
        );
        assert_eq!(change.action, ChangeAction::Modify);
        assert_eq!(change.resource_type, "AWS::IAM::Role");
        assert_eq!(change.logical_resource_id, "DeployRole");
        assert_eq!(change.replacement, Replacement::True);
    }
}
