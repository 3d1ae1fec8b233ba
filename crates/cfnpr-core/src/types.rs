use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// One deployable unit of infrastructure, identified by name within one
/// account. Declared in `stacks.yaml` and never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub account_id: String,
    pub account_name: String,
    pub stack_name: String,
    pub template_path: PathBuf,
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_name, self.stack_name)
    }
}

// ---------------------------------------------------------------------------
// ChangesetStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a changeset as reported by CloudFormation.
///
/// The service owns this enum; values we have never seen are carried through
/// as `Unrecognized` rather than failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangesetStatus {
    CreatePending,
    CreateInProgress,
    CreateComplete,
    DeleteComplete,
    Failed,
    ExecuteInProgress,
    ExecuteComplete,
    ExecuteFailed,
    Unrecognized(String),
}

impl ChangesetStatus {
    pub fn from_api(s: &str) -> Self {
        match s {
            "CREATE_PENDING" => ChangesetStatus::CreatePending,
            "CREATE_IN_PROGRESS" => ChangesetStatus::CreateInProgress,
            "CREATE_COMPLETE" => ChangesetStatus::CreateComplete,
            "DELETE_COMPLETE" => ChangesetStatus::DeleteComplete,
            "FAILED" => ChangesetStatus::Failed,
            "EXECUTE_IN_PROGRESS" => ChangesetStatus::ExecuteInProgress,
            "EXECUTE_COMPLETE" => ChangesetStatus::ExecuteComplete,
            "EXECUTE_FAILED" => ChangesetStatus::ExecuteFailed,
            other => ChangesetStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangesetStatus::CreatePending => "CREATE_PENDING",
            ChangesetStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            ChangesetStatus::CreateComplete => "CREATE_COMPLETE",
            ChangesetStatus::DeleteComplete => "DELETE_COMPLETE",
            ChangesetStatus::Failed => "FAILED",
            ChangesetStatus::ExecuteInProgress => "EXECUTE_IN_PROGRESS",
            ChangesetStatus::ExecuteComplete => "EXECUTE_COMPLETE",
            ChangesetStatus::ExecuteFailed => "EXECUTE_FAILED",
            ChangesetStatus::Unrecognized(s) => s,
        }
    }

    /// A terminal status never transitions again without an explicit new
    /// action (create or execute). For statuses we don't know, fall back to
    /// the service's naming convention: `*_COMPLETE`, `*_FAILED`, `FAILED`.
    pub fn is_terminal(&self) -> bool {
        match self {
            ChangesetStatus::CreateComplete
            | ChangesetStatus::DeleteComplete
            | ChangesetStatus::Failed
            | ChangesetStatus::ExecuteComplete
            | ChangesetStatus::ExecuteFailed => true,
            ChangesetStatus::CreatePending
            | ChangesetStatus::CreateInProgress
            | ChangesetStatus::ExecuteInProgress => false,
            ChangesetStatus::Unrecognized(s) => {
                s.ends_with("_COMPLETE") || s.ends_with("_FAILED") || s == "FAILED"
            }
        }
    }
}

impl fmt::Display for ChangesetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChangeAction / Replacement
// ---------------------------------------------------------------------------

/// What the service intends to do to a resource. `Dynamic` means the action
/// could not be determined ahead of time (conditional template logic) and
/// must render as undetermined, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Add,
    Modify,
    Remove,
    Dynamic,
    Unrecognized(String),
}

impl ChangeAction {
    pub fn from_api(s: &str) -> Self {
        match s {
            "Add" => ChangeAction::Add,
            "Modify" => ChangeAction::Modify,
            "Remove" => ChangeAction::Remove,
            "Dynamic" => ChangeAction::Dynamic,
            other => ChangeAction::Unrecognized(other.to_string()),
        }
    }
}

/// Whether a `Modify` will replace the resource. CloudFormation reports
/// `True`, `False`, or `Conditional`; anything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Replacement {
    True,
    False,
    Conditional,
    Unknown,
}

impl Replacement {
    pub fn from_api(s: &str) -> Self {
        match s {
            "True" => Replacement::True,
            "False" => Replacement::False,
            "Conditional" => Replacement::Conditional,
            _ => Replacement::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceChange / Changeset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub action: ChangeAction,
    pub resource_type: String,
    pub logical_resource_id: String,
    pub replacement: Replacement,
}

/// A snapshot of a remote changeset. Only ever observed by re-describing;
/// the status transitions remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    pub id: String,
    pub name: String,
    pub stack_id: String,
    pub stack_name: String,
    pub status: ChangesetStatus,
    pub status_reason: Option<String>,
    pub resource_changes: Vec<ResourceChange>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
