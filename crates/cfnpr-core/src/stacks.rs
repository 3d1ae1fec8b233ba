use crate::error::{CoreError, Result};
use crate::types::Stack;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Declaration file format
// ---------------------------------------------------------------------------
//
// stacks.yaml is a mapping of account name to account declaration:
//
//   platform:
//     account-id: "111122223333"
//     stacks:
//       - name: users
//         template: templates/users.yaml

#[derive(Debug, Deserialize)]
struct AccountDecl {
    #[serde(rename = "account-id")]
    account_id: String,
    stacks: Vec<StackDecl>,
}

#[derive(Debug, Deserialize)]
struct StackDecl {
    name: String,
    template: PathBuf,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and flatten the stack declarations, preserving declaration order.
///
/// Declaration order matters: it is the submission order for changeset
/// creation and the section order in the rendered summary.
pub fn load_stacks(path: &Path) -> Result<Vec<Stack>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
    parse_stacks(&data)
}

fn parse_stacks(data: &str) -> Result<Vec<Stack>> {
    // Deserialize via Mapping rather than a map type so account order in the
    // file is kept.
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(data)?;

    let mut stacks = Vec::new();
    for (key, value) in mapping {
        let account_name = key
            .as_str()
            .ok_or_else(|| CoreError::Config("account name must be a string".to_string()))?
            .to_string();
        let decl: AccountDecl = serde_yaml::from_value(value)
            .map_err(|e| CoreError::Config(format!("account '{account_name}': {e}")))?;
        for stack in decl.stacks {
            stacks.push(Stack {
                account_id: decl.account_id.clone(),
                account_name: account_name.clone(),
                stack_name: stack.name,
                template_path: stack.template,
            });
        }
    }

    if stacks.is_empty() {
        return Err(CoreError::Config("no stacks declared".to_string()));
    }

    Ok(stacks)
}

/// Check that every declared template is readable. An unreadable template is
/// a configuration error and must fail the run before any changeset is
/// created, not surface mid-run after sibling stacks already have one.
pub fn validate_templates(stacks: &[Stack]) -> Result<()> {
    for stack in stacks {
        std::fs::read_to_string(&stack.template_path).map_err(|source| CoreError::Template {
            path: stack.template_path.clone(),
            source,
        })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
