use crate::convert::changeset_from;
use async_trait::async_trait;
use aws_sdk_cloudformation::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::Capability;
use cfnpr_core::client::ChangesetOps;
use cfnpr_core::error::{CoreError, Result};
use cfnpr_core::types::{Changeset, Stack};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

const SESSION_NAME: &str = "cfnpr";
const SESSION_SECONDS: i32 = 3600;

// ---------------------------------------------------------------------------
// RoleNames
// ---------------------------------------------------------------------------

/// The two logical roles assumed in every target account. The propose role
/// may only create and describe changesets; the execute role may only
/// execute them. Creation never sees the execute credential and vice versa.
#[derive(Debug, Clone)]
pub struct RoleNames {
    pub propose: String,
    pub execute: String,
}

// ---------------------------------------------------------------------------
// AwsChangesets
// ---------------------------------------------------------------------------

/// CloudFormation client per (account, role), cached by role ARN for the
/// process lifetime. A CI run finishes well inside the one-hour session, so
/// cached credentials are never refreshed.
pub struct AwsChangesets {
    region: String,
    roles: RoleNames,
    sts: aws_sdk_sts::Client,
    cache: Mutex<HashMap<String, aws_sdk_cloudformation::Client>>,
}

impl AwsChangesets {
    pub async fn new(region: impl Into<String>, roles: RoleNames) -> Self {
        let region = region.into();
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Self {
            region,
            roles,
            sts: aws_sdk_sts::Client::new(&shared),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn client_for(
        &self,
        stack: &Stack,
        role_name: &str,
    ) -> Result<aws_sdk_cloudformation::Client> {
        let role_arn = format!("arn:aws:iam::{}:role/{role_name}", stack.account_id);

        // Held across the assume-role call: concurrent misses for the same
        // role must not each burn an STS call.
        let mut cache = self.cache.lock().await;
        if let Some(client) = cache.get(&role_arn) {
            return Ok(client.clone());
        }

        debug!("assuming {role_arn}");
        let assumed = self
            .sts
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(SESSION_NAME)
            .duration_seconds(SESSION_SECONDS)
            .send()
            .await
            .map_err(|e| remote(stack, DisplayErrorContext(e)))?;

        let creds = assumed
            .credentials()
            .ok_or_else(|| remote(stack, format!("no credentials returned for {role_arn}")))?;

        let provider = Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            Some(creds.session_token().to_string()),
            None,
            "cfnpr-assume-role",
        );
        let conf = aws_sdk_cloudformation::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(provider)
            .build();
        let client = aws_sdk_cloudformation::Client::from_conf(conf);

        cache.insert(role_arn, client.clone());
        Ok(client)
    }
}

fn remote(stack: &Stack, message: impl std::fmt::Display) -> CoreError {
    CoreError::RemoteService {
        account: stack.account_name.clone(),
        stack: stack.stack_name.clone(),
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ChangesetOps
// ---------------------------------------------------------------------------

#[async_trait]
impl ChangesetOps for AwsChangesets {
    async fn create_changeset(&self, stack: &Stack, name: &str) -> Result<Changeset> {
        let template = std::fs::read_to_string(&stack.template_path).map_err(|source| {
            CoreError::Template {
                path: stack.template_path.clone(),
                source,
            }
        })?;

        let client = self.client_for(stack, &self.roles.propose).await?;
        let created = client
            .create_change_set()
            .stack_name(&stack.stack_name)
            .template_body(template)
            .change_set_name(name)
            .capabilities(Capability::CapabilityNamedIam)
            .description("Changeset generated from a cfnpr pull request")
            .send()
            .await
            .map_err(|e| remote(stack, DisplayErrorContext(e)))?;

        let id = created
            .id()
            .ok_or_else(|| remote(stack, "create response carried no changeset id"))?
            .to_string();
        info!("created changeset {id} for {stack}");

        self.describe_changeset(stack, &id).await
    }

    async fn describe_changeset(&self, stack: &Stack, changeset_id: &str) -> Result<Changeset> {
        let client = self.client_for(stack, &self.roles.propose).await?;
        let out = client
            .describe_change_set()
            .change_set_name(changeset_id)
            .send()
            .await
            .map_err(|e| remote(stack, DisplayErrorContext(e)))?;
        Ok(changeset_from(&out))
    }

    async fn execute_changeset(&self, stack: &Stack, changeset_id: &str) -> Result<()> {
        let client = self.client_for(stack, &self.roles.execute).await?;
        client
            .execute_change_set()
            .change_set_name(changeset_id)
            .send()
            .await
            .map_err(|e| remote(stack, DisplayErrorContext(e)))?;
        info!("execution started for {stack}");
        Ok(())
    }
}
