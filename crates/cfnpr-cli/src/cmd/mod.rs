pub mod apply;
pub mod preview;

use cfnpr_aws::{AwsChangesets, RoleNames};
use cfnpr_core::orchestrator::PollConfig;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Stack declarations file
    #[arg(long, default_value = "stacks.yaml")]
    pub stacks: PathBuf,

    /// Region for changesets and console links
    #[arg(long, env = "AWS_REGION", default_value = "eu-west-1")]
    pub region: String,

    /// Role assumed in each account to create and describe changesets
    #[arg(long, env = "CFNPR_PROPOSE_ROLE", default_value = "cfnpr-propose")]
    pub propose_role: String,

    /// Role assumed in each account to execute changesets
    #[arg(long, env = "CFNPR_EXECUTE_ROLE", default_value = "cfnpr-execute")]
    pub execute_role: String,

    /// Give up on a changeset that is not terminal after this many seconds
    #[arg(long, default_value_t = 1800)]
    pub timeout_secs: u64,
}

impl RunArgs {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            deadline: Duration::from_secs(self.timeout_secs),
            ..PollConfig::default()
        }
    }

    pub async fn changeset_ops(&self) -> AwsChangesets {
        AwsChangesets::new(
            self.region.clone(),
            RoleNames {
                propose: self.propose_role.clone(),
                execute: self.execute_role.clone(),
            },
        )
        .await
    }
}
