mod cmd;

use clap::{Parser, Subcommand};
use cmd::RunArgs;

#[derive(Parser)]
#[command(
    name = "cfnpr",
    about = "Preview and apply CloudFormation changesets from pull requests",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create changesets for every declared stack and publish the diff as a
    /// PR comment
    Preview {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Create and execute changesets for every declared stack
    Apply {
        #[command(flatten)]
        args: RunArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Preview { args } => cmd::preview::run(args).await,
        Commands::Apply { args } => cmd::apply::run(args).await,
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
