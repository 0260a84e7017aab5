use crate::commands::{run_batch, run_match, run_policies, BatchArgs, MatchArgs, PoliciesArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lender_match::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Lender Match",
    about = "Match equipment finance applications against lender policies",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single application and print the ranked lender results
    Match(MatchArgs),
    /// Evaluate every application in a CSV export
    Batch(BatchArgs),
    /// List and validate the lender policy catalog
    Policies(PoliciesArgs),
    /// Run sample applications through the bundled lender catalog
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON lender policy catalog (defaults to APP_POLICY_FILE, then the bundled catalog)
    #[arg(long)]
    pub(crate) policy_file: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Match(args) => run_match(args),
        Command::Batch(args) => run_batch(args),
        Command::Policies(args) => run_policies(args),
        Command::Demo(args) => run_demo(args),
    }
}
