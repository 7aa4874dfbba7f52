use crate::demo::{run_backup, run_demo, BackupArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use interior::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Interior Rental Marketplace",
    about = "Run and exercise the Interior space-rental marketplace from the command line",
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
    /// Run an end-to-end CLI demo covering search, booking, and prepayment
    Demo(DemoArgs),
    /// Write a database dump for the demo data set
    Backup(BackupArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Backup(args) => run_backup(args).await,
    }
}
