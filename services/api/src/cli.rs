use crate::demo::{run_demo, run_emi, run_export, DemoArgs, EmiArgs, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_origination::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Origination Desk",
    about = "Run and demonstrate the loan origination workflow from the command line",
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
    /// Quote the monthly installment for a loan
    Emi(EmiArgs),
    /// Walk an applicant through the wizard and a reviewer through the decision
    Demo(DemoArgs),
    /// Work with the application register
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ApplicationsCommand {
    /// Export the register of the seeded desk as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the simulated backend latency in milliseconds
    #[arg(long)]
    pub(crate) latency_ms: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Emi(args) => run_emi(args),
        Command::Demo(args) => run_demo(args),
        Command::Applications {
            command: ApplicationsCommand::Export(args),
        } => run_export(args),
    }
}
