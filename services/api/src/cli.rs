use crate::demo::{run_demo, run_screen, DemoArgs, ScreenArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use riskgate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Risk Screening Gateway",
    about = "Run and demonstrate the hybrid risk screening service from the command line",
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
    /// Screen a CSV dataset or a single JSON subject and print each verdict
    Screen(ScreenArgs),
    /// Run an end-to-end CLI demo with a scripted advisory model
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
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => run_screen(args),
        Command::Demo(args) => run_demo(args),
    }
}
