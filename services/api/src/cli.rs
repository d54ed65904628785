use crate::demo::{run_demo, run_score, DemoArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vyapar_scoring::config::{ScoringConfig, ScoringMode};
use vyapar_scoring::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Vyapar Scoring",
    about = "Serve and exercise the business scoring endpoints from the command line",
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
    /// Score a single JSON payload without starting the server
    Score(ScoreArgs),
    /// Run canned payloads through every scoring endpoint
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
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

/// Scoring overrides shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct EngineArgs {
    /// Override the scoring mode (auto, heuristic, strict)
    #[arg(long, value_parser = parse_mode)]
    pub(crate) mode: Option<ScoringMode>,
    /// Override the directory holding the model artifacts
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
}

impl EngineArgs {
    pub(crate) fn apply(self, config: &mut ScoringConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(model_dir) = self.model_dir {
            config.model_dir = model_dir;
        }
    }
}

fn parse_mode(raw: &str) -> Result<ScoringMode, String> {
    ScoringMode::parse(raw).map_err(|err| err.to_string())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Demo(args) => run_demo(args),
    }
}
