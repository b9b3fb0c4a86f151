use anyhow::Result;
use clap::{Parser, Subcommand};
use podium_execution::{LogFormat, LogForwardLayer, init_tracing};
use std::path::PathBuf;
use tokio::sync::mpsc;

mod commands;

#[derive(Parser)]
#[command(name = "podium")]
#[command(about = "Podium - live audience simulation for speech rehearsal", long_about = None)]
struct Cli {
    /// Engine configuration file (defaults to $PODIUM_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a speech into a simulated room and print every event as JSON
    Simulate(commands::simulate::SimulateArgs),
    /// Print a persona pool for a topic as JSON
    Personas {
        /// Presentation topic
        #[arg(long, default_value = commands::DEFAULT_TOPIC)]
        topic: String,
        /// Number of personas to request
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Skip the generator and print the built-in pool
        #[arg(long)]
        offline: bool,
    },
    /// Print the effective engine configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    let (sender, warnings) = mpsc::unbounded_channel();
    init_tracing(
        format,
        "info",
        Some(LogForwardLayer::new(sender, tracing::Level::WARN)),
    );

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, cli.config, warnings).await?,
        Commands::Personas {
            topic,
            count,
            offline,
        } => commands::personas::run(&topic, count, offline).await?,
        Commands::Config => commands::config::show(cli.config)?,
    }

    Ok(())
}
