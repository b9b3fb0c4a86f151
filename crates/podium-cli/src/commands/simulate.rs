use anyhow::{Context, Result};
use clap::Args;
use podium_application::{BotSpawner, LiveAudience};
use podium_core::reaction::ReactionGenerator;
use podium_execution::LogRecord;
use podium_infrastructure::ConfigService;
use podium_interaction::{OfflineReactionGenerator, OpenAiCoach, OpenAiReactionGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::DEFAULT_TOPIC;
use super::personas::persona_generator;

const DEFAULT_SPEECH: [&str; 3] = [
    "Good morning everyone. Today we are going to discuss our quarterly results.",
    "As you can see, we have exceeded our targets in every key metric.",
    "This success is a testament to the hard work of every single person on this team.",
];

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of bots to spawn
    #[arg(long, default_value_t = 3)]
    bots: usize,

    /// Presentation topic used for the persona pool
    #[arg(long, default_value = DEFAULT_TOPIC)]
    topic: String,

    /// Speech script, one fragment per line
    #[arg(long)]
    script: Option<PathBuf>,

    /// Delay between fragments
    #[arg(long, default_value_t = 1500)]
    pause_ms: u64,

    /// Room to simulate
    #[arg(long, default_value = "rehearsal")]
    room: String,

    /// Never call the generator; every escalation falls back to the heuristic
    #[arg(long)]
    offline: bool,
}

fn load_script(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(DEFAULT_SPEECH.iter().map(|line| line.to_string()).collect());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn reaction_generator(offline: bool) -> Arc<dyn ReactionGenerator> {
    if offline {
        return Arc::new(OfflineReactionGenerator);
    }
    match OpenAiReactionGenerator::try_from_env() {
        Ok(generator) => Arc::new(generator),
        Err(err) => {
            tracing::warn!("Reaction generation unavailable, running offline: {}", err);
            Arc::new(OfflineReactionGenerator)
        }
    }
}

pub async fn run(
    args: SimulateArgs,
    config_path: Option<PathBuf>,
    mut warnings: mpsc::UnboundedReceiver<LogRecord>,
) -> Result<()> {
    let config = ConfigService::new(config_path)
        .get_config()
        .context("Failed to load engine configuration")?;
    let script = load_script(args.script.as_deref())?;
    let room = args.room.as_str();

    let audience = LiveAudience::new(config, reaction_generator(args.offline));
    if !args.offline {
        match OpenAiCoach::try_from_env() {
            Ok(coach) => audience.attach_coach(room, Arc::new(coach)),
            Err(err) => tracing::info!("Coach disabled: {}", err),
        }
    }

    let observer = audience.connect(room)?;
    let observer_id = observer.id;
    let mut receiver = observer.receiver;
    let printer = tokio::spawn(async move {
        while let Some(envelope) = receiver.recv().await {
            println!("{envelope}");
        }
    });

    let spawner = BotSpawner::new(persona_generator(args.offline));
    spawner.spawn(&audience, room, &args.topic, args.bots).await;

    for line in &script {
        audience.ingest(room, line);
        tokio::time::sleep(Duration::from_millis(args.pause_ms)).await;
    }
    audience.flush(room);
    audience.wait_idle().await;
    audience.end_session(room).await;

    audience.hub().disconnect(room, observer_id);
    printer.await.context("Event printer stopped unexpectedly")?;

    let mut warning_count = 0;
    while warnings.try_recv().is_ok() {
        warning_count += 1;
    }
    let snapshot = audience.snapshot(room);
    let present = snapshot.bots.iter().filter(|bot| bot.present).count();
    eprintln!(
        "Simulation finished: {} chunks, {}/{} bots still present, {} warnings",
        snapshot.history_len,
        present,
        snapshot.bots.len(),
        warning_count
    );
    Ok(())
}
