use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interaction::{InteractionSession, SessionOptions, SimulatedGestureDevice};
use tracing::info;

mod config;
mod script;

use config::load_settings;
use script::{Script, Simulation};

#[derive(Parser, Debug)]
#[command(name = "mr-sim", about = "Replays scripted gaze, gesture and voice input")]
struct Cli {
    /// Settings file; defaults to ./mr-sim.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script and print one JSON line per event.
    Run { script: PathBuf },
    /// List the phrases the speech recognizer listens for.
    Phrases,
}

fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Run { script } => {
            let raw = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script '{}'", script.display()))?;
            let parsed = Script::from_toml(&raw)
                .with_context(|| format!("invalid script '{}'", script.display()))?;
            info!(
                script = %script.display(),
                steps = parsed.steps.len(),
                "running script"
            );

            let mut simulation = Simulation::build(&parsed.entities, &settings)?;
            let stdout = io::stdout();
            simulation.run(&parsed.steps, &mut stdout.lock())?;
            info!(
                focused = ?simulation.session().focused(),
                vocabulary = simulation.session().active_vocabulary().as_str(),
                "script finished"
            );
            simulation.shutdown()?;
        }
        Command::Phrases => {
            let session = InteractionSession::new(
                SimulatedGestureDevice::new().factory(),
                SessionOptions {
                    keyword_bindings: settings.keywords,
                    ..SessionOptions::default()
                },
            );
            for phrase in session.phrases() {
                println!("{phrase}");
            }
        }
    }

    Ok(())
}
