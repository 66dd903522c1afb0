//! # chainbot CLI
//!
//! Runs the chainbot agent in the terminal.
//!
//! Usage:
//!   chainbot                 # pick a mode from the menu
//!   chainbot --mode chat
//!   chainbot --mode auto --interval 30
//!   chainbot --llm openai --model gpt-4o-mini
//!
//! Credentials come from the environment (or `.env`): `CDP_API_KEY_NAME`,
//! `CDP_API_KEY_PRIVATE_KEY`, and `GROQ_API_KEY` or `OPENAI_API_KEY`.

mod config;
mod init;

use chainbot_agent::{
    choose_mode, run_autonomous_mode, run_chat_mode, RunMode, SessionOutcome, FAREWELL,
};
use clap::Parser;
use config::Config;
use std::io::Write;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

/// Cancel `token` on the first Ctrl-C
fn spawn_interrupt_watcher(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("interrupt received");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });
}

async fn run(config: Config) -> chainbot_error::Result<SessionOutcome> {
    let (agent, session) = init::initialize(&config)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();

    let mode = match config.mode {
        Some(mode) => mode,
        None => match choose_mode(&mut input, &mut output, &cancel).await? {
            Some(mode) => mode,
            None => return Ok(SessionOutcome::Interrupted),
        },
    };
    info!(mode = %mode, "starting session");

    match mode {
        RunMode::Chat => run_chat_mode(&agent, &session, &mut input, &mut output, &cancel).await,
        RunMode::Autonomous => {
            run_autonomous_mode(&agent, &session, config.interval(), &mut output, &cancel).await
        }
    }
}

/// Report how the session ended and pick the process exit code.
fn finish(
    result: chainbot_error::Result<SessionOutcome>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> i32 {
    match result {
        Ok(SessionOutcome::Exited) => 0,
        Ok(SessionOutcome::Interrupted) => {
            let _ = writeln!(out, "{}", FAREWELL);
            0
        }
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    // The env file path is itself a flag, so parse once to find it, load it,
    // then parse again so its values feed the `env` fallbacks.
    let env_file = Config::parse().env_file;
    let dotenv = dotenvy::from_filename(&env_file);
    init_logging();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => debug!(path = %env_file.display(), "no environment file"),
        Err(e) => warn!(path = %env_file.display(), error = %e, "failed to load environment file"),
    }
    let config = Config::parse();

    println!("Starting Agent...");
    let result = run(config).await;
    let code = finish(result, &mut std::io::stdout(), &mut std::io::stderr());
    // A cancelled stdin read keeps its blocking thread alive, which would
    // stall runtime shutdown until the next newline.
    std::process::exit(code);
}
