//! # Sessions
//!
//! The terminal side of the agent: picking a run mode, then either the
//! interactive chat loop or the autonomous loop. Every blocking point
//! (reading a line, draining a stream, sleeping) races the cancellation
//! token, so an interrupt always ends the session cleanly.

use crate::chunk::SessionConfig;
use crate::executor::AgentExecutor;
use chainbot_error::{Error, ErrorKind, Result};
use chainbot_llm::ChatMessage;
use futures_util::StreamExt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Printed after every chunk
pub const SEPARATOR: &str = "-------------------";

/// Printed once when the user interrupts a session
pub const FAREWELL: &str = "Goodbye Agent!";

/// The message sent on every autonomous cycle
pub const AUTONOMOUS_PROMPT: &str = "Be creative and do something interesting on the blockchain. \
Choose an action or set of actions and execute it that highlights your abilities.";

/// Pause between autonomous cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// How the session runs. Chosen once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Chat,
    Autonomous,
}

impl RunMode {
    /// Accepts `1`/`chat` and `2`/`auto`, ignoring case and surrounding space
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "1" | "chat" => Some(RunMode::Chat),
            "2" | "auto" => Some(RunMode::Autonomous),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Chat => "chat",
            RunMode::Autonomous => "auto",
        }
    }
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::config_invalid(format!("unknown mode '{}', expected chat or auto", s.trim()))
        })
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The user typed `exit` or input ran out
    Exited,
    /// The cancellation token fired
    Interrupted,
}

enum Input {
    Line(String),
    Closed,
    Cancelled,
}

async fn read_input<R>(input: &mut R, cancel: &CancellationToken) -> Result<Input>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        read = input.read_line(&mut line) => Some(read),
    };
    match read {
        None => Ok(Input::Cancelled),
        Some(Ok(0)) => Ok(Input::Closed),
        Some(Ok(_)) => Ok(Input::Line(line)),
        Some(Err(e)) => Err(Error::new(ErrorKind::IoFailed, "failed to read from terminal")
            .with_operation("session::read_input")
            .set_source(e)),
    }
}

fn write_failed(e: std::io::Error) -> Error {
    Error::new(ErrorKind::IoFailed, "failed to write to terminal")
        .with_operation("session::write")
        .set_source(e)
}

/// Ask for a run mode until a valid one is entered.
///
/// Returns `None` if the token fires while waiting.
pub async fn choose_mode<R, W>(
    input: &mut R,
    output: &mut W,
    cancel: &CancellationToken,
) -> Result<Option<RunMode>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        writeln!(output, "\nAvailable modes:").map_err(write_failed)?;
        writeln!(output, "1. chat    - Interactive chat mode").map_err(write_failed)?;
        writeln!(output, "2. auto    - Autonomous action mode").map_err(write_failed)?;
        write!(output, "\nChoose a mode (enter number or name): ").map_err(write_failed)?;
        output.flush().map_err(write_failed)?;

        match read_input(input, cancel).await? {
            Input::Cancelled => return Ok(None),
            Input::Closed => {
                return Err(Error::new(
                    ErrorKind::InputClosed,
                    "input closed before a mode was chosen",
                )
                .with_operation("session::choose_mode"))
            }
            Input::Line(line) => match RunMode::parse(&line) {
                Some(mode) => {
                    debug!(mode = %mode, "mode selected");
                    return Ok(Some(mode));
                }
                None => writeln!(output, "Invalid choice. Please try again.").map_err(write_failed)?,
            },
        }
    }
}

/// Send one message and print every chunk it produces.
///
/// Returns `false` if the token fired before the stream finished.
async fn dispatch<W: Write>(
    executor: &dyn AgentExecutor,
    message: ChatMessage,
    config: &SessionConfig,
    output: &mut W,
    cancel: &CancellationToken,
) -> Result<bool> {
    let mut stream = executor.stream(message, config);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(false),
            next = stream.next() => next,
        };
        match next {
            None => return Ok(true),
            Some(Err(e)) => return Err(e),
            Some(Ok(chunk)) => {
                writeln!(output, "{}", chunk.first_text()).map_err(write_failed)?;
                writeln!(output, "{}", SEPARATOR).map_err(write_failed)?;
                output.flush().map_err(write_failed)?;
            }
        }
    }
}

/// Interactive loop: read a prompt, stream the answer, repeat until `exit`.
pub async fn run_chat_mode<R, W>(
    executor: &dyn AgentExecutor,
    config: &SessionConfig,
    input: &mut R,
    output: &mut W,
    cancel: &CancellationToken,
) -> Result<SessionOutcome>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!(thread = %config.thread_id, "chat mode started");
    writeln!(output, "Starting chat mode... Type 'exit' to end.").map_err(write_failed)?;

    loop {
        write!(output, "\nPrompt: ").map_err(write_failed)?;
        output.flush().map_err(write_failed)?;

        let line = match read_input(input, cancel).await? {
            Input::Cancelled => return Ok(SessionOutcome::Interrupted),
            Input::Closed => return Ok(SessionOutcome::Exited),
            Input::Line(line) => line,
        };
        if line.trim().eq_ignore_ascii_case("exit") {
            return Ok(SessionOutcome::Exited);
        }

        let prompt = line.trim_end_matches(['\r', '\n']);
        if !dispatch(executor, ChatMessage::user(prompt), config, output, cancel).await? {
            return Ok(SessionOutcome::Interrupted);
        }
    }
}

/// Unattended loop: send the fixed prompt every `interval` until interrupted.
pub async fn run_autonomous_mode<W: Write>(
    executor: &dyn AgentExecutor,
    config: &SessionConfig,
    interval: Duration,
    output: &mut W,
    cancel: &CancellationToken,
) -> Result<SessionOutcome> {
    info!(thread = %config.thread_id, interval_secs = interval.as_secs(), "autonomous mode started");
    writeln!(output, "Starting autonomous mode...").map_err(write_failed)?;

    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        debug!(cycle, "autonomous cycle");

        let message = ChatMessage::user(AUTONOMOUS_PROMPT);
        if !dispatch(executor, message, config, output, cancel).await? {
            return Ok(SessionOutcome::Interrupted);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(SessionOutcome::Interrupted),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
