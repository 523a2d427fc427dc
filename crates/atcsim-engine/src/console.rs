//! Controller console.
//!
//! Reads controller lines from stdin and turns them into
//! [`ControlRequest`]s for the engine task, or operator actions for the
//! shared [`OperatorState`]. Replies are printed to stdout; `status` and
//! `log` print JSON.
//!
//! ```text
//! select <callsign>      runway <id>        runway-takeoff <id>
//! taxi <point>           hold               wait-airspace
//! status                 log                pause    resume    quit
//! rate <ms>
//! ```

use std::io::BufRead;
use std::sync::Arc;

use atcsim_core::{CommandError, ControlRequest, EventSink, OperatorState};
use atcsim_types::LogEvent;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Usage text printed by `help`.
const USAGE: &str = "\
commands:
  select <callsign>      select an aircraft
  runway <id>            clear the selection to land
  runway-takeoff <id>    clear the selection for takeoff
  taxi <point>           clear the selection to taxi to a waiting point
  hold                   hold position
  wait-airspace          hold in the airspace
  status                 print the engine snapshot as JSON
  log                    print the activity log as JSON lines
  pause | resume         freeze or continue the simulation
  rate <ms>              set the delay between frames (0 = flat out)
  quit                   stop the simulation";

/// Errors from parsing a console line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The first word is not a console command.
    #[error("unknown console command: {0} (try `help`)")]
    UnknownCommand(String),

    /// The frame delay is not a whole number of milliseconds.
    #[error("not a frame delay in milliseconds: {0}")]
    BadRate(String),

    /// The command needs an argument that was not given.
    #[error("`{command}` needs an argument")]
    MissingArgument {
        /// The command missing its argument.
        command: String,
    },
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Select an aircraft.
    Select(String),
    /// A controller command for the selection.
    Controller {
        /// Command name as the engine parses it.
        name: String,
        /// Runway or waiting-point code; empty for argument-less commands.
        value: String,
    },
    /// Print the snapshot.
    Status,
    /// Print the activity log.
    Log,
    /// Pause the tick loop.
    Pause,
    /// Resume the tick loop.
    Resume,
    /// Change the delay between frames.
    Rate(u64),
    /// Stop the simulation.
    Quit,
    /// Print usage.
    Help,
}

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let required = |command: &str| {
        arg.map(str::to_owned)
            .ok_or_else(|| ConsoleError::MissingArgument {
                command: command.to_owned(),
            })
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "select" => ConsoleCommand::Select(required("select")?),
        name @ ("runway" | "runway-takeoff" | "taxi") => ConsoleCommand::Controller {
            name: name.to_owned(),
            value: required(name)?,
        },
        name @ ("hold" | "wait-airspace") => ConsoleCommand::Controller {
            name: name.to_owned(),
            value: String::new(),
        },
        "status" => ConsoleCommand::Status,
        "log" => ConsoleCommand::Log,
        "pause" => ConsoleCommand::Pause,
        "resume" => ConsoleCommand::Resume,
        "rate" => {
            let raw = required("rate")?;
            match raw.parse() {
                Ok(ms) => ConsoleCommand::Rate(ms),
                Err(_) => return Err(ConsoleError::BadRate(raw)),
            }
        }
        "quit" | "exit" => ConsoleCommand::Quit,
        "help" | "?" => ConsoleCommand::Help,
        other => return Err(ConsoleError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(command))
}

/// Render a log entry as one console line.
pub fn render_event(event: &LogEvent) -> String {
    format!(
        "[{}] [{}] {}",
        event.at.format("%H:%M:%S"),
        event.severity,
        event.message
    )
}

/// Event sink that prints every controller log entry as it happens.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn on_event(&mut self, event: &LogEvent) {
        println!("{}", render_event(event));
    }
}

/// Spawn a thread that forwards stdin lines into a channel.
///
/// The thread ends at EOF or when the receiver is dropped. It is detached,
/// so a pending read never holds the process open.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the console until `quit`, EOF, or the engine task goes away.
pub async fn run(
    mut lines: mpsc::Receiver<String>,
    requests: mpsc::Sender<ControlRequest>,
    operator: Arc<OperatorState>,
) {
    println!("{USAGE}");
    while let Some(line) = lines.recv().await {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        debug!(?command, "Console command");
        match execute(command, &requests, &operator).await {
            Flow::Continue => {}
            Flow::Quit => break,
        }
    }
    info!("Console closed, requesting stop");
    operator.request_stop();
}

/// Whether the console keeps reading.
enum Flow {
    Continue,
    Quit,
}

async fn execute(
    command: ConsoleCommand,
    requests: &mpsc::Sender<ControlRequest>,
    operator: &OperatorState,
) -> Flow {
    match command {
        ConsoleCommand::Select(callsign) => {
            let (reply, outcome) = oneshot::channel();
            let request = ControlRequest::Select {
                callsign: callsign.clone(),
                reply: Some(reply),
            };
            match round_trip(requests, request, outcome).await {
                Some(Ok(())) => println!("{callsign} selected"),
                Some(Err(err)) => println!("{err}"),
                None => return Flow::Quit,
            }
        }
        ConsoleCommand::Controller { name, value } => {
            let (reply, outcome) = oneshot::channel();
            let request = ControlRequest::Command {
                name,
                value,
                reply: Some(reply),
            };
            // Accepted and rejected commands are both echoed by the sink.
            if round_trip::<Result<(), CommandError>>(requests, request, outcome)
                .await
                .is_none()
            {
                return Flow::Quit;
            }
        }
        ConsoleCommand::Status => {
            let (reply, snapshot) = oneshot::channel();
            let Some(snapshot) =
                round_trip(requests, ControlRequest::Snapshot(reply), snapshot).await
            else {
                return Flow::Quit;
            };
            match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!(error = %err, "Failed to serialize snapshot"),
            }
        }
        ConsoleCommand::Log => {
            let (reply, entries) = oneshot::channel();
            let Some(entries) = round_trip(requests, ControlRequest::Log(reply), entries).await
            else {
                return Flow::Quit;
            };
            for entry in &entries {
                match serde_json::to_string(entry) {
                    Ok(json) => println!("{json}"),
                    Err(err) => warn!(error = %err, "Failed to serialize log entry"),
                }
            }
        }
        ConsoleCommand::Pause => {
            operator.pause();
            println!("paused");
        }
        ConsoleCommand::Resume => {
            operator.resume();
            println!("resumed");
        }
        ConsoleCommand::Rate(ms) => {
            operator.set_frame_interval_ms(ms);
            println!("frame delay {ms} ms");
        }
        ConsoleCommand::Quit => return Flow::Quit,
        ConsoleCommand::Help => println!("{USAGE}"),
    }
    Flow::Continue
}

/// Send a request and wait for its reply. `None` means the engine task
/// has ended.
async fn round_trip<V>(
    requests: &mpsc::Sender<ControlRequest>,
    request: ControlRequest,
    reply: oneshot::Receiver<V>,
) -> Option<V> {
    if requests.send(request).await.is_err() {
        warn!("Engine task is gone");
        return None;
    }
    reply.await.ok()
}
