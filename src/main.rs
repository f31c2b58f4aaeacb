//! Interactive host for exercising the controller from a terminal.
//!
//! Runs a [`ThreadDispatcher`] as the UI context, prints every overlay with a
//! [`ConsoleRenderer`], and reads commands from standard input:
//!
//! | Command                       | Effect                                        |
//! |-------------------------------|-----------------------------------------------|
//! | `error <message>`             | native exception                              |
//! | `js <id> <title> [\| <json>]` | scripted error, optional JSON stack payload   |
//! | `update <id> <title>`         | update the scripted error `id`                |
//! | `shake`                       | feed a shake to the accelerometer detector    |
//! | `menu`                        | open the debug menu directly                  |
//! | `select <n>`                  | pick menu entry `n`                           |
//! | `dismiss`                     | dismiss the red box as a user would           |
//! | `reload`                      | request a reload                              |
//! | `enable` / `disable`          | toggle developer support                      |
//! | `quit`                        | shut down and exit                            |
//!
//! `help` lists the commands. The optional first argument is a TOML
//! configuration file; `--help` and `--version` are handled by `clap`.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use devsupport::bundle::DevCommandsHandler;
use devsupport::dispatcher::ThreadDispatcher;
use devsupport::gesture::{AccelerationSample, ShakeDetector};
use devsupport::observability::init_tracing;
use devsupport::ui::ConsoleRenderer;
use devsupport::{Config, DevSupportManager, Result};
use serde_json::Value as JsonValue;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "devsupport", version)]
#[command(about = "Drive the developer-support controller from a terminal")]
struct Args {
    /// TOML configuration file
    config: Option<PathBuf>,
}

/// One line of interactive input; the first word is the command.
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Report a native exception
    Error {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Report a scripted error: js <id> <title> [| <json stack>]
    Js {
        id: i64,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Update the title of scripted error <id>
    Update {
        id: i64,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        title: Vec<String>,
    },
    /// Feed a shake to the accelerometer detector
    Shake,
    /// Open the debug menu directly
    Menu,
    /// Pick menu entry <index>
    Select { index: usize },
    /// Dismiss the red box as a user would
    Dismiss,
    /// Request a reload
    Reload,
    /// Turn developer support on
    Enable,
    /// Turn developer support off
    Disable,
    /// Shut down and exit
    #[command(alias = "exit")]
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    Line::try_parse_from(words).map(|line| Some(line.command))
}

/// Splits `title words | json` into the title and the stack payload.
fn split_stack(words: &[String]) -> Result<(String, JsonValue)> {
    let text = words.join(" ");
    match text.split_once('|') {
        Some((title, json)) => Ok((title.trim().to_string(), serde_json::from_str(json.trim())?)),
        None => Ok((text, JsonValue::Array(Vec::new()))),
    }
}

fn shake(detector: &ShakeDetector, started: Instant) {
    let base = started.elapsed();
    for step in 0..3 {
        detector.on_sample(AccelerationSample {
            x: 3.0,
            y: 0.0,
            z: 1.0,
            timestamp: base + Duration::from_millis(step * 50),
        });
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = match args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    let dispatcher = Arc::new(ThreadDispatcher::spawn("devsupport-ui")?);
    let renderer = ConsoleRenderer::stderr();
    let detector = ShakeDetector::default();
    let manager = DevSupportManager::builder(config, dispatcher, Arc::new(renderer.clone()), Arc::new(LoggingHost))
        .gesture(detector.clone())
        .build();

    let started = Instant::now();
    for line in io::stdin().lock().lines() {
        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                // Also covers `help`.
                let _ = e.print();
                continue;
            }
        };

        match command {
            Command::Error { message } => {
                if let Err(e) = manager.handle_exception(io::Error::other(message.join(" "))) {
                    eprintln!("uncaught: {e}");
                }
            }
            Command::Js { id, words } => {
                let (title, stack) = match split_stack(&words) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                if let Err(e) = manager.report_scripted_error(title, stack, id) {
                    eprintln!("uncaught: {e}");
                }
            }
            Command::Update { id, title } => {
                manager.update_scripted_error(title.join(" "), &JsonValue::Array(Vec::new()), id);
            }
            Command::Shake => shake(&detector, started),
            Command::Menu => manager.show_dev_menu(),
            Command::Select { index } => {
                if !renderer.select_menu_entry(index) {
                    eprintln!("no menu entry {index}");
                }
            }
            Command::Dismiss => {
                renderer.dismiss_red_box();
            }
            Command::Reload => manager.request_reload(),
            Command::Enable => manager.set_enabled(true),
            Command::Disable => manager.set_enabled(false),
            Command::Quit => break,
        }
    }

    manager.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("devsupport: {e}");
            ExitCode::FAILURE
        }
    }
}
