//! Command-line interface implementation

use clap::Parser;
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, ExecutableCommand};
use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::surface::ForegroundSurface;
use crate::notification::{NotificationShade, TapTarget};
use crate::service::{ControlChannel, PlaybackService};

const LOG_TARGET: &str = "timeplayer::ui";

/// Command-line arguments for timeplayer
#[derive(Parser, Debug)]
#[command(author, version, about = "Single-track terminal audio player", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, env = "TIMEPLAYER_CONFIG")]
    pub config: Option<String>,

    /// ALSA device to use (overrides the config file)
    #[arg(short = 'd', long, env = "TIMEPLAYER_ALSA_DEVICE")]
    pub alsa_device: Option<String>,

    /// Elapsed-time refresh interval in milliseconds (overrides the config file)
    #[arg(short, long = "refresh-ms", env = "TIMEPLAYER_REFRESH_MS")]
    pub refresh_ms: Option<u64>,

    /// Log filter, e.g. "timeplayer=debug" (falls back to RUST_LOG)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// One line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    TapButton,
    TapNotificationAction,
    TapNotificationBody,
    ShowState,
    Quit,
    Unknown,
}

pub fn parse_input(line: &str) -> UserInput {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | "play" | "pause" => UserInput::TapButton,
        "n" => UserInput::TapNotificationAction,
        "o" | "open" => UserInput::TapNotificationBody,
        "s" | "state" => UserInput::ShowState,
        "q" | "quit" | "exit" => UserInput::Quit,
        _ => UserInput::Unknown,
    }
}

/// Terminal front end: renders the surface and the notification shade, and
/// turns typed lines into taps.
pub struct Cli {
    surface: ForegroundSurface,
    shade: NotificationShade,
}

impl Cli {
    pub fn new(shade: NotificationShade) -> Self {
        Cli {
            surface: ForegroundSurface::new(),
            shade,
        }
    }

    pub fn surface(&self) -> &ForegroundSurface {
        &self.surface
    }

    /// Runs until the user quits, stdin closes, Ctrl+C, or the service goes away.
    pub async fn run(&mut self, service: &PlaybackService) -> Result<(), Box<dyn Error>> {
        let control = service.bind()?;
        let mut state_rx = service.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.print_help()?;
        self.render()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!(target: LOG_TARGET, "Stdin closed.");
                        break;
                    };
                    if !self.handle_input(parse_input(&line), &control).await? {
                        break;
                    }
                }
                change = state_rx.recv() => {
                    match change {
                        Ok(change) => {
                            debug!(target: LOG_TARGET, "Surface received: {:?}", change);
                            self.surface.apply(&change);
                            self.render()?;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(target: LOG_TARGET, "Surface lagged behind by {} updates.", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!(target: LOG_TARGET, "Playback service closed its event channel.");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!(target: LOG_TARGET, "Ctrl+C received.");
                    break;
                }
            }
        }

        println!();
        Ok(())
    }

    /// Returns `false` when the user asked to quit.
    async fn handle_input(&mut self, input: UserInput, control: &ControlChannel) -> Result<bool, Box<dyn Error>> {
        match input {
            UserInput::TapButton => {
                // Delivery failures are logged by the channel; the surface just waits for events.
                let _ = control.toggle().await;
            }
            UserInput::TapNotificationAction => match self.shade.current() {
                Some(descriptor) => {
                    let _ = control.dispatch(descriptor.action.command).await;
                }
                None => self.message("No notification to act on.")?,
            },
            UserInput::TapNotificationBody => match self.shade.current().map(|d| d.content_target) {
                Some(TapTarget::ForegroundSurface) => {
                    self.print_help()?;
                    self.render()?;
                }
                None => self.message("No notification to open.")?,
            },
            UserInput::ShowState => match control.state().await {
                Ok(state) => self.message(&format!("{:?}", state))?,
                Err(e) => self.message(&format!("State unavailable: {}", e))?,
            },
            UserInput::Quit => return Ok(false),
            UserInput::Unknown => self.message("Unknown command.")?,
        }
        Ok(true)
    }

    fn print_help(&self) -> io::Result<()> {
        println!("timeplayer: <enter>/p play-pause, n notification action, o open, s state, q quit");
        Ok(())
    }

    fn message(&self, text: &str) -> io::Result<()> {
        println!();
        println!("{}", text);
        self.render()
    }

    /// Redraws the status line in place.
    fn render(&self) -> io::Result<()> {
        let notification = self.shade.current();
        let mut stdout = io::stdout();
        stdout
            .execute(cursor::MoveToColumn(0))?
            .execute(terminal::Clear(ClearType::CurrentLine))?;
        print!("{}", self.surface.render(notification.as_ref()));
        stdout.flush()
    }
}
