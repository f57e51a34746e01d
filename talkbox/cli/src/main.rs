mod tui;

use std::io;

use clap::Parser;
use crossterm::{execute, terminal::SetTitle};
use talkbox_lib::{
    DEFAULT_RATE, MAX_RATE, MIN_RATE, SpawnedWorker, SpeechEngine, SpeechError, SpeechParameters,
    SpeechRate, SpeechSettings, SpeechWorker, SystemEngine, VoiceDescriptor, WORKER_THREAD_NAME,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::tui::{App, WINDOW_TITLE, run_app};

/// Type text and hear it spoken by the system speech engine.
///
/// Opens a terminal window with a text box, a voice dropdown and a speed
/// slider. Speech runs on a background thread, so the window stays
/// responsive and Stop interrupts it.
///
/// Examples:
///   talkbox                      # Open the window
///   talkbox --voice Samantha     # Preselect a voice
///   talkbox --rate 220           # Start at 220 words per minute
///   talkbox --list-voices        # Print available voices and exit
#[derive(Debug, Parser)]
#[command(name = "talkbox")]
#[command(version)]
#[command(about = "Type text and hear it spoken by the system speech engine")]
struct Cli {
    /// Voice to select when the window opens (falls back to the first voice).
    #[arg(long, value_name = "NAME")]
    voice: Option<String>,

    /// Initial speech speed in words per minute (50-300).
    #[arg(
        long,
        value_name = "WPM",
        default_value_t = DEFAULT_RATE,
        value_parser = clap::value_parser!(u32).range(i64::from(MIN_RATE)..=i64::from(MAX_RATE))
    )]
    rate: u32,

    /// Print the voices offered by the speech engine and exit.
    #[arg(long)]
    list_voices: bool,

    /// Enable debug logging to ~/.talkbox-debug.log.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Error)]
enum TalkboxError {
    #[error("TUI error: {0}")]
    Tui(io::Error),

    #[error("debug log error: {0}")]
    DebugLog(io::Error),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

fn main() -> Result<(), TalkboxError> {
    let cli = Cli::parse();

    // Set up debug logging if requested
    if cli.debug {
        init_debug_logging()?;
    }

    if cli.list_voices {
        return list_voices();
    }

    run_tui(&cli)
}

/// Initializes debug logging to ~/.talkbox-debug.log.
///
/// The filter defaults to `debug` and can be overridden with `RUST_LOG`.
fn init_debug_logging() -> Result<(), TalkboxError> {
    use std::fs::OpenOptions;
    use tracing_subscriber::EnvFilter;

    let home = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let log_path = home.join(".talkbox-debug.log");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(TalkboxError::DebugLog)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .with_thread_names(true)
        .init();

    Ok(())
}

/// Prints one line per engine voice.
fn list_voices() -> Result<(), TalkboxError> {
    let mut engine = SystemEngine::new()?;
    let voices = engine.list_voices()?;

    if voices.is_empty() {
        println!("No voices reported; the engine default voice will be used.");
    }
    for voice in &voices {
        println!("{}", voice_line(voice));
    }
    Ok(())
}

fn voice_line(voice: &VoiceDescriptor) -> String {
    format!(
        "{:<24} {:<10} {}",
        voice.name,
        voice.language.as_deref().unwrap_or("-"),
        voice.id
    )
}

/// Runs the TUI application with proper terminal setup and cleanup.
fn run_tui(cli: &Cli) -> Result<(), TalkboxError> {
    let settings = SpeechSettings::new(SpeechParameters {
        voice_name: cli.voice.clone(),
        rate: SpeechRate::new(cli.rate),
    });

    // The engine comes up before the terminal is taken over, so an init
    // failure is reported on a normal screen.
    let SpawnedWorker {
        worker,
        client,
        events,
        voices,
    } = SpeechWorker::spawn(SystemEngine::new, settings.clone())?;
    info!(voices = voices.len(), "speech worker started");

    let mut app = App::new(client, events, voices, settings);

    // Set up panic hook for terminal cleanup. Engine panics on the worker are
    // caught and logged there, and must not tear down the window.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().name() == Some(WORKER_THREAD_NAME) {
            error!(%info, "panic on speech worker");
            return;
        }
        ratatui::restore();
        original_hook(info);
    }));

    // Initialize terminal
    let mut terminal = ratatui::init();
    if let Err(e) = execute!(io::stdout(), SetTitle(WINDOW_TITLE)) {
        debug!(error = %e, "terminal does not accept a title");
    }

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    ratatui::restore();

    // A no-op after a normal close; covers the error path.
    app.shutdown();
    let joined = worker.join();
    debug!("speech worker joined");

    result.map_err(TalkboxError::Tui)?;
    joined.map_err(TalkboxError::Speech)
}
