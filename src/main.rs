use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use beatbox::audio;
use beatbox::capture;
use beatbox::config::{self, Config};
use beatbox::middle::Middle;
use beatbox::pipeline::CommandGenerator;
use beatbox::shared::InputEvent;
use beatbox::tui;

const LOG_FILE: &str = "beatbox.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// stdout belongs to the terminal ui, so logs go to a file
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let file = File::create(LOG_FILE).with_context(|| format!("creating {LOG_FILE}"))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("no working directory")?,
    };
    let config = config::load_config(&project_dir)?;
    init_logging(&config)?;
    let recordings_dir = config.recordings_dir(&project_dir);

    // no audio, no app
    let (audio, mut analyser) = audio::start_audio(config.master_gain).context("starting audio output")?;

    let mut middle = Middle::new(audio, config.tempo, config.capture_stop_timeout());
    if let Some(cmd) = &config.generator_command {
        let generator = CommandGenerator::new(cmd.program.clone(), cmd.args.clone());
        middle = middle.with_generator(Arc::new(generator), config.prompt.clone());
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        middle.tick();
        save_finished(&mut middle, &recordings_dir);

        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();
        let spectrum = analyser.frequency_data();
        term.draw(|frame| {
            let area = frame.area();
            tui::view::render(frame, area, &ds, &tui_state, spectrum, blink_on);
        })?;

        for event in tui::input::poll_input(tick_rate, &mut tui_state)? {
            let quit = event == InputEvent::Quit;
            middle.handle_input(event);
            if quit {
                // quitting stops playback, which closes any open capture
                save_finished(&mut middle, &recordings_dir);
                tracing::info!("quit");
                return Ok(());
            }
        }
    }
}

fn save_finished<B: beatbox::audio_api::AudioBackend>(middle: &mut Middle<B>, dir: &std::path::Path) {
    for clip in middle.take_finished_clips() {
        if let Err(e) = capture::save_clip(dir, &clip) {
            tracing::warn!("could not save clip to {}: {e}", dir.display());
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
