//! krisinfo: a rotating crisis-information ticker for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollMsg   ┌──────────┐  tick()  ┌────────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │ rotator.rs │ ───────► │  ui.rs   │
//! │ (tokio)  │  (channel) │ (state)  │          │  (cursor)  │  frame   │ (render) │
//! └──────────┘            └──────────┘          └────────────┘          └──────────┘
//!      │ fetch() + filter()     ▲
//!      ▼                        │ handle_key_event()
//! ┌──────────┐            ┌──────────┐
//! │ source/  │            │ input.rs │
//! │ filter.rs│            └──────────┘
//! └──────────┘
//! ```
//!
//! * **`source/`**: the `FeedSource` trait, the `FeedItem` model and the
//!   Krisinformation HTTP client.
//! * **`filter`**: pure area / content filtering.
//! * **`poll`**: tokio task that fetches and filters on a timer.
//! * **`rotator`**: cursor over the latest feed; produces one frame per tick.
//! * **`app`**: owns UI-thread state and applies poller messages.
//! * **`ui`**: pure rendering of the current frame.
//! * **`input`**: maps key events to `App` actions.
//! * **`config`**: command-line flags and the optional TOML file.
//! * **`main`**: wires everything together: parse args, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod config;
mod filter;
mod input;
mod poll;
mod rotator;
mod source;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Cli, Config};
use poll::{PollMsg, PollSettings, PollerHandle};
use source::{FeedSource, KrisinformationSource};

// ---------------------------------------------------------------------------
// RAII terminal guard: restores the terminal even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Set up `tracing`.  The UI owns stdout, so logs go to `--log-file` when
/// given and nowhere otherwise; one-shot mode logs to stderr.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("krisinfo=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.once {
        builder
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e))?;
    } else if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| anyhow!(e))?;
    } else {
        builder
            .with_writer(io::sink)
            .try_init()
            .map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // -- configuration and logging -------------------------------------------
    let config = Config::load(Cli::parse())?;
    init_logging(&config)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let source = KrisinformationSource::new(&config.endpoint, config.timeout)?;
    info!(url = %source.url(), timeout_ms = config.timeout.as_millis() as u64, "feed source ready");

    if config.once {
        return runtime.block_on(print_once(source, &config));
    }

    install_panic_hook();

    // -- start background polling --------------------------------------------
    let (tx, rx) = mpsc::unbounded_channel();
    let poller = {
        let _enter = runtime.enter();
        poll::spawn(source, tx)
    };
    poller.configure(PollSettings {
        interval: config.update_interval,
        filter: config.filter.clone(),
    });

    let result = run_ui(&config, &poller, rx);

    // -- teardown: stop the poll loop, then the runtime ----------------------
    poller.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("shut down");
    result
}

/// Fetch once, filter and print to stdout.
async fn print_once(source: KrisinformationSource, config: &Config) -> Result<()> {
    let items = source.fetch().await.context("failed to fetch feed")?;
    let accepted = filter::filter(&items, &config.filter);
    info!(total = items.len(), accepted = accepted.len(), "fetched feed");

    let mut out = io::stdout().lock();
    ui::write_plain(&mut out, &accepted, config.display.show_description, Utc::now())?;
    Ok(())
}

/// The terminal event loop.
///
/// Runs at ~10 fps (100 ms tick).  Each iteration:
///   1. Drain any messages from the poller.
///   2. Rotate if the UI interval has elapsed.
///   3. Forward a pending refresh request.
///   4. Render.
///   5. Poll for keyboard input (non-blocking, up to tick_rate).
fn run_ui(
    config: &Config,
    poller: &PollerHandle,
    mut rx: mpsc::UnboundedReceiver<PollMsg>,
) -> Result<()> {
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(config.display.clone());

    let tick_rate = Duration::from_millis(100);
    let mut next_rotation = Instant::now() + config.ui_update_interval;

    loop {
        // 1. Process poll messages
        while let Ok(msg) = rx.try_recv() {
            app.handle_poll_msg(msg, Utc::now());
        }

        // 2. Rotate
        if Instant::now() >= next_rotation {
            app.rotate(Utc::now());
            next_rotation = Instant::now() + config.ui_update_interval;
        }

        // 3. Refresh on demand
        if app.take_refresh_request() {
            poller.refresh_now();
        }

        // 4. Render
        let now = Utc::now();
        guard.terminal.draw(|f| ui::draw(&app, f, now))?;

        // 5. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key, Utc::now());
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
