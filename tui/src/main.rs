mod app;
mod idle;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use iris_client_rs::logging::{LogConfig, RotationPeriod, setup_file_logging};
use iris_client_rs::settings::Settings;
use iris_client_rs::{BridgeClientTrait, BridgeStore, HttpBridgeClient};
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{info, warn};

use crate::app::App;
use crate::idle::IdleTracker;

/// Redraw period while no input arrives, so refreshed data and idle dimming
/// show up.
const FRAME_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
struct Params {
    /// Base URL of the bridge-control service (default from settings)
    #[clap(long, env = "IRIS_API_URL")]
    api_url: Option<String>,
    /// Settings file path (if not set, default settings are used)
    #[clap(long)]
    settings: Option<PathBuf>,
    /// Directory for log files
    #[clap(long, default_value = ".")]
    log_dir: String,
    /// Log rotation: hourly, daily or never
    #[clap(long, default_value = "daily")]
    log_rotation: RotationPeriod,
    /// Number of log files to keep (0 keeps all)
    #[clap(long, default_value = "7")]
    max_log_files: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let params = Params::parse();
    let _log_guard = setup_file_logging(LogConfig {
        log_dir: params.log_dir.clone(),
        rotation: params.log_rotation,
        max_log_files: params.max_log_files,
        ..Default::default()
    })?;

    let mut settings = Settings::load(params.settings.as_deref());
    if let Some(api_url) = params.api_url {
        settings.api_url = api_url;
    }
    info!("Starting panel against {}", settings.api_url);

    let client = HttpBridgeClient::new(settings.bridge_options()?)?;
    let store = BridgeStore::new(client, settings.store_config());
    let idle = IdleTracker::new(
        Duration::from_secs(settings.dim_after_secs),
        Duration::from_secs(settings.dark_after_secs),
        Instant::now(),
    );
    let mut app = App::new(store, idle);
    app.start().await;

    let (events_tx, events_rx) = unbounded_channel();
    spawn_event_reader(events_tx);

    let terminal = ratatui::init();
    let result = run(app, terminal, events_rx).await;
    ratatui::restore();
    result
}

/// Terminal events are read on a plain thread: `event::read` blocks.
fn spawn_event_reader(events: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read terminal event: {e}");
                    break;
                }
            }
        }
    });
}

async fn run<C: BridgeClientTrait>(
    mut app: App<C>,
    mut terminal: DefaultTerminal,
    mut events: UnboundedReceiver<Event>,
) -> Result<()> {
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    while !app.should_exit {
        terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;
        tokio::select! {
            Some(event) = events.recv() => {
                if let Event::Key(key) = event {
                    app.handle_key(key, Instant::now()).await;
                }
            }
            _ = frames.tick() => {}
        }
    }
    info!("Panel closed");
    Ok(())
}
