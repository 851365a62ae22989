//! Terminal UI for pricing land-clearing jobs with live transport estimates.

mod app;
mod cli;
mod input;
mod ui;

use std::{fs::OpenOptions, io, path::Path, time::Duration as StdDuration};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use treeshop_core::{
    session::PricingSession, settings::JsonFileSettingsStore, transport::TransportEstimator,
};
use treeshop_provider_osm::Endpoints;

use crate::app::App;
use crate::cli::Cli;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    // HTTP + provider setup
    let client = Client::builder()
        .user_agent(concat!("treeshop/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let provider = treeshop_provider_osm::provider_with(
        client,
        &Endpoints {
            geocoder_url: cli.geocoder_url.clone(),
            router_url: cli.router_url.clone(),
            country_codes: cli.country.clone(),
        },
    );
    let estimator = TransportEstimator::new(provider)
        .with_timeout(StdDuration::from_secs(cli.estimate_timeout_secs));

    let settings_path = cli.settings_path();
    let store = JsonFileSettingsStore::open(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    tracing::info!(path = %settings_path.display(), "settings loaded");

    // App state
    let app = App::new(PricingSession::new(estimator, Box::new(store)));

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Finished estimates are applied here, on the UI task
        if let Some(outcome) = app.session.poll_transport() {
            app.on_transport_outcome(&outcome);
        }

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input without blocking spawned lookups
        if !event::poll(StdDuration::ZERO)? {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
            continue;
        }
        let CEvent::Key(key) = event::read()? else {
            continue;
        };

        match input::handle_key_event(key, &mut app) {
            Action::Quit => break,
            Action::None => {}
            Action::EstimateTransport => {
                app.clear_messages();
                if app.session.profile().base_address.trim().is_empty() {
                    app.error_message =
                        Some("Set a base location address in settings (Tab) first".into());
                } else if app.session.inputs().postal_code.trim().is_empty() {
                    app.error_message = Some("Enter a project postal code first".into());
                } else if app.session.estimate_transport() {
                    app.info_message = Some("Estimating transport time…".into());
                }
            }
            Action::SaveSettings => {
                app.clear_messages();
                let rates = app.draft_rates.clone();
                let profile = app.draft_profile.clone();
                let saved = app
                    .session
                    .update_rates(rates)
                    .and_then(|()| app.session.update_profile(profile));
                match saved {
                    Ok(()) => app.info_message = Some("Settings saved".into()),
                    Err(err) => app.error_message = Some(format!("Save failed: {err}")),
                }
            }
        }
    }

    Ok(())
}
