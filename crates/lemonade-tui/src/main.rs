use anyhow::Result;
use lemonade_core::{Config, SessionEvent};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler, Tui};

enum Incoming {
    Terminal(AppEvent),
    Session(SessionEvent),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is optional; the chat works without it
    let log_path = logging::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "failed to load config, using defaults");
            Config::new()
        }
    };
    match &log_path {
        Ok(path) => info!(log = ?path, server = %config.server_address, "starting lemonade-chat"),
        Err(err) => eprintln!("Logging disabled: {}", err),
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(config);
    let mut events = EventHandler::new();
    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let incoming = tokio::select! {
            Some(event) = events.next() => Incoming::Terminal(event),
            Some(event) = app.session.next_event() => Incoming::Session(event),
            else => break,
        };

        match incoming {
            Incoming::Terminal(event) => handler::handle_event(app, event),
            Incoming::Session(event) => app.on_session_event(event),
        }
    }

    info!("exiting");
    Ok(())
}
