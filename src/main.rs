use std::sync::Arc;

use anyhow::Result;

mod app;
mod backend;
mod config;
mod format;
mod handler;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::load()?;
    tracing::info!("starting against {}", config.backend_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(&config)?;

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        poll_tasks(app).await;

        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

/// Reap finished request tasks. Checked every event, and ticks arrive on a
/// fixed cadence, so completion is picked up promptly without blocking the
/// UI on the network.
async fn poll_tasks(app: &mut App) {
    if let Some(task) = app.chat_task.take() {
        if task.is_finished() {
            let outcome = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::Error::from(join_error)),
            };
            app.finish_send(outcome);
        } else {
            app.chat_task = Some(task);
        }
    }

    if let Some(task) = app.upload_task.take() {
        if task.is_finished() {
            let outcome = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::Error::from(join_error)),
            };
            app.finish_upload(outcome);
        } else {
            app.upload_task = Some(task);
        }
    }
}

/// Diagnostics go to a file under the config directory; the terminal
/// belongs to the TUI while we run.
fn init_tracing() -> Result<()> {
    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::File::create(dir.join("ragchat.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
