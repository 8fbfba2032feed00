mod app;
mod field;
mod input;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use app::DashboardApp;
use crate::commands::AppContext;
use crate::error::LrdError;

pub async fn run(ctx: AppContext) -> Result<(), LrdError> {
    // Runs the session guard before the terminal is taken over.
    let mut app = DashboardApp::new(ctx)?;
    if app.session.is_some() {
        app.refresh();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut DashboardApp,
) -> Result<(), LrdError> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for events with timeout to allow checking async responses
        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            input::handle_event(app, event);
        }

        // Check for async response
        app.poll_response();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
