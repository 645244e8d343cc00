//! Interactive REPL for building jq queries against a decoded document.
//!
//! # Architecture
//!
//! - [`app`] - viewer-model: expression buffer, completions, query re-evaluation
//! - [`ui`] - ratatui layout rendering
//!
//! The viewer-model is plain state so the editing and completion behavior
//! is testable without a terminal; this module owns terminal setup and the
//! event loop.

pub mod app;
pub mod ui;

use std::io;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;

pub use app::App;

/// Run the REPL over the JSON rendering of the decoded input.
///
/// Returns the final rendered output when the user exited with a valid
/// query, or `None` when the session ended without executing one.
pub fn interact(json_text: &str) -> Result<Option<String>> {
    let mut app = App::new(json_text);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    // restore the terminal on every exit path
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;

    if app.graceful_exit {
        Ok(Some(app.final_output()))
    } else {
        Ok(None)
    }
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if !event::poll(std::time::Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key) {
                return Ok(());
            }
        }
    }
}
