//! Terminal User Interface for Augury
//!
//! A tabbed IOC search view, a single-source detail view, and a settings
//! view for identity and theme.

pub mod app;
pub mod render;
pub mod session;
pub mod test_harness;
pub mod ui;

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::api::Backend;
use crate::config::PreferenceStore;

use app::{App, AppOptions};

/// Poll window per loop iteration; doubles as the drain cadence for
/// worker responses when no keys arrive.
const TICK_RATE: Duration = Duration::from_millis(100);

/// One loop iteration's input: a key press, or nothing within the poll
/// window. Resize needs no case of its own; the next draw reflows.
enum Input {
    Key(KeyEvent),
    Tick,
}

/// Wait for the next key press, up to one tick.
///
/// Crossterm polling blocks, so it runs off the async runtime. Release
/// events are dropped; terminals that report them would double every
/// keystroke otherwise.
async fn next_input() -> Input {
    tokio::task::spawn_blocking(|| {
        if event::poll(TICK_RATE).unwrap_or(false) {
            if let Ok(CrosstermEvent::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Release {
                    return Input::Key(key);
                }
            }
        }
        Input::Tick
    })
    .await
    .unwrap_or(Input::Tick)
}

/// Run the TUI
pub async fn run(
    options: AppOptions,
    backend: Arc<dyn Backend>,
    prefs: Box<dyn PreferenceStore>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    let mut app = App::new(options, backend, prefs);

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Run the application loop
async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: ratatui::backend::Backend,
{
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Input::Key(key) = next_input().await {
            app.handle_key(key);
        }
        // Drain worker responses every iteration, keystroke or not, so a
        // typing burst cannot starve an arriving result.
        app.tick();
    }
    Ok(())
}
