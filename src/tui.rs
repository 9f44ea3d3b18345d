//! Interactive terminal UI: tracklist, player and editor screens driven by
//! a single crossterm poll loop.
//!
//! One shared `Player` lives for the whole TUI session; screens translate
//! key presses into player calls and consume its event channels. Terminal
//! state is restored on every exit path.

mod app;
mod editor;
mod player_screen;
mod tracklist;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::Error;
use crate::player::{AudioOutput, Player};

use app::TuiApp;

pub fn run(settings: &Settings, catalog: Catalog, catalog_path: PathBuf) -> Result<(), Error> {
    let buffer_size = settings.player.buffer_kib as usize * 1024;
    let (player, events) = Player::new(AudioOutput::new(), buffer_size);
    let mut app = TuiApp::new(catalog, catalog_path, player, events);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = run_loop(&mut terminal, &mut app);

    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut TuiApp,
) -> Result<(), Error> {
    loop {
        app.drain_player_events();

        terminal.draw(|f| app.draw(f))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) {
                    break;
                }
            }
        }
    }
    Ok(())
}
