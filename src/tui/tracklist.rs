//! The track list screen.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::catalog::Catalog;
use crate::util::{format_hms_secs, truncate};

pub enum TracklistAction {
    Play(u64),
    Edit(u64),
    Quit,
}

pub struct TracklistState {
    selected: usize,
}

impl TracklistState {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    pub fn handle_key(&mut self, key: KeyEvent, catalog: &Catalog) -> Option<TracklistAction> {
        let count = catalog.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(TracklistAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                if count > 0 {
                    self.selected = (self.selected + 1) % count;
                }
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if count > 0 {
                    self.selected = (self.selected + count - 1) % count;
                }
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.selected = 0;
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.selected = count.saturating_sub(1);
                None
            }
            KeyCode::Enter => {
                let track = catalog.tracks.get(self.selected)?;
                Some(TracklistAction::Play(track.id))
            }
            KeyCode::Char('e') => {
                let track = catalog.tracks.get(self.selected)?;
                Some(TracklistAction::Edit(track.id))
            }
            _ => None,
        }
    }
}

pub fn draw(frame: &mut Frame, catalog: &Catalog, state: &mut TracklistState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!(" trackstash — {} track(s)", catalog.len())).bold();
    frame.render_widget(header, chunks[0]);

    if catalog.is_empty() {
        let empty = Paragraph::new("The catalog is empty. Add tracks with 'trackstash add'.")
            .block(Block::default().borders(Borders::ALL).title(" Tracks "));
        frame.render_widget(empty, chunks[1]);
    } else {
        // Keep the cursor inside the list after deletions elsewhere.
        if state.selected >= catalog.len() {
            state.selected = catalog.len() - 1;
        }

        let items: Vec<ListItem> = catalog
            .tracks
            .iter()
            .map(|track| {
                let length = if track.length > 0 {
                    format_hms_secs(track.length)
                } else {
                    "--:--:--".to_string()
                };
                ListItem::new(format!(
                    "{:<4} {:<22} {:<42} {}",
                    track.id,
                    truncate(&track.artist, 20),
                    truncate(&track.title, 40),
                    length
                ))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    let help = Paragraph::new(" [j/k] move | [enter] play | [e] edit | [q] quit").dim();
    frame.render_widget(help, chunks[2]);
}
