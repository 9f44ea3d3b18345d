//! The metadata editor screen.

use std::path::Path;

use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tui_input::{Input, backend::crossterm::EventHandler};

use crate::catalog::{Catalog, TrackRecord};

pub enum EditorAction {
    Back,
    Save,
}

const FIELD_LABELS: [&str; 5] = ["Artist", "Title", "Album", "Length (s)", "Source URL"];
const LENGTH_FIELD: usize = 3;

pub struct EditorScreen {
    track_id: u64,
    inputs: Vec<Input>,
    focus: usize,
    message: Option<String>,
}

impl EditorScreen {
    pub fn new(track: &TrackRecord) -> Self {
        let inputs = vec![
            Input::new(track.artist.clone()),
            Input::new(track.title.clone()),
            Input::new(track.album.clone()),
            Input::new(track.length.to_string()),
            Input::new(track.source_url.clone()),
        ];
        Self {
            track_id: track.id,
            inputs,
            focus: 0,
            message: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<EditorAction> {
        match key.code {
            KeyCode::Esc => Some(EditorAction::Back),
            KeyCode::Enter => Some(EditorAction::Save),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % self.inputs.len();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
                None
            }
            _ => {
                self.inputs[self.focus].handle_event(&Event::Key(key));
                self.message = None;
                None
            }
        }
    }

    /// Validate the fields and write the record back to the catalog file.
    /// Feedback lands in the message line rather than leaving the screen.
    pub fn save(&mut self, catalog: &mut Catalog, catalog_path: &Path) {
        let length_text = self.inputs[LENGTH_FIELD].value().trim().to_string();
        let length: u64 = if length_text.is_empty() {
            0
        } else {
            match length_text.parse() {
                Ok(n) => n,
                Err(_) => {
                    self.message = Some("Length must be a whole number of seconds".to_string());
                    return;
                }
            }
        };

        let existing = match catalog.track_by_id(self.track_id) {
            Ok(track) => track.clone(),
            Err(err) => {
                self.message = Some(err.to_string());
                return;
            }
        };

        let updated = TrackRecord {
            artist: self.inputs[0].value().trim().to_string(),
            title: self.inputs[1].value().trim().to_string(),
            album: self.inputs[2].value().trim().to_string(),
            length,
            source_url: self.inputs[4].value().trim().to_string(),
            ..existing
        };

        if let Err(err) = catalog.update(updated) {
            self.message = Some(err.to_string());
            return;
        }
        self.message = match catalog.save(catalog_path) {
            Ok(()) => Some("Saved".to_string()),
            Err(err) => Some(format!("Save failed: {err}")),
        };
    }
}

pub fn draw(frame: &mut Frame, screen: &EditorScreen) {
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(std::iter::repeat_n(
        Constraint::Length(1),
        FIELD_LABELS.len(),
    ));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let header = Paragraph::new(format!(" Edit track {}", screen.track_id)).bold();
    frame.render_widget(header, chunks[0]);

    for (i, (label, input)) in FIELD_LABELS.iter().zip(&screen.inputs).enumerate() {
        let focused = i == screen.focus;
        let marker = if focused { "> " } else { "  " };
        let value_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let line = Line::from(vec![
            Span::raw(marker),
            Span::raw(format!("{:<12}", label)),
            Span::styled(input.value().to_string(), value_style),
            Span::styled(if focused { "_" } else { "" }, value_style),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[1 + i]);
    }

    let message = screen.message.as_deref().unwrap_or("");
    frame.render_widget(
        Paragraph::new(format!("  {message}")).block(Block::default().borders(Borders::NONE)),
        chunks[1 + FIELD_LABELS.len()],
    );

    let help = Paragraph::new(" [tab] next field | [enter] save | [esc] back").dim();
    frame.render_widget(help, chunks[chunks.len() - 1]);
}
