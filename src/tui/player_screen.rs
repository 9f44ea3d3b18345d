//! The playback screen: progress gauge, timing and stream health.

use std::path::Path;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::catalog::{Catalog, TrackRecord};
use crate::player::Status;
use crate::stream::stream_health;
use crate::util::format_hms;

pub enum PlayerAction {
    TogglePause,
    Back,
}

pub struct PlayerScreen {
    pub track: TrackRecord,
    pub status: Status,
    pub error: Option<String>,
}

impl PlayerScreen {
    pub fn new(track: TrackRecord) -> Self {
        Self {
            track,
            status: Status {
                playing: true,
                ..Status::default()
            },
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PlayerAction> {
        match key.code {
            KeyCode::Char(' ') => Some(PlayerAction::TogglePause),
            KeyCode::Char('q') | KeyCode::Esc => Some(PlayerAction::Back),
            _ => None,
        }
    }

    /// Write the position hint back to the catalog, but only when it is
    /// worth keeping: more than 5 seconds in and more than 10 seconds left,
    /// so storage is not thrashed near track boundaries. Best-effort.
    pub fn save_position(&self, catalog: &mut Catalog, catalog_path: &Path) {
        if self.error.is_some() {
            return;
        }
        let current = self.status.current.as_secs();
        let total = self.status.total.as_secs();
        if current > 5
            && total > 0
            && total.saturating_sub(current) > 10
            && catalog.update_position(self.track.id, current).is_ok()
        {
            let _ = catalog.save(catalog_path);
        }
    }
}

pub fn draw(frame: &mut Frame, screen: &PlayerScreen) {
    if let Some(error) = &screen.error {
        draw_error(frame, error);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(" Now playing").bold();
    frame.render_widget(header, chunks[0]);

    let mut info = format!(
        "  artist: {}\n  title:  {}\n  album:  {}",
        screen.track.artist, screen.track.title, screen.track.album
    );
    if screen.track.playback_position > 0 {
        // Streamed sources always start from the beginning; the stored
        // position is shown as a hint only.
        info.push_str(&format!(
            "\n  saved position: {} (streaming restarts from the beginning)",
            format_hms(Duration::from_secs(screen.track.playback_position))
        ));
    }
    frame.render_widget(Paragraph::new(info), chunks[1]);

    let state_line = if screen.status.playing {
        format!(
            "  playing | {:.2}x | {}",
            screen.status.speed,
            stream_health(screen.status.stuck)
        )
    } else {
        "  paused".to_string()
    };
    frame.render_widget(Paragraph::new(state_line).bold(), chunks[2]);

    let ratio = if screen.status.total > Duration::ZERO {
        (screen.status.current.as_secs_f64() / screen.status.total.as_secs_f64()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(ratio)
        .label(format!("{:.1}%", ratio * 100.0));
    frame.render_widget(gauge, chunks[3]);

    let time_line = if screen.status.total > Duration::ZERO {
        format!(
            "  {} / {}",
            format_hms(screen.status.current),
            format_hms(screen.status.total)
        )
    } else {
        format!("  {} / --:--:--", format_hms(screen.status.current))
    };
    frame.render_widget(Paragraph::new(time_line), chunks[4]);

    let help = Paragraph::new(" [space] pause/resume | [q/esc] back to tracks").dim();
    frame.render_widget(help, chunks[6]);
}

fn draw_error(frame: &mut Frame, error: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(" Playback error").bold();
    frame.render_widget(header, chunks[0]);

    let body = Paragraph::new(error.to_string())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(body, chunks[1]);

    let help = Paragraph::new(" [q/esc] back to tracks").dim();
    frame.render_widget(help, chunks[2]);
}
