//! Top-level TUI model: routes events to whichever screen is active and
//! owns the shared player.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;

use crate::catalog::Catalog;
use crate::player::{Player, PlayerEvents};

use super::editor::{self, EditorAction, EditorScreen};
use super::player_screen::{self, PlayerAction, PlayerScreen};
use super::tracklist::{self, TracklistAction, TracklistState};

enum Screen {
    Tracklist,
    Player,
    Editor,
}

pub struct TuiApp {
    catalog: Catalog,
    catalog_path: PathBuf,
    player: Player,
    events: PlayerEvents,
    screen: Screen,
    tracklist: TracklistState,
    player_screen: Option<PlayerScreen>,
    editor: Option<EditorScreen>,
}

impl TuiApp {
    pub fn new(
        catalog: Catalog,
        catalog_path: PathBuf,
        player: Player,
        events: PlayerEvents,
    ) -> Self {
        Self {
            catalog,
            catalog_path,
            player,
            events,
            screen: Screen::Tracklist,
            tracklist: TracklistState::new(),
            player_screen: None,
            editor: None,
        }
    }

    /// Drain the player's channels. The progress channel is bounded and
    /// best-effort, so whatever is pending now is the freshest snapshot;
    /// the done signal sends the UI back to the tracklist.
    pub fn drain_player_events(&mut self) {
        while let Ok(status) = self.events.progress.try_recv() {
            if let Some(screen) = self.player_screen.as_mut() {
                screen.status = status;
            }
        }

        if self.events.done.try_recv().is_ok() {
            self.player.stop();
            if matches!(self.screen, Screen::Player) {
                self.player_screen = None;
                self.screen = Screen::Tracklist;
            }
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Tracklist => tracklist::draw(frame, &self.catalog, &mut self.tracklist),
            Screen::Player => {
                if let Some(screen) = self.player_screen.as_ref() {
                    player_screen::draw(frame, screen);
                }
            }
            Screen::Editor => {
                if let Some(screen) = self.editor.as_ref() {
                    editor::draw(frame, screen);
                }
            }
        }
    }

    /// Handle one key press; returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match self.screen {
            Screen::Tracklist => match self.tracklist.handle_key(key, &self.catalog) {
                Some(TracklistAction::Quit) => return true,
                Some(TracklistAction::Play(id)) => self.open_player(id),
                Some(TracklistAction::Edit(id)) => self.open_editor(id),
                None => {}
            },
            Screen::Player => {
                let action = self.player_screen.as_mut().and_then(|s| s.handle_key(key));
                match action {
                    Some(PlayerAction::TogglePause) => self.player.pause(),
                    Some(PlayerAction::Back) => self.leave_player(),
                    None => {}
                }
            }
            Screen::Editor => {
                let action = self.editor.as_mut().and_then(|s| s.handle_key(key));
                match action {
                    Some(EditorAction::Back) => {
                        self.editor = None;
                        self.screen = Screen::Tracklist;
                    }
                    Some(EditorAction::Save) => {
                        if let Some(editor) = self.editor.as_mut() {
                            editor.save(&mut self.catalog, &self.catalog_path);
                        }
                    }
                    None => {}
                }
            }
        }
        false
    }

    fn open_player(&mut self, id: u64) {
        let Ok(track) = self.catalog.track_by_id(id) else {
            return;
        };
        let track = track.clone();

        let mut screen = PlayerScreen::new(track.clone());
        if let Err(err) = self.player.play(&track) {
            screen.error = Some(err.to_string());
        }
        self.player_screen = Some(screen);
        self.screen = Screen::Player;
    }

    fn open_editor(&mut self, id: u64) {
        let Ok(track) = self.catalog.track_by_id(id) else {
            return;
        };
        self.editor = Some(EditorScreen::new(track));
        self.screen = Screen::Editor;
    }

    fn leave_player(&mut self) {
        if let Some(screen) = self.player_screen.take() {
            screen.save_position(&mut self.catalog, &self.catalog_path);
        }
        self.player.stop();
        self.screen = Screen::Tracklist;
    }

    /// Final teardown before the terminal is restored.
    pub fn shutdown(&mut self) {
        if matches!(self.screen, Screen::Player) {
            self.leave_player();
        }
        self.player.close();
    }
}
