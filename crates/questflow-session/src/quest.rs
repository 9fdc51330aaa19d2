//! Session-wide state shared by every behavior

use crate::config::SessionConfig;
use crate::content::{Board, GameContent};
use crate::notify::{BoardSnapshot, Notification, Outbox, SoundCue};
use crate::state::GameState;
use questflow_core::Context;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Context type the quest behaviors run in
pub type QuestContext = Context<Quest>;

/// Game state, outbound sink and settings for one session
///
/// Borrows of the game state must be released before anything is published
/// on the session channel, since listeners borrow it again.
pub struct Quest {
    title: String,
    board: Board,
    config: SessionConfig,
    game: RefCell<GameState>,
    outbox: Rc<dyn Outbox>,
}

impl Quest {
    pub fn new(content: &GameContent, config: SessionConfig, outbox: Rc<dyn Outbox>) -> Self {
        Self {
            title: content.title.clone(),
            board: content.board.clone(),
            config,
            game: RefCell::new(GameState::from_content(content)),
            outbox,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the game state
    pub fn game(&self) -> Ref<'_, GameState> {
        self.game.borrow()
    }

    /// Borrow the game state mutably
    pub fn game_mut(&self) -> RefMut<'_, GameState> {
        self.game.borrow_mut()
    }

    /// Send a notification to the client
    pub fn notify(&self, notification: Notification) {
        trace!(kind = notification.wire_name(), "notify");
        self.outbox.notify(notification);
    }

    pub fn message(&self, text: impl Into<String>) {
        self.notify(Notification::Message(text.into()));
    }

    pub fn sound(&self, name: &str, gain: f32) {
        self.notify(Notification::Sound(SoundCue::new(name, gain)));
    }

    /// The board as a client should first draw it
    pub fn board_snapshot(&self) -> BoardSnapshot {
        let game = self.game();
        BoardSnapshot {
            board: self.board.clone(),
            prizes: game.prizes.clone(),
            pieces: game.pieces.clone(),
            tiles: game.tiles.clone(),
        }
    }
}

impl fmt::Debug for Quest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quest")
            .field("title", &self.title)
            .field("config", &self.config)
            .field("game", &self.game)
            .finish_non_exhaustive()
    }
}
