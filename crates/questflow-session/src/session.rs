//! One player's game: channel, clock, behaviors and state

use crate::behaviors::{self, REQUEST_MOVE_TO, START_SESSION};
use crate::config::SessionConfig;
use crate::content::GameContent;
use crate::error::Result;
use crate::notify::{Notification, Outbox};
use crate::quest::{Quest, QuestContext};
use crate::state::GameState;
use questflow_core::{runtime, CancelGroup, Event, EventChannel, GameClock, Tick, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// Identifier a session is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A signal from the client
///
/// Arrives as JSON such as `{"type": "request-move-to", "rank": 2, "file": "3"}`.
/// Coordinates stay loosely typed here; the movement behavior coerces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    StartSession,
    RequestMoveTo { rank: Value, file: Value },
}

impl Inbound {
    /// Parse a JSON signal
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a move request from whole coordinates
    pub fn move_to(rank: i64, file: i64) -> Self {
        Inbound::RequestMoveTo {
            rank: Value::Int(rank),
            file: Value::Int(file),
        }
    }
}

/// A running game
///
/// The behavior tree is installed on construction and waits for
/// [`Inbound::StartSession`]. Dropping the session tears it down.
pub struct Session {
    id: SessionId,
    context: Rc<QuestContext>,
}

impl Session {
    /// Build a session and install its behavior tree
    pub fn new(
        id: impl Into<SessionId>,
        content: &GameContent,
        config: SessionConfig,
        outbox: Rc<dyn Outbox>,
    ) -> Result<Self> {
        content.validate()?;
        config.validate()?;
        let id = id.into();

        let tree = behaviors::session_tree(content, &config);
        let channel = EventChannel::new();
        let clock = GameClock::with_period(channel.clone(), config.tick_period());
        let quest = Quest::new(content, config, outbox);
        let context = Rc::new(QuestContext::new(channel, clock, CancelGroup::new(), quest));
        runtime::spawn(&tree, &context)?;

        info!(session = %id, "session created");
        Ok(Self { id, context })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn clock(&self) -> &GameClock {
        self.context.clock()
    }

    /// Snapshot of the current game state
    pub fn state(&self) -> GameState {
        self.context.state().game().clone()
    }

    /// Greet a newly connected client and send it the board
    pub fn connect(&self) {
        let quest = self.context.state();
        debug!(session = %self.id, "client connected");
        quest.message(format!("Welcome to {}!", quest.title()));
        quest.notify(Notification::SessionCreated(quest.board_snapshot()));
    }

    /// Feed a client signal into the behavior tree
    pub fn handle(&self, inbound: Inbound) {
        if self.is_finished() {
            debug!(session = %self.id, ?inbound, "session finished, ignoring signal");
            return;
        }
        let event = match inbound {
            Inbound::StartSession => {
                info!(session = %self.id, "start requested");
                Event::new(START_SESSION)
            }
            Inbound::RequestMoveTo { rank, file } => {
                debug!(session = %self.id, %rank, %file, "move requested");
                Event::new(REQUEST_MOVE_TO)
                    .with_property("rank", rank)
                    .with_property("file", file)
            }
        };
        self.context.channel().publish(event);
    }

    pub fn start(&self) {
        self.handle(Inbound::StartSession);
    }

    pub fn request_move(&self, rank: i64, file: i64) {
        self.handle(Inbound::move_to(rank, file));
    }

    /// Advance the game clock by one tick
    ///
    /// Returns the new tick, or `None` while the clock is not running.
    pub fn advance_clock(&self) -> Option<Tick> {
        self.context.clock().advance()
    }

    /// Check if the game is over or the session was torn down
    pub fn is_finished(&self) -> bool {
        self.context.root().is_cancelled()
    }

    /// Cancel every behavior and stop the clock
    ///
    /// Returns `false` if the session was already finished.
    pub fn teardown(&self) -> bool {
        let root = self.context.root();
        let first = !root.is_cancelled();
        if first {
            info!(session = %self.id, tick = self.clock().game_tick(), "tearing down session");
            root.cancel_all();
        }
        self.context.clock().stop();
        first
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("clock", self.context.clock())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingOutbox;
    use crate::Error;
    use questflow_core::ClockState;

    fn session() -> (Session, Rc<RecordingOutbox>) {
        let outbox = Rc::new(RecordingOutbox::new());
        let session = Session::new(
            "/game1_test",
            &GameContent::default(),
            SessionConfig::default(),
            outbox.clone(),
        )
        .unwrap();
        (session, outbox)
    }

    #[test]
    fn test_inbound_from_json() {
        assert_eq!(
            Inbound::from_json(r#"{"type": "start-session"}"#).unwrap(),
            Inbound::StartSession
        );
        assert_eq!(
            Inbound::from_json(r#"{"type": "request-move-to", "rank": 2, "file": "3"}"#).unwrap(),
            Inbound::RequestMoveTo {
                rank: Value::Int(2),
                file: Value::String("3".to_string()),
            }
        );
        assert!(matches!(
            Inbound::from_json(r#"{"type": "fly-to"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_connect_sends_welcome_then_board() {
        let (session, outbox) = session();
        session.connect();
        let sent = outbox.drain();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], Notification::Message("Welcome to Quest 4 Sushi!".to_string()));
        match &sent[1] {
            Notification::SessionCreated(board) => {
                assert_eq!(board.board.ranks, 20);
                assert_eq!(board.prizes.len(), 6);
                assert_eq!(board.tiles.len(), 4);
            }
            other => panic!("expected a board, got {:?}", other),
        }
    }

    #[test]
    fn test_full_game_runs_to_timeout() {
        let (session, outbox) = session();
        assert_eq!(session.advance_clock(), None);

        session.start();
        session.request_move(2, 3);
        let mut ticks = 0;
        while session.advance_clock().is_some() {
            ticks += 1;
        }

        assert_eq!(ticks, 90);
        assert!(session.is_finished());
        assert_eq!(session.clock().state(), ClockState::Stopped);
        assert_eq!(session.state().points(), 100);
        assert!(outbox.messages().contains(&"Time has run out!".to_string()));

        outbox.drain();
        session.request_move(6, 5);
        session.start();
        assert!(outbox.sent().is_empty());
        assert!(!session.teardown());
    }

    #[test]
    fn test_double_start_keeps_one_tree() {
        let (session, _) = session();
        session.start();
        session.start();
        session.advance_clock();
        session.advance_clock();
        assert_eq!(session.clock().game_tick(), 2);
    }

    #[test]
    fn test_teardown_runs_once() {
        let (session, outbox) = session();
        session.start();
        session.advance_clock();
        assert!(session.teardown());
        assert!(!session.teardown());
        assert!(session.is_finished());

        outbox.drain();
        assert_eq!(session.advance_clock(), None);
        session.request_move(2, 3);
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn test_rejects_bad_setup() {
        let outbox = Rc::new(RecordingOutbox::new());
        let config = SessionConfig {
            tick_period_ms: 0,
            ..SessionConfig::default()
        };
        let result = Session::new("/bad", &GameContent::default(), config, outbox.clone());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let content = GameContent {
            pieces: Vec::new(),
            ..GameContent::default()
        };
        let result = Session::new("/bad", &content, SessionConfig::default(), outbox);
        assert!(matches!(result, Err(Error::InvalidContent(_))));
    }
}
