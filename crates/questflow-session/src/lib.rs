//! # questflow-session
//!
//! The "Quest 4 Sushi" game built on [`questflow_core`]: one [`Session`] per
//! player, each with its own event channel, game clock and behavior tree.
//!
//! ## Layers
//!
//! - [`GameContent`] and [`SessionConfig`] describe a game (RON or defaults)
//! - [`Session`] installs the behavior tree and turns [`Inbound`] signals into
//!   channel events; the game reports back through an [`Outbox`]
//! - [`driver::drive`] paces a session in real time on a tokio `LocalSet`
//! - [`Lobby`] keeps at most one live session per [`SessionId`]
//!
//! ## Example
//!
//! ```
//! use questflow_session::{GameContent, Notification, RecordingOutbox, Session, SessionConfig};
//! use std::rc::Rc;
//!
//! let outbox = Rc::new(RecordingOutbox::new());
//! let session = Session::new(
//!     "/game1_doc",
//!     &GameContent::default(),
//!     SessionConfig::default(),
//!     outbox.clone(),
//! )
//! .unwrap();
//!
//! session.start();
//! session.request_move(2, 3);
//! assert_eq!(session.state().points(), 100);
//! assert!(outbox.sent().contains(&Notification::PointsUpdated(100)));
//! ```

pub mod behaviors;
mod config;
mod content;
pub mod driver;
mod error;
mod lobby;
mod notify;
mod quest;
mod session;
mod state;

pub use config::SessionConfig;
pub use content::{
    overwrites_from_value, overwrites_to_value, Board, Coord, GameContent, Piece, Prize, Sprites,
    Tile, TileOverwrite,
};
pub use error::{Error, Result};
pub use lobby::Lobby;
pub use notify::{BoardSnapshot, Notification, Outbox, RecordingOutbox, SoundCue};
pub use quest::{Quest, QuestContext};
pub use session::{Inbound, Session, SessionId};
pub use state::GameState;

pub use questflow_core::{Tick, Value};
