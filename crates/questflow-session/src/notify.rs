//! Outbound notifications and the sinks that receive them

use crate::content::{Board, Piece, Prize, Tile};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// A sound the client should play once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub name: String,
    pub gain: f32,
}

impl SoundCue {
    pub fn new(name: impl Into<String>, gain: f32) -> Self {
        Self {
            name: name.into(),
            gain,
        }
    }
}

/// Everything a client needs to draw a fresh board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(flatten)]
    pub board: Board,
    pub prizes: Vec<Prize>,
    pub pieces: Vec<Piece>,
    pub tiles: Vec<Tile>,
}

/// A one-way message to the client
///
/// Serializes as `{"event": <wire name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Notification {
    #[serde(rename = "board")]
    SessionCreated(BoardSnapshot),
    #[serde(rename = "set-pieces")]
    PieceMoved(Piece),
    #[serde(rename = "set-points")]
    PointsUpdated(i64),
    #[serde(rename = "set-countdown")]
    CountdownUpdated { ticks: i64 },
    #[serde(rename = "text-message")]
    Message(String),
    #[serde(rename = "one-shot-sound")]
    Sound(SoundCue),
    #[serde(rename = "remove-prizes")]
    PrizeRemoved(Prize),
    #[serde(rename = "set-tiles")]
    TilesSet(Vec<Tile>),
}

impl Notification {
    /// Name the transport sends this notification under
    pub fn wire_name(&self) -> &'static str {
        match self {
            Notification::SessionCreated(_) => "board",
            Notification::PieceMoved(_) => "set-pieces",
            Notification::PointsUpdated(_) => "set-points",
            Notification::CountdownUpdated { .. } => "set-countdown",
            Notification::Message(_) => "text-message",
            Notification::Sound(_) => "one-shot-sound",
            Notification::PrizeRemoved(_) => "remove-prizes",
            Notification::TilesSet(_) => "set-tiles",
        }
    }
}

/// Sink for outbound notifications
///
/// Delivery is fire-and-forget; a sink that can no longer deliver drops the
/// notification.
pub trait Outbox {
    fn notify(&self, notification: Notification);
}

impl Outbox for UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        if let Err(err) = self.send(notification) {
            trace!(kind = err.0.wire_name(), "client gone, dropping notification");
        }
    }
}

/// Outbox that keeps everything it is given
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    /// Take everything sent so far, leaving the outbox empty
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }

    /// Every text message sent so far
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|notification| match notification {
                Notification::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Outbox for RecordingOutbox {
    fn notify(&self, notification: Notification) {
        self.sent.borrow_mut().push(notification);
    }
}
