//! Tick clock for one session
//!
//! The clock is a small state machine:
//! - `Idle` - armed, not ticking (fresh or after `reset`)
//! - `Running` - each `advance` publishes a `tick` event
//! - `Stopped` - halted; `reset` re-arms it
//!
//! Real-time pacing lives outside the clock: a driver calls
//! [`GameClock::advance`] once per [`GameClock::period`].

use crate::{Error, Event, EventChannel, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// A discrete tick number
pub type Tick = u64;

/// Real-time length of one tick unless configured otherwise
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Running state of a [`GameClock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockState {
    /// Armed but not ticking
    #[default]
    Idle,
    /// Publishing ticks
    Running,
    /// Halted until the next reset
    Stopped,
}

struct ClockInner {
    tick: Cell<Tick>,
    state: Cell<ClockState>,
    period: Duration,
    channel: EventChannel,
}

/// Handle to a session's game clock
///
/// Cloning the handle shares the same clock.
#[derive(Clone)]
pub struct GameClock {
    inner: Rc<ClockInner>,
}

impl GameClock {
    /// Create a clock publishing on `channel` with a one-second period
    pub fn new(channel: EventChannel) -> Self {
        Self::with_period(channel, DEFAULT_TICK_PERIOD)
    }

    /// Create a clock with a custom real-time period
    pub fn with_period(channel: EventChannel, period: Duration) -> Self {
        Self {
            inner: Rc::new(ClockInner {
                tick: Cell::new(0),
                state: Cell::new(ClockState::Idle),
                period,
                channel,
            }),
        }
    }

    /// Current tick, without side effects
    pub fn game_tick(&self) -> Tick {
        self.inner.tick.get()
    }

    /// Current running state
    pub fn state(&self) -> ClockState {
        self.inner.state.get()
    }

    /// Check if the clock is publishing ticks
    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    /// Real-time length of one tick
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Set the tick counter back to zero
    ///
    /// A running clock keeps running. A stopped clock becomes startable again.
    pub fn reset(&self) {
        self.inner.tick.set(0);
        if self.state() == ClockState::Stopped {
            self.inner.state.set(ClockState::Idle);
        }
    }

    /// Begin publishing ticks
    pub fn start(&self) -> Result<()> {
        match self.state() {
            ClockState::Idle => {
                debug!(tick = self.game_tick(), "clock started");
                self.inner.state.set(ClockState::Running);
                Ok(())
            }
            ClockState::Running => Err(Error::ClockAlreadyRunning),
            ClockState::Stopped => Err(Error::ClockStopped),
        }
    }

    /// Halt tick publication
    ///
    /// Stopping twice is a no-op.
    pub fn stop(&self) {
        if self.state() != ClockState::Stopped {
            debug!(tick = self.game_tick(), "clock stopped");
            self.inner.state.set(ClockState::Stopped);
        }
    }

    /// Advance one tick and publish it
    ///
    /// Returns the new tick, or `None` when the clock is not running.
    pub fn advance(&self) -> Option<Tick> {
        if !self.is_running() {
            return None;
        }
        let tick = self.inner.tick.get() + 1;
        self.inner.tick.set(tick);
        self.inner.channel.publish(Event::tick(tick));
        Some(tick)
    }
}

impl fmt::Debug for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClock")
            .field("tick", &self.game_tick())
            .field("state", &self.state())
            .field("period", &self.period())
            .finish()
    }
}
