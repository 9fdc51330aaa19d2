//! Real-time pacing for a session
//!
//! The session is `!Send`, so the driver runs on a current-thread runtime
//! inside a [`tokio::task::LocalSet`].

use crate::session::{Inbound, Session};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Tick the session's clock once per period and feed it client signals
///
/// Returns when the game ends or the inbound channel closes; the session is
/// torn down either way.
pub async fn drive(session: Session, mut inbound: UnboundedReceiver<Inbound>) {
    let period = session.clock().period();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(session = %session.id(), ?period, "driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.advance_clock();
            }
            received = inbound.recv() => match received {
                Some(signal) => {
                    let was_running = session.clock().is_running();
                    session.handle(signal);
                    if !was_running && session.clock().is_running() {
                        // first tick lands one full period after the start
                        ticker.reset();
                    }
                }
                None => {
                    debug!(session = %session.id(), "inbound channel closed");
                    break;
                }
            },
        }

        if session.is_finished() {
            break;
        }
    }

    session.teardown();
    info!(session = %session.id(), tick = session.clock().game_tick(), "driver stopped");
}
