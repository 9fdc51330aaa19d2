//! Registry of live sessions keyed by id

use crate::config::SessionConfig;
use crate::content::GameContent;
use crate::driver;
use crate::error::{Error, Result};
use crate::notify::Outbox;
use crate::session::{Inbound, Session, SessionId};
use questflow_core::GameClock;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info};

struct SessionHandle {
    clock: GameClock,
    inbound: UnboundedSender<Inbound>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    fn shutdown(self) {
        self.clock.stop();
        self.task.abort();
    }

    fn is_live(&self) -> bool {
        !self.inbound.is_closed() && !self.task.is_finished()
    }
}

/// Live sessions, at most one per id
///
/// Must be used from inside a [`tokio::task::LocalSet`]; each session's
/// driver runs as a local task.
#[derive(Default)]
pub struct Lobby {
    sessions: HashMap<SessionId, SessionHandle>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session, greet its client and start driving it
    ///
    /// A session already registered under `id` is stopped first: its clock
    /// halts and its driver is aborted before the new one is spawned.
    pub fn open(
        &mut self,
        id: impl Into<SessionId>,
        content: &GameContent,
        config: SessionConfig,
        outbox: Rc<dyn Outbox>,
    ) -> Result<()> {
        let id = id.into();
        let session = Session::new(id.clone(), content, config, outbox)?;

        if let Some(prior) = self.sessions.remove(&id) {
            info!(session = %id, "replacing existing session");
            prior.shutdown();
        }

        session.connect();
        let clock = session.clock().clone();
        let (inbound, receiver) = mpsc::unbounded_channel();
        let task = task::spawn_local(driver::drive(session, receiver));
        self.sessions.insert(
            id,
            SessionHandle {
                clock,
                inbound,
                task,
            },
        );
        Ok(())
    }

    /// Forward a client signal to a session
    pub fn send(&self, id: &SessionId, inbound: Inbound) -> Result<()> {
        let handle = self
            .sessions
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.clone()))?;
        handle
            .inbound
            .send(inbound)
            .map_err(|_| Error::SessionClosed(id.clone()))
    }

    /// Stop and forget a session; returns whether it existed
    pub fn close(&mut self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some(handle) => {
                debug!(session = %id, "closing session");
                handle.shutdown();
                true
            }
            None => false,
        }
    }

    /// Forget every session whose driver has exited; returns how many
    pub fn prune(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| handle.is_live());
        before - self.sessions.len()
    }

    /// The clock of a registered session
    pub fn clock(&self, id: &SessionId) -> Option<GameClock> {
        self.sessions.get(id).map(|handle| handle.clock.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Check if a session is registered and its driver still running
    pub fn is_live(&self, id: &SessionId) -> bool {
        self.sessions.get(id).is_some_and(SessionHandle::is_live)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for Lobby {
    fn drop(&mut self) {
        for (_, handle) in self.sessions.drain() {
            handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notification, RecordingOutbox};
    use questflow_core::ClockState;
    use std::time::Duration;
    use tokio::task::LocalSet;
    use tokio::time;

    fn open(lobby: &mut Lobby, id: &SessionId) -> Rc<RecordingOutbox> {
        let outbox = Rc::new(RecordingOutbox::new());
        lobby
            .open(
                id.clone(),
                &GameContent::default(),
                SessionConfig::default(),
                outbox.clone(),
            )
            .unwrap();
        outbox
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_greets_client() {
        LocalSet::new()
            .run_until(async {
                let mut lobby = Lobby::new();
                let id = SessionId::from("/game1_a");
                let outbox = open(&mut lobby, &id);

                let sent = outbox.sent();
                assert_eq!(sent[0].wire_name(), "text-message");
                assert_eq!(sent[1].wire_name(), "board");
                assert!(lobby.is_live(&id));
                assert_eq!(lobby.len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_routes_to_session() {
        LocalSet::new()
            .run_until(async {
                let mut lobby = Lobby::new();
                let id = SessionId::from("/game1_b");
                let outbox = open(&mut lobby, &id);

                lobby.send(&id, Inbound::StartSession).unwrap();
                lobby.send(&id, Inbound::move_to(2, 3)).unwrap();
                time::sleep(Duration::from_millis(10)).await;

                assert!(outbox.sent().contains(&Notification::PointsUpdated(100)));
                assert!(lobby.clock(&id).is_some_and(|clock| clock.is_running()));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_finished_sessions() {
        LocalSet::new()
            .run_until(async {
                let mut lobby = Lobby::new();
                let missing = SessionId::from("/nobody");
                assert!(matches!(
                    lobby.send(&missing, Inbound::StartSession),
                    Err(Error::SessionNotFound(_))
                ));

                let id = SessionId::from("/game1_c");
                open(&mut lobby, &id);
                lobby.send(&id, Inbound::StartSession).unwrap();
                time::sleep(Duration::from_secs(95)).await;

                assert!(!lobby.is_live(&id));
                assert!(matches!(
                    lobby.send(&id, Inbound::StartSession),
                    Err(Error::SessionClosed(_))
                ));
                assert_eq!(lobby.prune(), 1);
                assert!(lobby.is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_stops_prior_clock() {
        LocalSet::new()
            .run_until(async {
                let mut lobby = Lobby::new();
                let id = SessionId::from("/game1_d");
                open(&mut lobby, &id);
                lobby.send(&id, Inbound::StartSession).unwrap();
                time::sleep(Duration::from_millis(3500)).await;

                let prior = lobby.clock(&id).unwrap();
                assert_eq!(prior.game_tick(), 3);

                let outbox = open(&mut lobby, &id);
                assert_eq!(prior.state(), ClockState::Stopped);
                assert_eq!(lobby.len(), 1);

                time::sleep(Duration::from_secs(3)).await;
                assert_eq!(prior.game_tick(), 3);

                let current = lobby.clock(&id).unwrap();
                assert_eq!(current.state(), ClockState::Idle);
                assert!(outbox.messages()[0].starts_with("Welcome"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close() {
        LocalSet::new()
            .run_until(async {
                let mut lobby = Lobby::new();
                let id = SessionId::from("/game1_e");
                open(&mut lobby, &id);
                lobby.send(&id, Inbound::StartSession).unwrap();
                time::sleep(Duration::from_millis(1500)).await;
                let clock = lobby.clock(&id).unwrap();

                assert!(lobby.close(&id));
                assert!(!lobby.close(&id));
                assert!(!clock.is_running());
                assert!(matches!(
                    lobby.send(&id, Inbound::StartSession),
                    Err(Error::SessionNotFound(_))
                ));
            })
            .await;
    }
}
