use crate::config::Config;
use crate::core_network::error::PoolError;
use crate::session::{run_session, SessionState, SlotStatus};
use log::{debug, error};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

struct Slot {
    status: Arc<SlotStatus>,
    worker: Option<JoinHandle<()>>,
}

impl Slot {
    fn new() -> Self {
        Self {
            status: Arc::new(SlotStatus::new(SessionState::Open)),
            worker: None,
        }
    }

    fn has_exited(&self) -> bool {
        self.status.load() == SessionState::Exited
            || self.worker.as_ref().is_some_and(|w| w.is_finished())
    }
}

/// Fixed-capacity table of session slots.
///
/// Reclaiming exited slots, finding a free one and starting its worker all
/// happen under one lock, so a slot is never handed out twice.
pub struct SessionPool {
    slots: Mutex<Vec<Slot>>,
    config: Arc<Config>,
}

impl SessionPool {
    pub fn new(config: Arc<Config>) -> Self {
        let capacity = config.server.max_sessions;
        Self {
            slots: Mutex::new((0..capacity).map(|_| Slot::new()).collect()),
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.server.max_sessions
    }

    /// Admits `stream` into the first free slot and starts its session.
    ///
    /// On `CapacityExceeded` the stream is dropped, closing the connection.
    pub async fn admit(&self, stream: TcpStream) -> Result<usize, PoolError> {
        let mut slots = self.slots.lock().await;
        Self::reclaim(&mut slots).await;

        let Some(id) = slots
            .iter()
            .position(|slot| slot.status.load() == SessionState::Open)
        else {
            return Err(PoolError::CapacityExceeded(slots.len()));
        };

        let slot = &mut slots[id];
        slot.status.store(SessionState::AwaitingUser);
        let status = Arc::clone(&slot.status);
        let config = Arc::clone(&self.config);
        slot.worker = Some(tokio::spawn(async move {
            if let Err(e) = run_session(stream, id, config, Arc::clone(&status)).await {
                error!("Session {} ended with error: {:#}", id, e);
            }
            status.store(SessionState::Exited);
        }));

        Ok(id)
    }

    /// Number of slots currently held by a session.
    pub async fn active_sessions(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .iter()
            .filter(|slot| !matches!(slot.status.load(), SessionState::Open | SessionState::Exited))
            .count()
    }

    async fn reclaim(slots: &mut [Slot]) {
        for (id, slot) in slots.iter_mut().enumerate() {
            if !slot.has_exited() {
                continue;
            }
            if let Some(worker) = slot.worker.take() {
                if let Err(e) = worker.await {
                    error!("Session {} worker panicked: {}", id, e);
                }
            }
            slot.status.store(SessionState::Open);
            debug!("Slot {} reclaimed", id);
        }
    }
}
