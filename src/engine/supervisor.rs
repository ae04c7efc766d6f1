//! Single-slot registry for the long-lived engine process.

use crate::engine::session::{ExitReport, RenderSession};
use crate::engine::{EngineCommand, Framing};
use crate::error::{PumlpadError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Listener notified whenever a supervised process exits
pub type ExitHandler = Arc<dyn Fn(&ExitReport) + Send + Sync + 'static>;

type Slot = Arc<Mutex<Option<Arc<RenderSession>>>>;

/// Owns at most one live streaming engine process.
///
/// Callers never see the child handle; they ask for a live session with
/// [`ensure_live`](Self::ensure_live) and may subscribe to exits with
/// [`on_exit`](Self::on_exit). When the process exits for any reason the slot
/// is cleared so the next request spawns a replacement.
pub struct EngineSupervisor {
    command: EngineCommand,
    framing: Framing,
    slot: Slot,
    /// Serializes the check-then-spawn sequence
    spawn_lock: tokio::sync::Mutex<()>,
    handlers: Arc<Mutex<Vec<ExitHandler>>>,
    generation: AtomicU64,
}

impl EngineSupervisor {
    pub fn new(command: EngineCommand, framing: Framing) -> Self {
        Self {
            command,
            framing,
            slot: Arc::new(Mutex::new(None)),
            spawn_lock: tokio::sync::Mutex::new(()),
            handlers: Arc::new(Mutex::new(Vec::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Return the live session, spawning one if none exists or it has exited.
    ///
    /// A session stalled by a timed-out request that never closed its diagram
    /// is retired here as well, since the engine would read new requests as
    /// part of that diagram. Sessions that merely answered late keep serving.
    pub async fn ensure_live(&self) -> Result<Arc<RenderSession>> {
        let _spawning = self.spawn_lock.lock().await;

        let current = self.slot.lock().clone();
        if let Some(session) = current {
            if !session.is_running().await {
                log::debug!(
                    "Engine session {} is no longer running, replacing it",
                    session.generation()
                );
            } else if session.is_stalled() {
                log::info!(
                    "Engine session {} is stuck on an unterminated diagram, replacing it",
                    session.generation()
                );
            } else {
                return Ok(session);
            }
            session.start_kill().await;
            self.clear_if_current(session.generation());
        }

        let session = self.spawn()?;
        *self.slot.lock() = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Register a listener for process exits.
    pub fn on_exit<F>(&self, handler: F)
    where
        F: Fn(&ExitReport) + Send + Sync + 'static,
    {
        self.handlers.lock().push(Arc::new(handler));
    }

    /// Process id of the tracked session, if any.
    pub fn current_pid(&self) -> Option<u32> {
        self.slot.lock().as_ref().and_then(|session| session.pid())
    }

    /// Kill the tracked process, if any. The next request spawns a new one.
    pub async fn shutdown(&self) {
        let _spawning = self.spawn_lock.lock().await;
        let session = self.slot.lock().take();
        if let Some(session) = session {
            log::debug!("Shutting down engine session {}", session.generation());
            session.kill().await;
        }
    }

    fn spawn(&self) -> Result<Arc<RenderSession>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let slot = Arc::clone(&self.slot);
        let handlers = Arc::clone(&self.handlers);

        let on_exit = Box::new(move |report: ExitReport| {
            {
                let mut slot = slot.lock();
                if slot
                    .as_ref()
                    .is_some_and(|session| session.generation() == report.generation)
                {
                    *slot = None;
                }
            }
            let handlers: Vec<ExitHandler> = handlers.lock().clone();
            for handler in handlers {
                handler(&report);
            }
        });

        RenderSession::spawn(
            self.command.streaming(&self.framing),
            self.framing.clone(),
            generation,
            on_exit,
        )
        .map_err(|source| PumlpadError::EngineSpawn {
            program: self.command.program().to_path_buf(),
            source,
        })
    }

    fn clear_if_current(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot
            .as_ref()
            .is_some_and(|session| session.generation() == generation)
        {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let command = EngineCommand::new(
            "/nonexistent/pumlpad-engine",
            Vec::<OsString>::new(),
            "UTF-8",
        );
        let supervisor = EngineSupervisor::new(command, Framing::Delimiter("--".to_string()));

        match supervisor.ensure_live().await {
            Err(PumlpadError::EngineSpawn { program, .. }) => {
                assert!(program.ends_with("pumlpad-engine"));
            }
            Err(other) => panic!("expected spawn error, got {other:?}"),
            Ok(_) => panic!("expected spawn error"),
        }
        assert!(supervisor.current_pid().is_none());
    }

    #[tokio::test]
    async fn shutdown_without_session_is_a_no_op() {
        let command = EngineCommand::new("plantuml", Vec::<OsString>::new(), "UTF-8");
        let supervisor = EngineSupervisor::new(command, Framing::Delimiter("--".to_string()));
        supervisor.shutdown().await;
        assert!(supervisor.current_pid().is_none());
    }
}
