//! One running streaming-mode engine process.
//!
//! A [`RenderSession`] owns the child process and its pipes. The engine
//! answers in input order, one document per diagram, so correlation is
//! positional: requests are written to stdin under a lock that also reserves
//! the stream positions of the documents each request will produce. A reader
//! task decodes stdout into documents as chunks arrive and hands document `n`
//! to whoever reserved position `n`.
//!
//! A request that times out abandons its position. Its late document is
//! dropped instead of being handed to a later request. If the abandoned
//! markup had no end tag the engine is still reading that diagram and will
//! fold the next request into it; the session then reports itself stalled so
//! the supervisor can retire it.

use crate::engine::{FrameDecoder, Framing};
use crate::error::{PumlpadError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Stream position of a request's first document
pub type RequestId = u64;

const READ_CHUNK: usize = 8 * 1024;

/// What is known about a finished engine process
#[derive(Debug, Clone)]
pub struct ExitReport {
    /// Spawn counter of the supervisor that started the process
    pub generation: u64,
    pub pid: Option<u32>,
    pub status: Option<ExitStatus>,
}

/// Callback run once by the session's monitor task after the process is gone
pub(crate) type ExitCallback = Box<dyn FnOnce(ExitReport) + Send + 'static>;

/// Reserved stream positions, shared with the stdout reader
#[derive(Default)]
struct Pending {
    waiters: HashMap<RequestId, oneshot::Sender<String>>,
    /// Positions of second and later diagrams within one request
    extra: HashSet<u64>,
    /// Positions given up by timed-out requests whose document is still due
    abandoned: HashSet<u64>,
    /// Abandoned positions whose markup never closed its diagram
    stalled: HashSet<u64>,
    closed: bool,
    status: Option<ExitStatus>,
}

pub struct RenderSession {
    generation: u64,
    pid: Option<u32>,
    child: Arc<tokio::sync::Mutex<Child>>,
    writer: tokio::sync::Mutex<Writer>,
    pending: Arc<Mutex<Pending>>,
    alive: Arc<AtomicBool>,
}

struct Writer {
    stdin: ChildStdin,
    /// Position of the next document the engine will emit for new input
    next_position: u64,
}

impl RenderSession {
    /// Start the process described by `command` and its background tasks.
    pub(crate) fn spawn(
        mut command: Command,
        framing: Framing,
        generation: u64,
        on_exit: ExitCallback,
    ) -> std::io::Result<Arc<Self>> {
        let mut child = command.spawn()?;
        let pid = child.id();

        let missing = |stream: &str| {
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("engine {stream} was not captured"),
            )
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take();

        let session = Arc::new(Self {
            generation,
            pid,
            child: Arc::new(tokio::sync::Mutex::new(child)),
            writer: tokio::sync::Mutex::new(Writer {
                stdin,
                next_position: 0,
            }),
            pending: Arc::new(Mutex::new(Pending::default())),
            alive: Arc::new(AtomicBool::new(true)),
        });

        if let Some(stderr) = stderr {
            tokio::spawn(drain_stderr(stderr, pid));
        }

        let monitor = Monitor {
            generation,
            pid,
            child: Arc::clone(&session.child),
            pending: Arc::clone(&session.pending),
            alive: Arc::clone(&session.alive),
        };
        tokio::spawn(monitor.run(stdout, FrameDecoder::new(framing), on_exit));

        log::debug!("Engine session {generation} started (pid {pid:?})");
        Ok(session)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process is still running.
    ///
    /// Checks the exit event first, then polls the child without blocking.
    pub async fn is_running(&self) -> bool {
        if !self.alive.load(Ordering::SeqCst) {
            return false;
        }
        match self.child.lock().await.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => {
                self.alive.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Whether a timed-out request left a diagram open in the engine.
    ///
    /// While one is, the engine reads new requests as part of that diagram.
    pub fn is_stalled(&self) -> bool {
        !self.pending.lock().stalled.is_empty()
    }

    /// Write one request and wait for its first document.
    ///
    /// The markup is sent with trailing whitespace removed and a single
    /// newline appended. The deadline covers waiting for the writer too.
    pub async fn request(&self, markup: &str, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();
        let end_tags = count_end_tags(markup);
        let documents = end_tags.max(1);

        let request_id = {
            let mut writer = self.writer.lock().await;
            let request_id = writer.next_position;
            self.register(request_id, documents, tx)?;
            writer.next_position += documents;

            let payload = encode_request(markup);
            if let Err(err) = write_payload(&mut writer.stdin, payload.as_bytes()).await {
                self.abandon(request_id, true);
                self.alive.store(false, Ordering::SeqCst);
                return Err(PumlpadError::file_error("Failed to write to engine stdin", err));
            }
            request_id
        };
        log::debug!(
            "Render request {request_id} sent to session {} ({} bytes)",
            self.generation,
            markup.len()
        );

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(_)) => Err(PumlpadError::EngineExited {
                status: self.pending.lock().status,
            }),
            Err(_) => {
                self.abandon(request_id, end_tags > 0);
                log::debug!("Render request {request_id} timed out after {timeout:?}");
                Err(PumlpadError::RenderTimeout { timeout })
            }
        }
    }

    /// Kill the process and wait for it to be reaped.
    pub async fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let mut child = self.child.lock().await;
        if let Err(err) = child.kill().await {
            log::debug!("Killing engine session {} failed: {err}", self.generation);
        }
    }

    /// Ask the process to die without waiting.
    pub(crate) async fn start_kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let _ = self.child.lock().await.start_kill();
    }

    fn register(
        &self,
        request_id: RequestId,
        documents: u64,
        tx: oneshot::Sender<String>,
    ) -> Result<()> {
        let mut pending = self.pending.lock();
        if pending.closed {
            return Err(PumlpadError::EngineExited {
                status: pending.status,
            });
        }
        pending.waiters.insert(request_id, tx);
        pending.extra.extend(request_id + 1..request_id + documents);
        Ok(())
    }

    fn abandon(&self, request_id: RequestId, closed_diagram: bool) {
        let mut pending = self.pending.lock();
        // No waiter left means the document arrived just as the deadline hit.
        if pending.waiters.remove(&request_id).is_some() {
            pending.abandoned.insert(request_id);
            if !closed_diagram {
                pending.stalled.insert(request_id);
            }
        }
    }
}

async fn write_payload(stdin: &mut ChildStdin, payload: &[u8]) -> std::io::Result<()> {
    stdin.write_all(payload).await?;
    stdin.flush().await
}

/// Diagram end tags (`@enduml`, `@endmindmap`, ...) in `markup`. The engine
/// emits one document per end tag.
fn count_end_tags(markup: &str) -> u64 {
    markup
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            line.len() >= 4 && line.as_bytes()[..4].eq_ignore_ascii_case(b"@end")
        })
        .count() as u64
}

fn encode_request(markup: &str) -> String {
    let mut payload = markup.trim_end().to_string();
    payload.push('\n');
    payload
}

/// Background reader that routes documents and reports the exit.
struct Monitor {
    generation: u64,
    pid: Option<u32>,
    child: Arc<tokio::sync::Mutex<Child>>,
    pending: Arc<Mutex<Pending>>,
    alive: Arc<AtomicBool>,
}

impl Monitor {
    async fn run(self, mut stdout: ChildStdout, mut decoder: FrameDecoder, on_exit: ExitCallback) {
        let mut chunk = vec![0u8; READ_CHUNK];
        let mut position: u64 = 0;

        loop {
            match stdout.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    for document in decoder.push(&chunk[..n]) {
                        self.deliver(position, document);
                        position += 1;
                    }
                }
                Err(err) => {
                    log::error!("Error reading engine stdout: {err}");
                    break;
                }
            }
        }

        // Stdout closed: the process is finished (or must be).
        self.alive.store(false, Ordering::SeqCst);
        let status = {
            let mut child = self.child.lock().await;
            let _ = child.start_kill();
            child.wait().await.ok()
        };
        {
            let mut pending = self.pending.lock();
            pending.closed = true;
            pending.status = status;
            // Dropping the senders fails every waiting request at once.
            pending.waiters.clear();
        }
        if decoder.pending_len() > 0 {
            log::debug!(
                "Engine session {} left {} undecoded bytes",
                self.generation,
                decoder.pending_len()
            );
        }
        log::debug!(
            "Engine session {} exited (pid {:?}, status {:?})",
            self.generation,
            self.pid,
            status
        );

        on_exit(ExitReport {
            generation: self.generation,
            pid: self.pid,
            status,
        });
    }

    fn deliver(&self, position: u64, document: String) {
        let waiter = {
            let mut pending = self.pending.lock();
            match pending.waiters.remove(&position) {
                Some(tx) => Some(tx),
                None => {
                    if pending.abandoned.remove(&position) {
                        pending.stalled.remove(&position);
                        log::debug!("Discarding late document for timed-out request {position}");
                    } else if pending.extra.remove(&position) {
                        log::debug!("Discarding additional diagram at position {position}");
                    } else {
                        log::warn!("Engine produced an unexpected document at position {position}");
                    }
                    None
                }
            }
        };
        if let Some(tx) = waiter {
            if tx.send(document).is_err() {
                log::debug!("Render request {position} dropped before its document arrived");
            }
        }
    }
}

async fn drain_stderr(stderr: ChildStderr, pid: Option<u32>) {
    let mut reader = BufReader::new(stderr);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    log::warn!("Engine [{pid:?}] stderr: {trimmed}");
                }
            }
        }
    }
}
