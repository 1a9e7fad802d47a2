//! Session lifecycle: connect, watch, reconnect.
//!
//! The supervisor owns the one live [`TransportSession`] and two background
//! tasks: a monitor loop that ticks on a fixed cadence, and a receive loop
//! that drains the event stream while one is open. State flows strictly
//! through the [`StateTracker`]; the supervisor never calls subscribers
//! itself.
//!
//! The monitor tick decides everything from two bits, host liveness and
//! connectedness:
//!
//! - host gone while connected: tear everything down, reset the tracker
//! - host up while disconnected: one reconnect attempt, backoff between ticks
//! - connected without a stream: refresh state over REST, then try to open
//!   the stream again
//! - connected with a stream: idle, the receive loop drives the tracker

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use lcu_protocol::{ClientEvent, TOPIC_CHAMP_SELECT, TOPIC_GAMEFLOW_PHASE, decode_frame};

use crate::diag::ConnectionLog;
use crate::error::{Error, Result};
use crate::host;
use crate::lockfile::{CredentialLocator, LocatorConfig};
use crate::tracker::StateTracker;
use crate::transport::TransportSession;

/// Monitor cadence while nothing is wrong.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// First reconnect delay; doubles per failed attempt.
const BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Backoff ceiling.
const BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Exponent cap so the doubling can't overflow.
const BACKOFF_EXP_CAP: u32 = 5;

/// Delay before reconnect attempt number `attempt` (zero-based).
fn reconnect_delay(attempt: u32) -> Duration {
    BACKOFF_BASE
        .saturating_mul(1u32 << attempt.min(BACKOFF_EXP_CAP))
        .min(BACKOFF_MAX)
}

/// Point-in-time connectivity summary for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHealth {
    /// A session is installed and its last REST probe succeeded.
    pub rest_reachable: bool,
    /// The push channel is open and subscribed.
    pub event_stream_open: bool,
    /// The client process was in the process table on the last tick.
    pub host_process_running: bool,
    /// Frames received but discarded as undecodable since startup.
    pub dropped_frames: u64,
}

type HostProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// A background task and the switch that stops it.
struct TaskHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

struct Inner {
    locator: CredentialLocator,
    tracker: Arc<StateTracker>,
    log: ConnectionLog,
    host_probe: HostProbe,
    session: Mutex<Option<Arc<TransportSession>>>,
    monitor: Mutex<Option<TaskHandle>>,
    stream: Mutex<Option<TaskHandle>>,
    stream_open: AtomicBool,
    host_running: AtomicBool,
    reconnect_attempt: AtomicU32,
    dropped_frames: AtomicU64,
}

/// Owns the session and keeps it alive across client restarts.
///
/// Cheap to clone; clones share the same session and tasks.
#[derive(Clone)]
pub struct SessionSupervisor {
    inner: Arc<Inner>,
}

impl SessionSupervisor {
    pub fn new(config: LocatorConfig) -> Self {
        Self::with_host_probe(config, Arc::new(host::host_is_running))
    }

    /// Constructor with an injectable liveness probe.
    fn with_host_probe(config: LocatorConfig, host_probe: HostProbe) -> Self {
        let log = ConnectionLog::new();
        Self {
            inner: Arc::new(Inner {
                locator: CredentialLocator::new(config, log.clone()),
                tracker: Arc::new(StateTracker::new()),
                log,
                host_probe,
                session: Mutex::new(None),
                monitor: Mutex::new(None),
                stream: Mutex::new(None),
                stream_open: AtomicBool::new(false),
                host_running: AtomicBool::new(false),
                reconnect_attempt: AtomicU32::new(0),
                dropped_frames: AtomicU64::new(0),
            }),
        }
    }

    pub fn tracker(&self) -> &Arc<StateTracker> {
        &self.inner.tracker
    }

    pub fn log(&self) -> &ConnectionLog {
        &self.inner.log
    }

    /// The live session, when one is installed.
    pub fn session(&self) -> Option<Arc<TransportSession>> {
        self.inner.session.lock().clone()
    }

    pub fn is_event_stream_open(&self) -> bool {
        self.inner.stream_open.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> SessionHealth {
        SessionHealth {
            rest_reachable: self.inner.tracker.is_connected(),
            event_stream_open: self.inner.stream_open.load(Ordering::SeqCst),
            host_process_running: self.inner.host_running.load(Ordering::SeqCst),
            dropped_frames: self.inner.dropped_frames.load(Ordering::SeqCst),
        }
    }

    /// One full connect: locate credentials, build a session, verify with a
    /// phase probe, install. Any prior session is discarded first.
    ///
    /// Succeeding resets the backoff counter and pushes the probed phase
    /// through the tracker.
    pub async fn try_connect(&self) -> Result<()> {
        self.inner.session.lock().take();

        // The locator does file probes with bounded retry sleeps.
        let locator = self.inner.locator.clone();
        let descriptor = tokio::task::spawn_blocking(move || locator.locate())
            .await
            .map_err(|err| Error::Io(std::io::Error::other(err)))??;

        let session = Arc::new(TransportSession::connect(descriptor, self.inner.log.clone())?);
        let phase = session.phase().await?;

        *self.inner.session.lock() = Some(Arc::clone(&session));
        self.inner.reconnect_attempt.store(0, Ordering::SeqCst);
        self.inner.log.push("connected");
        info!(target = "lcu.supervisor", ?phase, "session established");

        self.inner.tracker.set_connected(true);
        self.inner.tracker.apply_phase(phase);
        if phase.selection_is_valid() {
            self.refresh_selection(&session).await;
        }
        Ok(())
    }

    /// Starts the monitor loop. Idempotent: a second call while the loop is
    /// running does nothing.
    pub fn start_monitoring(&self) {
        let mut monitor = self.inner.monitor.lock();
        if monitor.is_some() {
            return;
        }

        let (shutdown, mut signal) = watch::channel(false);
        let supervisor = self.clone();
        let task = tokio::spawn(async move {
            loop {
                let inner = &supervisor.inner;
                let delay = if !inner.tracker.is_connected()
                    && inner.host_running.load(Ordering::SeqCst)
                {
                    reconnect_delay(inner.reconnect_attempt.load(Ordering::SeqCst))
                } else {
                    POLL_INTERVAL
                };

                tokio::select! {
                    _ = signal.changed() => break,
                    _ = sleep(delay) => supervisor.tick().await,
                }
            }
        });

        *monitor = Some(TaskHandle { shutdown, task });
        self.inner.log.push("monitoring started");
    }

    /// Stops the monitor loop and any open event stream.
    pub async fn stop_monitoring(&self) {
        let handle = self.inner.monitor.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            self.inner.log.push("monitoring stopped");
        }
        self.teardown_stream().await;
    }

    /// Full teardown: background tasks, session, tracker state.
    pub async fn disconnect(&self) {
        self.stop_monitoring().await;
        self.inner.session.lock().take();
        self.inner.tracker.reset_to_disconnected();
        self.inner.log.push("disconnected");
    }

    /// One monitor tick. See the module docs for the decision table.
    async fn tick(&self) {
        let inner = &self.inner;
        let host_up = (inner.host_probe)();
        inner.host_running.store(host_up, Ordering::SeqCst);

        if !host_up {
            if inner.tracker.is_connected() {
                info!(target = "lcu.supervisor", "client process exited");
                inner.log.push("client process exited");
                self.teardown_stream().await;
                inner.session.lock().take();
                inner.tracker.reset_to_disconnected();
            }
            return;
        }

        if !inner.tracker.is_connected() {
            let attempt = inner.reconnect_attempt.fetch_add(1, Ordering::SeqCst) + 1;
            inner.log.push(format!("reconnect attempt #{attempt}"));
            if let Err(err) = self.try_connect().await {
                debug!(target = "lcu.supervisor", attempt, error = %err, "reconnect failed");
            }
            return;
        }

        if !inner.stream_open.load(Ordering::SeqCst) {
            // REST keeps the tracker fresh while the push channel is down.
            let session = inner.session.lock().clone();
            if let Some(session) = session {
                if let Err(err) = self.poll_once(&session).await {
                    warn!(target = "lcu.supervisor", error = %err, "poll failed, dropping session");
                    inner.log.push("poll failed");
                    inner.session.lock().take();
                    inner.tracker.reset_to_disconnected();
                    return;
                }
                self.open_stream(session).await;
            } else {
                inner.tracker.reset_to_disconnected();
            }
        }
    }

    /// One REST refresh of phase and, when it matters, selection.
    async fn poll_once(&self, session: &Arc<TransportSession>) -> Result<()> {
        let phase = session.phase().await?;
        self.inner.tracker.apply_phase(phase);
        if phase.selection_is_valid() {
            self.refresh_selection(session).await;
        }
        Ok(())
    }

    /// Selection is best-effort: the endpoint 404s outside champ select and
    /// races with phase transitions, so a miss here is not a session fault.
    async fn refresh_selection(&self, session: &Arc<TransportSession>) {
        match session.champ_select().await {
            Ok(cs) => self
                .inner
                .tracker
                .apply_selection(cs.my_champion_id(), cs.enemy_champion_ids()),
            Err(err) => debug!(target = "lcu.supervisor", error = %err, "champ select probe missed"),
        }
    }

    /// Tries to open the event stream and spawns the receive loop.
    ///
    /// Failure is quiet: the tick keeps polling over REST and retries the
    /// stream next time around.
    async fn open_stream(&self, session: Arc<TransportSession>) {
        let mut stream = match session
            .open_event_stream(&[TOPIC_GAMEFLOW_PHASE, TOPIC_CHAMP_SELECT])
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                debug!(target = "lcu.supervisor", error = %err, "event stream open failed");
                return;
            }
        };

        let (shutdown, mut signal) = watch::channel(false);
        self.inner.stream_open.store(true, Ordering::SeqCst);

        let supervisor = self.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.changed() => break,
                    frame = stream.next_text() => match frame {
                        Some(text) => supervisor.handle_frame(&text),
                        None => break,
                    },
                }
            }
            stream.close().await;
            supervisor.inner.stream_open.store(false, Ordering::SeqCst);
            supervisor.inner.log.push("websocket disconnected");
            debug!(target = "lcu.supervisor", "event stream closed");
        });

        *self.inner.stream.lock() = Some(TaskHandle { shutdown, task });
    }

    /// Decodes one pushed frame into tracker updates.
    ///
    /// Undecodable frames are counted and skipped; the stream stays up.
    fn handle_frame(&self, text: &str) {
        match decode_frame(text) {
            Ok(Some(ClientEvent::PhaseChanged(phase))) => self.inner.tracker.apply_phase(phase),
            Ok(Some(ClientEvent::SelectionChanged {
                champion_id,
                enemy_champion_ids,
            })) => self
                .inner
                .tracker
                .apply_selection(champion_id, enemy_champion_ids),
            Ok(None) => {}
            Err(err) => {
                self.inner.dropped_frames.fetch_add(1, Ordering::SeqCst);
                debug!(target = "lcu.supervisor", reason = err.0, "dropped undecodable frame");
            }
        }
    }

    async fn teardown_stream(&self) {
        let handle = self.inner.stream.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
        self.inner.stream_open.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("health", &self.health())
            .finish()
    }
}
