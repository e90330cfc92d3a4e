//! Session: one logical connection to one device.
//!
//! The session owns the outbound queue, the decoder, the callback
//! registry and the identity collected during bring-up. It runs as a
//! small set of cooperating tasks:
//!
//! 1. the sender drain task (see [`crate::sender`])
//! 2. an inbound dispatch task fed by the transport's notification stream
//! 3. a readiness watchdog polling the identity during bring-up
//!
//! All mutable session state lives behind the shared inner structure and
//! is touched only by these tasks. Lifecycle:
//!
//! `Connecting` → `BringingUp` → `Ready` → `Running` → `Disconnecting` →
//! `Closed`. Bring-up failure (timeout or transport loss) is a startup
//! error; once running, failures tear the session down best-effort and
//! stop delivery to callbacks.

pub mod callbacks;
pub mod identity;

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};

use crate::error::{Result, SessionError, TransportError};
use crate::protocol::{codes, decode, encode, CommandRegistry, DecodedValue};
use crate::sender::{spawn_sender, SenderHandle};
use crate::transport::{InboundFrames, Transport};

pub use callbacks::CallbackRegistry;
pub use identity::Identity;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport handed over, tasks not yet running.
    Connecting,
    /// Identity requests sent, waiting for all four answers.
    BringingUp,
    /// Identity complete; reached exactly once per connection.
    Ready,
    /// Run loop active: periodic polling plus ad-hoc commands.
    Running,
    /// Teardown in progress.
    Disconnecting,
    /// Session is over; no more delivery to callbacks.
    Closed,
}

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Overall bring-up deadline. Identity still incomplete when it
    /// expires fails the connection attempt.
    pub bring_up_timeout: Duration,
    /// How often the watchdog re-checks identity completeness. The
    /// protocol has no "bring-up done" response, so polling is the only
    /// way to observe it.
    pub readiness_poll_interval: Duration,
    /// How often the run loop re-enqueues the metrics batch.
    pub metrics_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bring_up_timeout: Duration::from_secs(30),
            readiness_poll_interval: Duration::from_millis(250),
            metrics_interval: Duration::from_secs(10),
        }
    }
}

/// State shared between the session handle and its background tasks.
struct Shared {
    registry: CommandRegistry,
    identity: RwLock<Identity>,
    callbacks: CallbackRegistry,
    state: RwLock<SessionState>,
    fault: Mutex<Option<SessionError>>,
    stop: watch::Sender<bool>,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.read().expect("session state lock")
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().expect("session state lock");
        tracing::debug!(from = ?*state, to = ?next, "session state change");
        *state = next;
    }

    fn identity_snapshot(&self) -> Identity {
        self.identity.read().expect("identity lock").clone()
    }

    fn take_fault(&self) -> Option<SessionError> {
        self.fault.lock().expect("fault lock").take()
    }

    /// Record a fatal condition and wake every task waiting on stop.
    fn fail(&self, err: SessionError) {
        {
            let mut fault = self.fault.lock().expect("fault lock");
            if fault.is_none() {
                *fault = Some(err);
            }
        }
        {
            let mut state = self.state.write().expect("session state lock");
            if *state != SessionState::Closed {
                *state = SessionState::Disconnecting;
            }
        }
        let _ = self.stop.send(true);
    }

    /// Decode one inbound frame and run its side effects.
    ///
    /// Decode errors are logged and dropped here; they never escalate.
    fn handle_frame(&self, frame: &[u8]) {
        let value = match decode(&self.registry, frame) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    frame = %String::from_utf8_lossy(frame),
                    "dropping undecodable frame"
                );
                return;
            }
        };
        tracing::trace!(mnemonic = value.mnemonic, value = ?value.value, "decoded");
        self.update_identity(&value);
        self.callbacks.dispatch(&value);
    }

    fn update_identity(&self, value: &DecodedValue) {
        let Some(text) = value.as_text() else { return };
        let mut identity = self.identity.write().expect("identity lock");
        match value.mnemonic {
            codes::GET_NAME => identity.name = Some(text.to_string()),
            codes::GET_SERIAL_NUMBER => identity.serial_number = Some(text.to_string()),
            codes::GET_VERSION => identity.software_version = Some(text.to_string()),
            codes::GET_PCB_VERSION => identity.hardware_version = Some(text.to_string()),
            _ => {}
        }
    }
}

/// A live connection to one device.
pub struct Session {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    sender: SenderHandle,
    config: SessionConfig,
    _dispatch_task: JoinHandle<()>,
    _monitor_task: JoinHandle<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Connect over an established transport and run bring-up.
    ///
    /// Returns a session whose identity is fully populated, or a single
    /// startup error ([`SessionError::BringUpTimeout`] or the transport
    /// failure that ended the attempt).
    pub async fn connect(transport: Arc<dyn Transport>, config: SessionConfig) -> Result<Session> {
        let (stop, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            registry: CommandRegistry::new(),
            identity: RwLock::new(Identity::default()),
            callbacks: CallbackRegistry::new(),
            state: RwLock::new(SessionState::Connecting),
            fault: Mutex::new(None),
            stop,
        });

        // 1. Subscribe before the first request so no answer can be missed
        let inbound = transport.subscribe().map_err(SessionError::Transport)?;

        // 2. Spawn the sender drain task
        let (sender, sender_task) = spawn_sender(transport.clone());

        // 3. Spawn the inbound dispatch task
        let dispatch_task = tokio::spawn(dispatch_loop(shared.clone(), inbound));

        // 4. Watch the sender for transport failure
        let monitor_task = tokio::spawn(monitor_sender(shared.clone(), sender_task));

        // 5. Ask for the four identity fields
        shared.set_state(SessionState::BringingUp);
        sender.enqueue(encode::req_version());
        sender.enqueue(encode::req_name());
        sender.enqueue(encode::req_serial_number());
        sender.enqueue(encode::req_pcb_version());

        let session = Session {
            shared,
            transport,
            sender,
            config,
            _dispatch_task: dispatch_task,
            _monitor_task: monitor_task,
        };

        // 6. Watchdog: poll identity completeness under the overall timeout
        if let Err(err) = session.wait_for_identity().await {
            session.shutdown().await;
            return Err(err);
        }

        session.shared.set_state(SessionState::Ready);
        tracing::info!(identity = ?session.identity(), "bring-up complete");
        Ok(session)
    }

    async fn wait_for_identity(&self) -> Result<()> {
        let watchdog = async {
            loop {
                if self.shared.state() == SessionState::Disconnecting {
                    return Err(self
                        .shared
                        .take_fault()
                        .unwrap_or(SessionError::Transport(TransportError::Disconnected)));
                }
                if self
                    .shared
                    .identity
                    .read()
                    .expect("identity lock")
                    .is_complete()
                {
                    return Ok(());
                }
                sleep(self.config.readiness_poll_interval).await;
            }
        };
        match timeout(self.config.bring_up_timeout, watchdog).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::BringUpTimeout),
        }
    }

    /// Run the steady-state loop until stopped or the transport fails.
    ///
    /// Enqueues the initial state sweep once, then re-enqueues the
    /// metrics batch and the air-quality LED query every
    /// [`SessionConfig::metrics_interval`].
    pub async fn run(&self) -> Result<()> {
        self.shared.set_state(SessionState::Running);

        // First-connection sweep: everything the platform layer shows.
        for frame in [
            encode::req_button_states(),
            encode::req_sun_cycle_time(),
            encode::req_sun_times(),
            encode::req_activity(),
            encode::req_version(),
            encode::req_name(),
            encode::req_serial_number(),
            encode::req_pcb_version(),
            encode::req_utc_time(),
            encode::req_manual_mode(),
        ] {
            self.enqueue(frame);
        }

        let mut stop_rx = self.shared.stop.subscribe();
        let mut poll = interval(self.config.metrics_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *stop_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = poll.tick() => {
                    self.enqueue(encode::req_metrics());
                    self.enqueue(encode::req_air_quality_led());
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        match self.shared.take_fault() {
            Some(err) => {
                self.shutdown().await;
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Append one encoded command to the outbound queue.
    ///
    /// The protocol carries no request ids: a response can only be
    /// matched to a request by mnemonic, so two concurrent requests for
    /// the same mnemonic are indistinguishable on the way back. Callers
    /// wanting strict pairing must serialize per mnemonic themselves.
    pub fn enqueue(&self, frame: Bytes) {
        self.sender.enqueue(frame);
    }

    /// Subscribe `callback` to every decoded value for `mnemonic`, for
    /// the lifetime of the session.
    pub fn register_callback<F>(&self, mnemonic: &str, callback: F)
    where
        F: Fn(&DecodedValue) + Send + Sync + 'static,
    {
        self.shared.callbacks.register(mnemonic, callback);
    }

    /// Snapshot of the identity collected so far.
    pub fn identity(&self) -> Identity {
        self.shared.identity_snapshot()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Tear the session down: stop the sender after the frames queued so
    /// far, wake every task, and close the transport best-effort.
    ///
    /// Idempotent; transport errors during teardown are logged and
    /// swallowed.
    pub async fn shutdown(&self) {
        if self.shared.state() == SessionState::Closed {
            return;
        }
        self.shared.set_state(SessionState::Disconnecting);
        self.sender.stop();
        let _ = self.shared.stop.send(true);

        if let Err(err) = self.transport.disconnect().await {
            tracing::warn!(error = %err, "ignoring transport error during teardown");
        }
        self.shared.set_state(SessionState::Closed);
    }
}

/// Inbound path: decode and dispatch every notification in arrival order.
async fn dispatch_loop(shared: Arc<Shared>, mut inbound: InboundFrames) {
    let mut stop_rx = shared.stop.subscribe();
    loop {
        if *stop_rx.borrow() {
            break;
        }
        tokio::select! {
            maybe = inbound.recv() => match maybe {
                Some(frame) => shared.handle_frame(&frame),
                None => {
                    tracing::warn!("notification stream ended; connection lost");
                    shared.fail(SessionError::Transport(TransportError::Disconnected));
                    break;
                }
            },
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

/// Escalate sender-task termination into the session fault slot.
async fn monitor_sender(shared: Arc<Shared>, task: JoinHandle<std::result::Result<(), TransportError>>) {
    match task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::error!(error = %err, "sender failed; connection lost");
            shared.fail(SessionError::Transport(err));
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "sender task died");
            shared.fail(SessionError::UnrecoverableTaskFailure(join_err.to_string()));
        }
    }
}
