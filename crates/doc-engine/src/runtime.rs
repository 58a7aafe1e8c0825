//! Runtime bridge: a dedicated runtime thread driven from host threads.
//!
//! The runtime thread owns every document buffer and content engine. Host threads never touch
//! them directly; each [`Document`](crate::Document) operation is sent as a closure over a
//! channel, executed on the runtime thread between ticks, and answered through a one-shot
//! reply channel. A periodic tick drains posted events (document releases).
//!
//! ```no_run
//! use doc_engine::{Document, EngineConfig, RuntimeBridge};
//!
//! let bridge = RuntimeBridge::new(EngineConfig::default());
//! bridge.initialize().unwrap();
//!
//! let doc = Document::new(&bridge).unwrap();
//! doc.set_text("hello").unwrap();
//! assert_eq!(doc.line_count().unwrap(), 1);
//!
//! bridge.shutdown();
//! ```

use crate::config::EngineConfig;
use crate::document::{DocumentEnv, DocumentState};
use crate::engine::ModeRegistry;
use crate::error::{EngineError, UsageError};
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

pub(crate) type DocumentId = u64;

/// Builds the mode registry on the runtime thread.
pub type ModeProvider =
    Arc<dyn Fn() -> Result<ModeRegistry, Box<dyn Error + Send + Sync>> + Send + Sync>;

/// Application name reported by [`RuntimeBridge::about`].
pub const APPLICATION_NAME: &str = "doc-engine";

/// Name and version of the embedded engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboutData {
    /// Application name.
    pub application_name: String,
    /// Crate version.
    pub version: String,
}

/// Counters sampled from the runtime thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeStats {
    /// Ticks processed since the runtime started.
    pub ticks: u64,
    /// Documents currently alive in the runtime.
    pub documents: usize,
}

pub(crate) enum RuntimeEvent {
    ReleaseDocument(DocumentId),
}

type RuntimeCall = Box<dyn FnOnce(&mut RuntimeApp) + Send>;

enum RuntimeMessage {
    Call(RuntimeCall),
    Post(RuntimeEvent),
    Quit,
}

/// State living on the runtime thread.
pub(crate) struct RuntimeApp {
    config: EngineConfig,
    modes: ModeRegistry,
    documents: HashMap<DocumentId, DocumentState>,
    next_document_id: DocumentId,
    pending: VecDeque<RuntimeEvent>,
    ticks: u64,
}

impl RuntimeApp {
    fn new(config: EngineConfig, modes: ModeRegistry) -> Self {
        Self {
            config,
            modes,
            documents: HashMap::new(),
            next_document_id: 1,
            pending: VecDeque::new(),
            ticks: 0,
        }
    }

    pub(crate) fn create_document(&mut self, mode: &str) -> Result<DocumentId, UsageError> {
        let engine = self
            .modes
            .create(mode)
            .ok_or_else(|| UsageError::UnknownMode(mode.to_string()))?;
        let id = self.next_document_id;
        self.next_document_id += 1;
        self.documents
            .insert(id, DocumentState::new(mode, engine, &self.config));
        tracing::debug!(document = id, mode, "document created");
        Ok(id)
    }

    pub(crate) fn document(
        &mut self,
        id: DocumentId,
    ) -> Result<(&mut DocumentState, DocumentEnv<'_>), UsageError> {
        let state = self
            .documents
            .get_mut(&id)
            .ok_or(UsageError::UnknownDocument(id))?;
        let env = DocumentEnv {
            modes: &self.modes,
            config: &self.config,
        };
        Ok((state, env))
    }

    pub(crate) fn available_modes(&self) -> Vec<String> {
        self.modes.available_modes()
    }

    fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            ticks: self.ticks,
            documents: self.documents.len(),
        }
    }

    fn process_events(&mut self) {
        self.ticks += 1;
        let drained = self.pending.len();
        while let Some(event) = self.pending.pop_front() {
            match event {
                RuntimeEvent::ReleaseDocument(id) => {
                    if self.documents.remove(&id).is_some() {
                        tracing::debug!(document = id, "document released");
                    }
                }
            }
        }
        tracing::trace!(tick = self.ticks, drained, "runtime tick");
    }
}

/// Sending side of a running runtime, shared by the bridge and every document.
pub(crate) struct RuntimeHandle {
    sender: mpsc::Sender<RuntimeMessage>,
    thread_id: ThreadId,
    running: AtomicBool,
}

impl RuntimeHandle {
    /// Run `f` on the runtime thread and wait for its result.
    pub(crate) fn call<R, F>(&self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut RuntimeApp) -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.running.load(Ordering::Acquire) {
            return Err(EngineError::NotInitialized);
        }
        if thread::current().id() == self.thread_id {
            return Err(UsageError::ReentrantCall.into());
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let call: RuntimeCall = Box::new(move |app| {
            let _ = reply_tx.send(f(app));
        });
        self.sender
            .send(RuntimeMessage::Call(call))
            .map_err(|_| EngineError::NotInitialized)?;
        // The reply sender is dropped unanswered if the runtime quits first.
        reply_rx.recv().map_err(|_| EngineError::NotInitialized)
    }

    /// Queue an event for the next tick. Dropped silently once the runtime is gone.
    pub(crate) fn post(&self, event: RuntimeEvent) {
        if self.running.load(Ordering::Acquire) {
            let _ = self.sender.send(RuntimeMessage::Post(event));
        }
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("thread_id", &self.thread_id)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

#[derive(Default)]
struct BridgeState {
    handle: Option<Arc<RuntimeHandle>>,
    thread: Option<JoinHandle<()>>,
    unavailable: Option<String>,
}

/// Owns the runtime thread's lifecycle.
///
/// `initialize` and `shutdown` are idempotent and may be called concurrently; the bridge lock
/// serializes them, and `is_running` reads under the same lock. Dropping the bridge shuts the
/// runtime down.
pub struct RuntimeBridge {
    config: EngineConfig,
    provider: ModeProvider,
    state: Mutex<BridgeState>,
}

impl RuntimeBridge {
    /// A bridge whose runtime only knows the plain-text mode.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_modes(config, || Ok(ModeRegistry::new()))
    }

    /// A bridge whose runtime builds its mode registry with `provider`.
    ///
    /// The provider runs on the runtime thread during `initialize`. If it fails, the runtime is
    /// permanently unavailable for this bridge.
    pub fn with_modes<F>(config: EngineConfig, provider: F) -> Self
    where
        F: Fn() -> Result<ModeRegistry, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
    {
        Self {
            config,
            provider: Arc::new(provider),
            state: Mutex::new(BridgeState::default()),
        }
    }

    /// The configuration used for new runtimes and documents.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the runtime thread and wait until it is running.
    ///
    /// Returns immediately if the runtime is already running. A runtime thread that died (a
    /// panicking call unwinds it) is reaped and replaced; documents created on it stay
    /// [`EngineError::NotInitialized`]. Reports
    /// [`EngineError::RuntimeUnavailable`] if the runtime cannot be constructed or does not
    /// come up within `runtime.start_timeout_ms`; every later call reports the same error.
    pub fn initialize(&self) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        if let Some(reason) = &state.unavailable {
            return Err(EngineError::RuntimeUnavailable(reason.clone()));
        }
        if let Some(handle) = state.handle.take() {
            let alive = state
                .thread
                .as_ref()
                .is_some_and(|thread| !thread.is_finished());
            if alive {
                state.handle = Some(handle);
                return Ok(());
            }
            handle.running.store(false, Ordering::Release);
            if let Some(thread) = state.thread.take()
                && let Err(payload) = thread.join()
            {
                tracing::error!(
                    panic = %panic_message(payload.as_ref()),
                    "runtime thread panicked"
                );
            }
            tracing::warn!("runtime thread is gone; restarting");
        }

        let (sender, receiver) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);
        let config = self.config.clone();
        let provider = Arc::clone(&self.provider);

        let spawned = thread::Builder::new()
            .name(self.config.runtime.thread_name.clone())
            .spawn(move || runtime_main(config, provider, receiver, ready_tx));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(err) => {
                return Err(mark_unavailable(
                    &mut state,
                    format!("failed to spawn runtime thread: {err}"),
                ));
            }
        };

        match ready_rx.recv_timeout(self.config.runtime.start_timeout()) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                let _ = thread.join();
                return Err(mark_unavailable(&mut state, reason));
            }
            Err(RecvTimeoutError::Timeout) => {
                // `sender` is dropped on return, so a late runtime exits on its own.
                return Err(mark_unavailable(
                    &mut state,
                    format!(
                        "runtime did not start within {} ms",
                        self.config.runtime.start_timeout_ms
                    ),
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                return Err(mark_unavailable(
                    &mut state,
                    "runtime thread exited during startup".to_string(),
                ));
            }
        }

        state.handle = Some(Arc::new(RuntimeHandle {
            sender,
            thread_id: thread.thread().id(),
            running: AtomicBool::new(true),
        }));
        state.thread = Some(thread);
        tracing::info!(
            tick_ms = self.config.runtime.tick_interval_ms,
            "document engine runtime started"
        );
        Ok(())
    }

    /// Stop the runtime and join its thread. No-op when not running.
    ///
    /// Documents created before shutdown report [`EngineError::NotInitialized`] afterwards.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        let Some(handle) = state.handle.take() else {
            return;
        };
        handle.running.store(false, Ordering::Release);
        let _ = handle.sender.send(RuntimeMessage::Quit);

        if let Some(thread) = state.thread.take() {
            if thread.thread().id() == thread::current().id() {
                tracing::warn!("shutdown requested from the runtime thread; not joining");
            } else if let Err(payload) = thread.join() {
                tracing::error!(
                    panic = %panic_message(payload.as_ref()),
                    "runtime thread panicked"
                );
            }
        }
        tracing::info!("document engine runtime stopped");
    }

    /// Returns `true` while the runtime thread is up.
    pub fn is_running(&self) -> bool {
        let state = self.lock_state();
        state.handle.is_some()
            && state
                .thread
                .as_ref()
                .is_some_and(|thread| !thread.is_finished())
    }

    /// Returns `false` once the runtime has failed to construct.
    pub fn is_runtime_available(&self) -> bool {
        self.lock_state().unavailable.is_none()
    }

    /// Application name and version.
    pub fn about(&self) -> AboutData {
        AboutData {
            application_name: APPLICATION_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Mode names known to the running runtime.
    pub fn available_modes(&self) -> Result<Vec<String>, EngineError> {
        self.handle()?.call(|app| app.available_modes())
    }

    /// Tick and document counters of the running runtime.
    pub fn stats(&self) -> Result<RuntimeStats, EngineError> {
        self.handle()?.call(|app| app.stats())
    }

    pub(crate) fn handle(&self) -> Result<Arc<RuntimeHandle>, EngineError> {
        self.lock_state()
            .handle
            .clone()
            .ok_or(EngineError::NotInitialized)
    }
}

impl Default for RuntimeBridge {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for RuntimeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("RuntimeBridge")
            .field("running", &state.handle.is_some())
            .field("unavailable", &state.unavailable)
            .finish_non_exhaustive()
    }
}

fn mark_unavailable(state: &mut BridgeState, reason: String) -> EngineError {
    tracing::error!(%reason, "document engine runtime unavailable");
    state.unavailable = Some(reason.clone());
    EngineError::RuntimeUnavailable(reason)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn runtime_main(
    config: EngineConfig,
    provider: ModeProvider,
    receiver: mpsc::Receiver<RuntimeMessage>,
    ready: mpsc::SyncSender<Result<(), String>>,
) {
    let modes = match provider() {
        Ok(modes) => modes,
        Err(err) => {
            let _ = ready.send(Err(format!("failed to build mode registry: {err}")));
            return;
        }
    };
    let tick = config.runtime.tick_interval();
    let mut app = RuntimeApp::new(config, modes);
    if ready.send(Ok(())).is_err() {
        return;
    }
    drop(ready);

    run_event_loop(&mut app, &receiver, tick);
    tracing::debug!(
        ticks = app.ticks,
        documents = app.documents.len(),
        "runtime event loop exited"
    );
}

fn run_event_loop(
    app: &mut RuntimeApp,
    receiver: &mpsc::Receiver<RuntimeMessage>,
    tick: Duration,
) {
    let mut next_tick = Instant::now() + tick;
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(timeout) {
            Ok(RuntimeMessage::Call(call)) => call(app),
            Ok(RuntimeMessage::Post(event)) => app.pending.push_back(event),
            Ok(RuntimeMessage::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        if Instant::now() >= next_tick {
            app.process_events();
            next_tick = Instant::now() + tick;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_initialize_is_idempotent_and_shutdown_is_noop_when_stopped() {
        let bridge = RuntimeBridge::default();
        bridge.shutdown();
        assert!(!bridge.is_running());

        bridge.initialize().unwrap();
        bridge.initialize().unwrap();
        assert!(bridge.is_running());

        bridge.shutdown();
        bridge.shutdown();
        assert!(!bridge.is_running());
        assert!(bridge.is_runtime_available());
    }

    #[test]
    fn test_concurrent_initialize_starts_one_runtime() {
        let bridge = Arc::new(RuntimeBridge::default());
        let barrier = Arc::new(Barrier::new(4));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    bridge.initialize().unwrap();
                    assert!(bridge.is_running());
                    bridge.handle().unwrap().thread_id
                })
            })
            .collect();

        let ids: Vec<ThreadId> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_provider_failure_is_permanent() {
        let bridge = RuntimeBridge::with_modes(EngineConfig::default(), || {
            Err("syntax definitions missing".into())
        });

        let err = bridge.initialize().unwrap_err();
        assert!(matches!(
            &err,
            EngineError::RuntimeUnavailable(reason) if reason.contains("syntax definitions missing")
        ));
        assert!(!bridge.is_runtime_available());
        assert!(!bridge.is_running());
        assert!(matches!(
            bridge.initialize(),
            Err(EngineError::RuntimeUnavailable(_))
        ));
    }

    #[test]
    fn test_start_timeout_reports_unavailable() {
        let mut config = EngineConfig::default();
        config.runtime.start_timeout_ms = 20;
        let bridge = RuntimeBridge::with_modes(config, || {
            thread::sleep(Duration::from_millis(300));
            Ok(ModeRegistry::new())
        });

        let err = bridge.initialize().unwrap_err();
        assert!(matches!(
            &err,
            EngineError::RuntimeUnavailable(reason) if reason.contains("20 ms")
        ));
    }

    #[test]
    fn test_call_from_runtime_thread_is_rejected() {
        let bridge = RuntimeBridge::default();
        bridge.initialize().unwrap();
        let handle = bridge.handle().unwrap();

        let inner = Arc::clone(&handle);
        let nested = handle
            .call(move |_| inner.call(|app| app.available_modes()))
            .unwrap();
        assert!(matches!(
            nested,
            Err(EngineError::Usage(UsageError::ReentrantCall))
        ));
    }

    #[test]
    fn test_calls_fail_after_shutdown() {
        let bridge = RuntimeBridge::default();
        assert!(matches!(bridge.stats(), Err(EngineError::NotInitialized)));

        bridge.initialize().unwrap();
        let handle = bridge.handle().unwrap();
        assert_eq!(
            bridge.available_modes().unwrap(),
            vec!["Normal".to_string()]
        );

        bridge.shutdown();
        assert!(matches!(
            handle.call(|app| app.stats()),
            Err(EngineError::NotInitialized)
        ));
    }

    #[test]
    fn test_initialize_restarts_a_dead_runtime_thread() {
        let bridge = RuntimeBridge::default();
        bridge.initialize().unwrap();
        let old = bridge.handle().unwrap();

        let result = old.call(|_| -> usize { panic!("engine bug") });
        assert!(matches!(result, Err(EngineError::NotInitialized)));

        let deadline = Instant::now() + Duration::from_secs(5);
        while bridge.is_running() {
            assert!(Instant::now() < deadline, "runtime thread never exited");
            thread::sleep(Duration::from_millis(2));
        }

        bridge.initialize().unwrap();
        assert!(bridge.is_running());
        assert!(bridge.is_runtime_available());
        assert_eq!(bridge.stats().unwrap().documents, 0);
        assert!(matches!(
            old.call(|app| app.stats()),
            Err(EngineError::NotInitialized)
        ));
    }

    #[test]
    fn test_ticks_advance() {
        let mut config = EngineConfig::default();
        config.runtime.tick_interval_ms = 1;
        let bridge = RuntimeBridge::new(config);
        bridge.initialize().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while bridge.stats().unwrap().ticks < 3 {
            assert!(Instant::now() < deadline, "runtime never ticked");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_about_reports_name_and_version() {
        let about = RuntimeBridge::default().about();
        assert_eq!(about.application_name, "doc-engine");
        assert_eq!(about.version, env!("CARGO_PKG_VERSION"));
    }
}
