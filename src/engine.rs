//! Interpreter lifecycle manager.
//!
//! One [`ExecutionEngine`] owns the interpreter and runs at most one script
//! at a time on a dedicated execution thread, with that thread's standard
//! output, error, and input redirected through a fresh [`ConsoleBridge`].
//! `run` returns immediately; completion is delivered through the per-run
//! callback and observable via [`ExecutionEngine::state`].
//!
//! ## Process-wide handle
//!
//! Hosts that want the "one interpreter per process" arrangement call
//! [`init_shared`] once during bootstrap and [`shared`] everywhere else.
//! The handle lives for the process lifetime and is never torn down.
//! Embedders (and tests) that manage their own instance use
//! [`ExecutionEngine::new`] directly.
//!
//! ## Preconditions
//!
//! `run` must not be called from the running script's own execution thread.
//! The engine does not detect this; doing it anyway deadlocks or fails in
//! unspecified ways.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::console_bridge::{ConsoleBridge, ScriptIo};
use crate::error::{ConsoleError, ScriptFailure};
use crate::script::Script;

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success,
    Failure(ScriptFailure),
}

/// Engine lifecycle. `Finished` is re-runnable; `Running` rejects a second
/// `run` with `AlreadyRunning`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    Idle,
    Running,
    Finished(RunOutcome),
}

/// The seam to the embedded interpreter. Semantics of the language are
/// opaque to this crate: an interpreter receives the script and the I/O
/// surface of the run and either completes or reports the uncaught failure.
///
/// Closures with the matching signature implement this directly, which is
/// how tests script engine behavior.
pub trait Interpreter: Send + Sync {
    fn eval(&self, script: &Script, io: &ScriptIo) -> Result<(), ScriptFailure>;
}

impl<F> Interpreter for F
where
    F: Fn(&Script, &ScriptIo) -> Result<(), ScriptFailure> + Send + Sync,
{
    fn eval(&self, script: &Script, io: &ScriptIo) -> Result<(), ScriptFailure> {
        self(script, io)
    }
}

struct EngineInner {
    state: EngineState,
    bridge: Option<Arc<ConsoleBridge>>,
    // Held so the run's execution thread is inspectable alongside its
    // bridge; replaced wholesale when the next run commits, never joined —
    // completion is signalled by the callback.
    thread: Option<thread::JoinHandle<()>>,
}

pub struct ExecutionEngine {
    interpreter: Arc<dyn Interpreter>,
    link_detection: AtomicBool,
    #[cfg(test)]
    spawn_failure: AtomicBool,
    inner: Mutex<EngineInner>,
}

impl ExecutionEngine {
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            interpreter,
            link_detection: AtomicBool::new(true),
            #[cfg(test)]
            spawn_failure: AtomicBool::new(false),
            inner: Mutex::new(EngineInner {
                state: EngineState::Idle,
                bridge: None,
                thread: None,
            }),
        }
    }

    /// Make the next `run_with` fail as if the execution thread could not
    /// be spawned, to exercise the no-commit-on-failure path.
    #[cfg(test)]
    pub(crate) fn fail_next_spawn(&self) {
        self.spawn_failure.store(true, Ordering::Relaxed);
    }

    /// Whether bridges created for future runs scan output for URLs.
    /// Typically wired from [`crate::config::ConsoleConfig::linkify_urls`].
    pub fn set_link_detection(&self, enabled: bool) {
        self.link_detection.store(enabled, Ordering::Relaxed);
    }

    pub fn state(&self) -> EngineState {
        self.inner.lock().state.clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.inner.lock().state, EngineState::Running)
    }

    /// Bridge of the current run, or of the most recent finished run (kept
    /// so the UI can still display the transcript).
    pub fn bridge(&self) -> Option<Arc<ConsoleBridge>> {
        self.inner.lock().bridge.clone()
    }

    /// Start `script` on a new execution thread and return immediately.
    /// Completion state is observable via [`ExecutionEngine::state`].
    pub fn run(self: &Arc<Self>, script: Script) -> Result<(), ConsoleError> {
        self.run_with(script, |_| {})
    }

    /// Start `script` on a new execution thread; `on_complete` fires exactly
    /// once with the terminal outcome.
    ///
    /// Fails with `AlreadyRunning` while a script is active — the in-flight
    /// run is never queued behind, canceled, or restarted. The callback is
    /// invoked from the execution thread as it exits; marshaling onto a UI
    /// thread is the embedder's concern.
    pub fn run_with<F>(self: &Arc<Self>, script: Script, on_complete: F) -> Result<(), ConsoleError>
    where
        F: FnOnce(RunOutcome) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if matches!(inner.state, EngineState::Running) {
            warn!(script = script.display_name(), "Run rejected: already running");
            return Err(ConsoleError::AlreadyRunning);
        }

        info!(script = script.display_name(), "Starting script run");

        let bridge = Arc::new(ConsoleBridge::new(self.link_detection.load(Ordering::Relaxed)));
        let thread_bridge = Arc::clone(&bridge);

        #[cfg(test)]
        if self.spawn_failure.swap(false, Ordering::Relaxed) {
            return Err(ConsoleError::Config(
                "failed to spawn execution thread: injected failure".to_string(),
            ));
        }

        let engine = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("script-exec".to_string())
            .spawn(move || {
                let io = ScriptIo::new(thread_bridge);
                let outcome = match engine.interpreter.eval(&script, &io) {
                    Ok(()) => RunOutcome::Success,
                    Err(mut failure) => {
                        // Fill in the originating path when the diagnostic
                        // itself carried none.
                        if failure.path.is_none() {
                            failure.path = script.path().map(Into::into);
                        }
                        RunOutcome::Failure(failure)
                    }
                };

                match &outcome {
                    RunOutcome::Success => {
                        debug!(script = script.display_name(), "Script finished")
                    }
                    RunOutcome::Failure(f) => {
                        error!(script = script.display_name(), failure = %f, "Script failed")
                    }
                }

                engine.inner.lock().state = EngineState::Finished(outcome.clone());
                on_complete(outcome);
            })
            .map_err(|e| ConsoleError::Config(format!("failed to spawn execution thread: {e}")))?;

        // Commit only once the thread exists. A failed spawn returns above
        // with the previous state (and its bridge/handle) still in place
        // instead of a phantom Running that nothing will ever finish.
        inner.thread = Some(handle);
        inner.bridge = Some(bridge);
        inner.state = EngineState::Running;
        Ok(())
    }

    /// Best-effort cooperative stop: the run is signalled to halt at its
    /// next I/O checkpoint. Pure-compute code is not preempted; that is a
    /// documented limitation, not a defect.
    pub fn request_stop(&self) {
        let inner = self.inner.lock();
        if let (EngineState::Running, Some(bridge)) = (&inner.state, &inner.bridge) {
            info!("Stop requested for running script");
            bridge.request_stop();
        }
    }
}

static SHARED: OnceLock<Arc<ExecutionEngine>> = OnceLock::new();

/// One-time installation of the process-wide engine. Returns `false` when a
/// shared engine already exists (the existing one stays in place).
pub fn init_shared(interpreter: Arc<dyn Interpreter>) -> bool {
    SHARED
        .set(Arc::new(ExecutionEngine::new(interpreter)))
        .is_ok()
}

/// The process-wide engine. Panics if [`init_shared`] has not run — the
/// host bootstrap is required to install the interpreter before anything
/// asks for the engine.
pub fn shared() -> Arc<ExecutionEngine> {
    SHARED
        .get()
        .cloned()
        .expect("engine::init_shared must be called during host bootstrap")
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
