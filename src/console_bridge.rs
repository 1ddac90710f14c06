//! Bidirectional bridge between one script run and the console UI.
//!
//! The execution thread writes styled output and blocks for input through
//! the bridge; the UI thread drains the sink, listens for prompt events,
//! and submits lines. One bridge is created per run and owns that run's
//! [`OutputSink`] and [`InputGate`].
//!
//! Ordering guarantee: everything written before a `request_input` call is
//! already in the sink when the prompt event is delivered, because both
//! happen from the execution thread in program order. The UI therefore
//! always renders a causally-consistent transcript before showing a prompt.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{ConsoleError, ScriptFailure};
use crate::input_gate::InputGate;
use crate::output_sink::{OutputSink, OutputStyle};

/// Strip one trailing newline (`\n` or `\r\n`).
///
/// Lines crossing the bridge are normalized to carry NO trailing newline;
/// readers that emulate `readline` semantics re-append one.
fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

pub struct ConsoleBridge {
    sink: Arc<OutputSink>,
    gate: InputGate,
    stop: AtomicBool,
    prompt_tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl ConsoleBridge {
    pub fn new(link_detection: bool) -> Self {
        Self {
            sink: Arc::new(OutputSink::new(link_detection)),
            gate: InputGate::new(),
            stop: AtomicBool::new(false),
            prompt_tx: Mutex::new(None),
        }
    }

    pub fn sink(&self) -> Arc<OutputSink> {
        Arc::clone(&self.sink)
    }

    /// Append styled text to the sink. This is an I/O checkpoint: once a
    /// stop has been requested it fails with `Interrupted` so the script
    /// unwinds at its next write.
    pub fn write(&self, text: &str, style: OutputStyle) -> Result<(), ConsoleError> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(ConsoleError::Interrupted);
        }
        self.sink.append(text, style);
        Ok(())
    }

    /// Subscribe to prompt-display events. Each `request_input` call sends
    /// the prompt text here before blocking. Re-subscribing replaces the
    /// previous listener; a request already pending at subscription time is
    /// replayed so a late-attaching UI never misses its prompt.
    pub fn prompt_events(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        let mut guard = self.prompt_tx.lock();
        if let Some(pending) = self.gate.pending_prompt() {
            let _ = tx.send(pending);
        }
        *guard = Some(tx);
        rx
    }

    /// Execution-thread side of a blocking read: announce the prompt to the
    /// UI and park on the gate until a line is submitted. The returned line
    /// has its trailing newline stripped.
    pub fn request_input(&self, prompt: &str) -> Result<String, ConsoleError> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(ConsoleError::Interrupted);
        }
        debug!(prompt = prompt, "Input requested");
        {
            // Register before publishing, under the notifier lock, so a
            // concurrent `prompt_events` either sees the stored sender or
            // replays the pending prompt — never neither.
            let guard = self.prompt_tx.lock();
            self.gate.begin(prompt)?;
            if let Some(tx) = &*guard {
                // A dropped receiver just means nobody is listening yet.
                let _ = tx.send(prompt.to_string());
            }
        }
        let line = self.gate.await_line()?;
        Ok(strip_newline(&line).to_string())
    }

    /// UI-thread side: deliver one line to the blocked reader. Fails with
    /// `NoPendingRequest` when the script is not waiting for input.
    pub fn submit_input(&self, line: &str) -> Result<(), ConsoleError> {
        self.gate.fulfill(line)
    }

    /// Prompt of the outstanding input request, if any. Lets a UI that
    /// attached late (or was recreated) recover the prompt it should show.
    pub fn pending_prompt(&self) -> Option<String> {
        self.gate.pending_prompt()
    }

    /// Cooperative stop: mark the run interrupted and wake a reader blocked
    /// on input. Takes effect at the script's next I/O checkpoint — pure
    /// compute is not preempted.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.gate.interrupt();
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// `std::io::Write` adapter routing to the sink with Standard style.
    pub fn stdout_writer(self: &Arc<Self>) -> SinkWriter {
        SinkWriter {
            bridge: Arc::clone(self),
            style: OutputStyle::Standard,
            pending: Vec::new(),
        }
    }

    /// `std::io::Write` adapter routing to the sink with Error style.
    pub fn stderr_writer(self: &Arc<Self>) -> SinkWriter {
        SinkWriter {
            bridge: Arc::clone(self),
            style: OutputStyle::Error,
            pending: Vec::new(),
        }
    }
}

/// Byte-stream adapter so interpreters that expect `io::Write` handles for
/// stdout/stderr can be bound to the bridge directly.
///
/// `io::Write` callers may split a multi-byte UTF-8 sequence across two
/// calls; an incomplete trailing sequence is held back (at most three
/// bytes) and prepended to the next write, so split sequences come out as
/// the character they encode rather than replacement characters. Bytes that
/// can never complete a valid sequence are replaced with U+FFFD.
pub struct SinkWriter {
    bridge: Arc<ConsoleBridge>,
    style: OutputStyle,
    pending: Vec<u8>,
}

impl io::Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(buf);

        let mut text = String::new();
        let mut data = &bytes[..];
        loop {
            match std::str::from_utf8(data) {
                Ok(s) => {
                    text.push_str(s);
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // Lossless for the valid prefix (Cow::Borrowed).
                    text.push_str(&String::from_utf8_lossy(&data[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            text.push('\u{FFFD}');
                            data = &data[valid + bad..];
                        }
                        None => {
                            // Trailing bytes are a prefix of a valid
                            // sequence; hold them for the next write.
                            self.pending = data[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        if !text.is_empty() {
            self.bridge
                .write(&text, self.style)
                .map_err(|e| io::Error::new(io::ErrorKind::Interrupted, e))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // A sequence still incomplete at flush will never finish; emit it
        // lossily rather than drop it.
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.bridge
                .write(&String::from_utf8_lossy(&tail), self.style)
                .map_err(|e| io::Error::new(io::ErrorKind::Interrupted, e))?;
        }
        Ok(())
    }
}

/// The I/O surface handed to an [`crate::engine::Interpreter`] for one run.
///
/// Mirrors the three redirected standard streams: `print` is stdout,
/// `print_err` is stderr, `read_line` is a blocking stdin read. Errors are
/// already mapped into [`ScriptFailure`] so interpreter code can use `?`
/// directly.
pub struct ScriptIo {
    bridge: Arc<ConsoleBridge>,
}

impl ScriptIo {
    pub fn new(bridge: Arc<ConsoleBridge>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Arc<ConsoleBridge> {
        &self.bridge
    }

    pub fn print(&self, text: &str) -> Result<(), ScriptFailure> {
        self.bridge
            .write(text, OutputStyle::Standard)
            .map_err(failure_from)
    }

    pub fn print_err(&self, text: &str) -> Result<(), ScriptFailure> {
        self.bridge
            .write(text, OutputStyle::Error)
            .map_err(failure_from)
    }

    /// Blocking stdin read with `readline` semantics: the returned line
    /// includes the trailing newline the user's submission implies.
    pub fn read_line(&self, prompt: &str) -> Result<String, ScriptFailure> {
        let mut line = self.bridge.request_input(prompt).map_err(failure_from)?;
        line.push('\n');
        Ok(line)
    }

    /// Blocking stdin read with `input()` semantics: newline stripped.
    pub fn input(&self, prompt: &str) -> Result<String, ScriptFailure> {
        self.bridge.request_input(prompt).map_err(failure_from)
    }

    pub fn stop_requested(&self) -> bool {
        self.bridge.stop_requested()
    }
}

fn failure_from(err: ConsoleError) -> ScriptFailure {
    match err {
        ConsoleError::Interrupted => ScriptFailure::interrupted(),
        other => ScriptFailure::new(other.to_string()),
    }
}

#[cfg(test)]
#[path = "console_bridge_tests.rs"]
mod tests;
