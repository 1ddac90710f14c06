//! Single-slot rendezvous for delivering one line of user input to a
//! blocked reader.
//!
//! This is deliberately not a queue: the slot holds at most one pending
//! request, so the "one prompt at a time" invariant is enforced by the
//! structure instead of by caller discipline. States move
//! Empty → Requested → Fulfilled → Empty; `request` blocks the execution
//! thread between Requested and Fulfilled, `fulfill` is the UI thread's
//! half of the exchange.
//!
//! `interrupt` closes the gate permanently. Closing is sticky so a stop
//! request can never lose a race with a reader that is about to park: a
//! request arriving after the close returns `Interrupted` instead of
//! blocking forever. A gate lives for exactly one run, so there is no
//! reopen.

use parking_lot::{Condvar, Mutex};

use crate::error::ConsoleError;

#[derive(Debug)]
enum Slot {
    Empty,
    Requested { prompt: String },
    Fulfilled { line: String },
}

#[derive(Debug)]
struct State {
    slot: Slot,
    closed: bool,
}

#[derive(Debug)]
pub struct InputGate {
    state: Mutex<State>,
    cond: Condvar,
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InputGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Empty,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until another thread fulfills this request and return the
    /// submitted line.
    ///
    /// Fails with `DoubleRequest` if a request is already pending — that is
    /// a caller bug, not a condition to serialize around — and with
    /// `Interrupted` once the gate has been closed.
    pub fn request(&self, prompt: &str) -> Result<String, ConsoleError> {
        self.begin(prompt)?;
        self.await_line()
    }

    /// Register a request without blocking. Split from [`InputGate::request`]
    /// so the bridge can publish the prompt event after the request is
    /// registered but before the caller parks.
    pub(crate) fn begin(&self, prompt: &str) -> Result<(), ConsoleError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ConsoleError::Interrupted);
        }
        match state.slot {
            Slot::Empty => {
                state.slot = Slot::Requested {
                    prompt: prompt.to_string(),
                };
                Ok(())
            }
            _ => Err(ConsoleError::DoubleRequest),
        }
    }

    /// Block until the request registered by [`InputGate::begin`] resolves.
    pub(crate) fn await_line(&self) -> Result<String, ConsoleError> {
        let mut state = self.state.lock();
        loop {
            if let Slot::Fulfilled { .. } = state.slot {
                let Slot::Fulfilled { line } = std::mem::replace(&mut state.slot, Slot::Empty)
                else {
                    unreachable!()
                };
                return Ok(line);
            }
            if state.closed {
                state.slot = Slot::Empty;
                return Err(ConsoleError::Interrupted);
            }
            self.cond.wait(&mut state);
        }
    }

    /// Deliver a line to the blocked requester. Valid only while a request
    /// is pending; in the Empty state the input would be silently lost, so
    /// this fails instead.
    pub fn fulfill(&self, line: &str) -> Result<(), ConsoleError> {
        let mut state = self.state.lock();
        if state.closed || !matches!(state.slot, Slot::Requested { .. }) {
            return Err(ConsoleError::NoPendingRequest);
        }
        state.slot = Slot::Fulfilled {
            line: line.to_string(),
        };
        self.cond.notify_one();
        Ok(())
    }

    /// Close the gate: wake a blocked requester with `Interrupted` and make
    /// every later `request` fail the same way.
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.cond.notify_all();
    }

    /// Prompt of the pending request, if one is outstanding.
    pub fn pending_prompt(&self) -> Option<String> {
        let state = self.state.lock();
        match (&state.slot, state.closed) {
            (Slot::Requested { prompt }, false) => Some(prompt.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "input_gate_tests.rs"]
mod tests;
