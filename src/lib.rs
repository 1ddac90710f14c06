//! Script execution and interactive console core.
//!
//! Embeds an opaque script interpreter behind an interactive console: a run
//! executes on a dedicated thread with its standard output, error, and
//! input redirected through a [`console_bridge::ConsoleBridge`], while the
//! host UI drains the styled transcript and answers blocking input
//! requests. The [`extension_context::ExtensionContext`] lets a host app
//! and an extension runtime share the same engine and agree on where the
//! console currently lives.

pub mod config;
pub mod console_bridge;
pub mod engine;
pub mod error;
pub mod extension_context;
pub mod input_gate;
pub mod logging;
pub mod output_sink;
pub mod script;
pub mod theme;

pub use console_bridge::{ConsoleBridge, ScriptIo};
pub use engine::{EngineState, ExecutionEngine, Interpreter, RunOutcome};
pub use error::{ConsoleError, ScriptFailure};
pub use output_sink::{Chunk, OutputSink, OutputStyle};
pub use script::Script;
