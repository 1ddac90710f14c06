//! Process-wide handoff point between a host app and an extension runtime.
//!
//! Both embed the same execution core; the context records where output and
//! prompts should currently be displayed (the root view) and which host
//! application object is in charge. References are held weak: reassignment
//! swaps a pointer, never transfers ownership, and the previous holder's
//! lifetime is unaffected. The context says nothing about any in-flight
//! run — a run's sink and gate stay bound to the bridge that created them
//! regardless of where the context points.

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::debug;

/// Marker for the view currently hosting the console surface. The core
/// never calls into it; it only hands the reference back to whichever
/// display layer asks.
pub trait RootView: Send + Sync {}

/// Marker for the host application object (app or extension process).
pub trait HostApplication: Send + Sync {}

pub struct ExtensionContext {
    root_view: Mutex<Option<Weak<dyn RootView>>>,
    host_application: Mutex<Option<Weak<dyn HostApplication>>>,
}

static CONTEXT: OnceLock<ExtensionContext> = OnceLock::new();

impl ExtensionContext {
    /// The process-wide context, created on first access and alive for the
    /// process lifetime.
    pub fn current() -> &'static ExtensionContext {
        CONTEXT.get_or_init(|| ExtensionContext {
            root_view: Mutex::new(None),
            host_application: Mutex::new(None),
        })
    }

    pub fn set_root_view(&self, view: &Arc<dyn RootView>) {
        debug!("Extension context root view reassigned");
        *self.root_view.lock() = Some(Arc::downgrade(view));
    }

    /// Current root view, or `None` when never set or already dropped by
    /// its owner.
    pub fn root_view(&self) -> Option<Arc<dyn RootView>> {
        self.root_view.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn set_host_application(&self, app: &Arc<dyn HostApplication>) {
        debug!("Extension context host application reassigned");
        *self.host_application.lock() = Some(Arc::downgrade(app));
    }

    pub fn host_application(&self) -> Option<Arc<dyn HostApplication>> {
        self.host_application
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

#[cfg(test)]
#[path = "extension_context_tests.rs"]
mod tests;
