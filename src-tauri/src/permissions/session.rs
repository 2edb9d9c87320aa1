//! Browsing-session gates.
//!
//! A session is registered the moment its first window is about to be
//! built and starts out denying everything. It is switched over to the
//! permission manager only once the manager is installed, so a request that
//! races session creation can never be allowed by default.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::WebTrayResult;
use crate::window::{EventSink, NativeWindow, WindowFactory, WindowSpec};
use crate::page::bounds::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionGate {
    DenyAll,
    Managed,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionGate>>,
    installed: AtomicBool,
}

impl SessionRegistry {
    /// Record a session. New sessions deny everything until managed.
    pub fn register(&self, session: &str) {
        let mut sessions = self.sessions.lock();
        if !sessions.contains_key(session) {
            log::debug!("[PERMISSIONS] New session '{}'", session);
            sessions.insert(session.to_string(), SessionGate::DenyAll);
        }
        if self.installed.load(Ordering::SeqCst) {
            sessions.insert(session.to_string(), SessionGate::Managed);
        }
    }

    /// Hand every known and future session to the manager.
    pub fn install(&self) {
        self.installed.store(true, Ordering::SeqCst);
        for gate in self.sessions.lock().values_mut() {
            *gate = SessionGate::Managed;
        }
    }

    /// Unknown sessions are denied.
    pub fn gate(&self, session: &str) -> SessionGate {
        self.sessions
            .lock()
            .get(session)
            .copied()
            .unwrap_or(SessionGate::DenyAll)
    }
}

/// Window factory decorator that registers each window's session before
/// the window exists.
pub struct SessionTrackingFactory {
    inner: Arc<dyn WindowFactory>,
    sessions: Arc<SessionRegistry>,
}

impl SessionTrackingFactory {
    pub fn new(inner: Arc<dyn WindowFactory>, sessions: Arc<SessionRegistry>) -> Self {
        Self { inner, sessions }
    }
}

impl WindowFactory for SessionTrackingFactory {
    fn create(&self, spec: &WindowSpec, sink: EventSink) -> WebTrayResult<Arc<dyn NativeWindow>> {
        self.sessions.register(&spec.session);
        self.inner.create(spec, sink)
    }

    fn primary_work_area(&self) -> Option<Rect> {
        self.inner.primary_work_area()
    }
}
