//! Event dispatch for one window instance.
//!
//! Two registries are kept per window: `internal` listeners are installed by
//! `PageWindow` while it is being constructed (opacity, bounds persistence,
//! modal cascading); `user` listeners are everything callers add afterwards.
//! Cloning a window copies only the user registry, since the clone installs
//! its own internal set.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::native::{WindowEvent, WindowEventKind, WindowId};

pub type Listener = Arc<dyn Fn(&WindowEvent, &WindowId) + Send + Sync>;

/// Per-window lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Unopened,
    Created,
    Visible,
    Hidden,
    Closing,
    Destroyed,
}

impl WindowState {
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            WindowState::Created | WindowState::Visible | WindowState::Hidden
        )
    }
}

/// Listeners keyed by event kind, in registration order.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    by_kind: HashMap<WindowEventKind, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn add(&mut self, kind: WindowEventKind, listener: Listener) {
        self.by_kind.entry(kind).or_default().push(listener);
    }

    pub fn for_kind(&self, kind: WindowEventKind) -> Vec<Listener> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_kind.clear();
    }
}

/// Dispatches native events to the two registries and tracks lifecycle.
pub struct EventHub {
    window_id: Mutex<Option<WindowId>>,
    internal: Mutex<ListenerRegistry>,
    user: Mutex<ListenerRegistry>,
    state: Mutex<WindowState>,
    closed: AtomicBool,
}

impl Default for EventHub {
    fn default() -> Self {
        Self {
            window_id: Mutex::new(None),
            internal: Mutex::new(ListenerRegistry::default()),
            user: Mutex::new(ListenerRegistry::default()),
            state: Mutex::new(WindowState::Unopened),
            closed: AtomicBool::new(false),
        }
    }
}

impl EventHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bind the hub to the native window once it exists.
    pub fn attach(&self, id: WindowId) {
        *self.window_id.lock() = Some(id);
        let mut state = self.state.lock();
        if *state == WindowState::Unopened {
            *state = WindowState::Created;
        }
    }

    pub fn state(&self) -> WindowState {
        *self.state.lock()
    }

    pub fn begin_close(&self) {
        let mut state = self.state.lock();
        if state.is_live() {
            *state = WindowState::Closing;
        }
    }

    pub fn add_internal(&self, kind: WindowEventKind, listener: Listener) {
        self.internal.lock().add(kind, listener);
    }

    pub fn add_user(&self, kind: WindowEventKind, listener: Listener) {
        self.user.lock().add(kind, listener);
    }

    pub fn user_listeners(&self) -> ListenerRegistry {
        self.user.lock().clone()
    }

    pub fn replace_user_listeners(&self, registry: ListenerRegistry) {
        *self.user.lock() = registry;
    }

    /// Drop every listener. Used before tearing down a window that is being
    /// replaced, so its close does not reach callers.
    pub fn clear(&self) {
        self.internal.lock().clear();
        self.user.lock().clear();
    }

    /// Deliver an event. `Closed` is delivered at most once.
    pub fn dispatch(&self, event: WindowEvent) {
        if event == WindowEvent::Closed && self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.transition(&event);

        let Some(id) = self.window_id.lock().clone() else {
            return;
        };
        let kind = event.kind();
        // Snapshot so listeners may register or clear without deadlocking.
        let internal = self.internal.lock().for_kind(kind);
        let user = self.user.lock().for_kind(kind);
        for listener in internal.iter().chain(user.iter()) {
            listener(&event, &id);
        }
    }

    fn transition(&self, event: &WindowEvent) {
        let mut state = self.state.lock();
        *state = match (event, *state) {
            (WindowEvent::Closed, _) => WindowState::Destroyed,
            (_, WindowState::Closing | WindowState::Destroyed) => *state,
            (WindowEvent::Shown, _) => WindowState::Visible,
            (WindowEvent::Hidden, _) => WindowState::Hidden,
            (_, current) => current,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let listener: Listener = Arc::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn test_closed_dispatched_once() {
        let hub = EventHub::new();
        hub.attach(WindowId::from("w1"));
        let (count, listener) = counter();
        hub.add_user(WindowEventKind::Closed, listener);

        hub.dispatch(WindowEvent::Closed);
        hub.dispatch(WindowEvent::Closed);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hub.state(), WindowState::Destroyed);
    }

    #[test]
    fn test_user_registry_is_separate() {
        let hub = EventHub::new();
        hub.attach(WindowId::from("w1"));
        let (_, internal) = counter();
        let (_, user) = counter();
        hub.add_internal(WindowEventKind::Focused, internal);
        hub.add_user(WindowEventKind::Focused, user);

        assert_eq!(hub.user_listeners().len(), 1);
    }

    #[test]
    fn test_clear_silences_listeners() {
        let hub = EventHub::new();
        hub.attach(WindowId::from("w1"));
        let (count, listener) = counter();
        hub.add_user(WindowEventKind::Closed, listener);

        hub.clear();
        hub.dispatch(WindowEvent::Closed);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_state_transitions() {
        let hub = EventHub::new();
        assert_eq!(hub.state(), WindowState::Unopened);
        hub.attach(WindowId::from("w1"));
        assert_eq!(hub.state(), WindowState::Created);
        hub.dispatch(WindowEvent::Shown);
        assert_eq!(hub.state(), WindowState::Visible);
        hub.dispatch(WindowEvent::Hidden);
        assert_eq!(hub.state(), WindowState::Hidden);
        hub.begin_close();
        hub.dispatch(WindowEvent::Shown);
        assert_eq!(hub.state(), WindowState::Closing);
        hub.dispatch(WindowEvent::Closed);
        assert_eq!(hub.state(), WindowState::Destroyed);
    }
}
