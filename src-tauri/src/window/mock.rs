//! Recording window factory for tests.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::native::{EventSink, LoadTarget, NativeWindow, WindowEvent, WindowFactory, WindowId, WindowSpec};
use crate::error::{WebTrayError, WebTrayResult};
use crate::page::bounds::Rect;

#[derive(Debug, Default, Clone)]
pub struct MockState {
    pub visible: bool,
    pub maximized: bool,
    pub destroyed: bool,
    pub opacity: Option<f64>,
    pub muted: bool,
    pub bounds: Option<Rect>,
    pub url: Option<String>,
    pub loads: Vec<LoadTarget>,
    pub finds: Vec<(String, bool)>,
    pub findbar_visible: bool,
}

pub struct MockWindow {
    pub id: WindowId,
    pub spec: WindowSpec,
    pub state: Mutex<MockState>,
    sink: EventSink,
    /// When set, `close()` leaves the window alive, like a page that
    /// vetoes unload.
    pub ignore_close: AtomicBool,
}

impl MockWindow {
    pub fn emit(&self, event: WindowEvent) {
        (self.sink)(event);
    }

    pub fn snapshot(&self) -> MockState {
        self.state.lock().clone()
    }

    /// Simulate an in-page navigation.
    pub fn navigate(&self, url: &str) {
        self.state.lock().url = Some(url.to_string());
        self.emit(WindowEvent::Navigated(url.to_string()));
    }
}

impl NativeWindow for MockWindow {
    fn id(&self) -> WindowId {
        self.id.clone()
    }

    fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    fn is_visible(&self) -> bool {
        let state = self.state.lock();
        state.visible && !state.destroyed
    }

    fn is_maximized(&self) -> bool {
        self.state.lock().maximized
    }

    fn url(&self) -> Option<String> {
        self.state.lock().url.clone()
    }

    fn show(&self) -> WebTrayResult<()> {
        let was_visible = std::mem::replace(&mut self.state.lock().visible, true);
        if !was_visible {
            self.emit(WindowEvent::Shown);
        }
        Ok(())
    }

    fn hide(&self) -> WebTrayResult<()> {
        let was_visible = std::mem::replace(&mut self.state.lock().visible, false);
        if was_visible {
            self.emit(WindowEvent::Hidden);
        }
        Ok(())
    }

    fn focus(&self) -> WebTrayResult<()> {
        self.emit(WindowEvent::Focused);
        Ok(())
    }

    fn set_maximized(&self, maximized: bool) -> WebTrayResult<()> {
        self.state.lock().maximized = maximized;
        Ok(())
    }

    fn set_opacity(&self, opacity: f64) -> WebTrayResult<()> {
        self.state.lock().opacity = Some(opacity);
        Ok(())
    }

    fn set_muted(&self, muted: bool) -> WebTrayResult<()> {
        self.state.lock().muted = muted;
        Ok(())
    }

    fn bounds(&self) -> Option<Rect> {
        self.state.lock().bounds
    }

    fn set_bounds(&self, bounds: Rect) -> WebTrayResult<()> {
        self.state.lock().bounds = Some(bounds);
        Ok(())
    }

    fn load(&self, target: &LoadTarget) -> WebTrayResult<()> {
        let mut state = self.state.lock();
        state.url = target_url(target);
        state.loads.push(target.clone());
        Ok(())
    }

    fn find(&self, text: &str, forward: bool) -> WebTrayResult<()> {
        self.state.lock().finds.push((text.to_string(), forward));
        Ok(())
    }

    fn set_findbar_visible(&self, visible: bool) -> WebTrayResult<()> {
        self.state.lock().findbar_visible = visible;
        Ok(())
    }

    fn close(&self) -> WebTrayResult<()> {
        if self.ignore_close.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.destroy()
    }

    fn destroy(&self) -> WebTrayResult<()> {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return Ok(());
            }
            state.destroyed = true;
            state.visible = false;
        }
        self.emit(WindowEvent::Closed);
        Ok(())
    }
}

fn target_url(target: &LoadTarget) -> Option<String> {
    match target {
        LoadTarget::Url(url) => Some(url.clone()),
        LoadTarget::File(path) => url::Url::from_file_path(path).ok().map(|url| url.to_string()),
    }
}

/// Creates [`MockWindow`]s and keeps every one of them for inspection.
pub struct MockFactory {
    pub windows: Mutex<Vec<Arc<MockWindow>>>,
    pub work_area: Option<Rect>,
    counter: AtomicUsize,
    pub fail_create: AtomicBool,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self {
            windows: Mutex::new(Vec::new()),
            work_area: Some(Rect {
                x: 0,
                y: 0,
                width: 1920,
                height: 1040,
            }),
            counter: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
        }
    }
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Arc<MockWindow>> {
        self.windows.lock().clone()
    }

    pub fn window(&self, id: &WindowId) -> Option<Arc<MockWindow>> {
        self.windows.lock().iter().find(|w| &w.id == id).cloned()
    }

    pub fn live(&self) -> Vec<Arc<MockWindow>> {
        self.windows
            .lock()
            .iter()
            .filter(|w| !w.is_destroyed())
            .cloned()
            .collect()
    }

    pub fn live_for_page(&self, page_id: &str) -> Vec<Arc<MockWindow>> {
        self.live()
            .into_iter()
            .filter(|w| w.spec.page_id == page_id && w.spec.opener.is_none())
            .collect()
    }
}

impl WindowFactory for MockFactory {
    fn create(&self, spec: &WindowSpec, sink: EventSink) -> WebTrayResult<Arc<dyn NativeWindow>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(WebTrayError::WindowError("creation refused".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let window = Arc::new(MockWindow {
            id: WindowId(format!("page-{}-{}", spec.page_id, n)),
            spec: spec.clone(),
            state: Mutex::new(MockState {
                bounds: spec.bounds,
                url: target_url(&spec.target),
                loads: vec![spec.target.clone()],
                ..MockState::default()
            }),
            sink,
            ignore_close: AtomicBool::new(false),
        });
        self.windows.lock().push(Arc::clone(&window));
        Ok(window)
    }

    fn primary_work_area(&self) -> Option<Rect> {
        self.work_area
    }
}
