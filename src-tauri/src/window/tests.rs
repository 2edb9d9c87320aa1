use super::mock::MockFactory;
use super::*;
use crate::config::SettingId;
use crate::modal::testing::ScriptedHost;
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

fn context() -> (Arc<WindowContext>, Arc<MockFactory>) {
    let factory = MockFactory::new();
    let (host, _opened) = ScriptedHost::new();
    let ctx = WindowContext::new(
        factory.clone(),
        Arc::new(Store::in_memory()),
        Arc::new(ModalService::new(host)),
    );
    (ctx, factory)
}

fn spec(page_id: &str) -> WindowSpec {
    WindowSpec {
        page_id: page_id.to_string(),
        title: "Docs".to_string(),
        target: LoadTarget::Url("https://example.com/".to_string()),
        session: "default".to_string(),
        show_frame: false,
        allow_fullscreen: false,
        bounds: Some(Rect {
            x: 10,
            y: 20,
            width: 300,
            height: 400,
        }),
        opener: None,
    }
}

fn counting_listener() -> (Arc<AtomicUsize>, Listener) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (
        count,
        Arc::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

#[test]
fn test_clone_preserves_identity_and_user_listeners() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let (closed, listener) = counting_listener();
    window.on(WindowEventKind::Closed, listener);

    window.load_url("https://example.com/inbox").unwrap();
    window
        .set_bounds(Rect {
            x: 50,
            y: 60,
            width: 320,
            height: 480,
        })
        .unwrap();
    window.set_muted(true).unwrap();

    let options = WindowOptionsOverride {
        show_frame: Some(true),
        ..Default::default()
    };
    let clone = window.clone_with(&options).unwrap();

    assert_ne!(clone.id(), window.id());
    assert_eq!(clone.page_id(), "p1");
    assert_eq!(clone.loaded_target(), LoadTarget::Url("https://example.com/inbox".into()));
    assert_eq!(clone.bounds(), window.bounds());
    assert!(clone.is_muted());
    assert!(clone.spec().show_frame);

    let native = factory.window(&clone.id()).unwrap();
    assert!(native.snapshot().muted);

    // Only the user listener was copied.
    clone.force_close();
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_force_close_emits_closed_once_when_close_is_vetoed() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let (closed, listener) = counting_listener();
    window.on(WindowEventKind::Closed, listener);

    let native = factory.window(&window.id()).unwrap();
    native.ignore_close.store(true, Ordering::SeqCst);

    window.force_close();

    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(native.is_destroyed());
    assert_eq!(window.state(), WindowState::Destroyed);
    assert!(!window.is_alive());
}

#[test]
fn test_detached_window_closes_silently() {
    let (ctx, _factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let (closed, listener) = counting_listener();
    window.on(WindowEventKind::Closed, listener);

    window.detach_listeners();
    window.force_close();
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_retired_window_reports_replaced_instead_of_closed() {
    let (ctx, _factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let (closed, on_closed) = counting_listener();
    let (replaced, on_replaced) = counting_listener();
    window.on(WindowEventKind::Closed, on_closed);
    window.on(WindowEventKind::Replaced, on_replaced);

    window.retire();
    assert_eq!(replaced.load(Ordering::SeqCst), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 0);
    assert!(!window.is_alive());
}

#[test]
fn test_reset_reloads_recorded_target() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    window.load_file(PathBuf::from("/tmp/page.html")).unwrap();
    window.reset().unwrap();

    let loads = factory.window(&window.id()).unwrap().snapshot().loads;
    assert_eq!(loads.last(), Some(&LoadTarget::File(PathBuf::from("/tmp/page.html"))));
    assert_eq!(loads.len(), 3);
}

#[test]
fn test_toggles() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();

    assert!(window.toggle_visibility().unwrap());
    assert_eq!(window.state(), WindowState::Visible);
    assert!(!window.toggle_visibility().unwrap());
    assert_eq!(window.state(), WindowState::Hidden);

    assert!(window.toggle_mute().unwrap());
    assert!(!window.toggle_mute().unwrap());

    assert!(window.toggle_maximize().unwrap());
    assert!(factory.window(&window.id()).unwrap().snapshot().maximized);
}

#[test]
fn test_blur_opacity_suppressed_when_maximized() {
    let (ctx, factory) = context();
    ctx.store.set_setting(SettingId::FocusOpacity, json!(1.0)).unwrap();
    ctx.store.set_setting(SettingId::BlurOpacity, json!(0.5)).unwrap();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let native = factory.window(&window.id()).unwrap();

    native.emit(WindowEvent::Focused);
    assert_eq!(native.snapshot().opacity, Some(1.0));
    native.emit(WindowEvent::Blurred);
    assert_eq!(native.snapshot().opacity, Some(0.5));

    native.set_maximized(true).unwrap();
    native.emit(WindowEvent::Blurred);
    assert_eq!(native.snapshot().opacity, Some(1.0));

    ctx.store
        .set_setting(SettingId::KeepOpacityWhenMaximized, json!(false))
        .unwrap();
    native.emit(WindowEvent::Blurred);
    assert_eq!(native.snapshot().opacity, Some(0.5));
}

#[tokio::test]
async fn test_move_burst_persists_bounds_once_settled() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    let native = factory.window(&window.id()).unwrap();

    for x in 0..5 {
        native
            .set_bounds(Rect {
                x: x * 10,
                y: 0,
                width: 300,
                height: 400,
            })
            .unwrap();
        native.emit(WindowEvent::Moved);
    }
    assert_eq!(ctx.store.bounds("p1"), None);

    tokio::time::sleep(BOUNDS_QUIET_PERIOD + Duration::from_millis(300)).await;
    assert_eq!(
        ctx.store.bounds("p1"),
        Some(StoredBounds {
            x: Some(40),
            y: Some(0),
            width: 300,
            height: 400,
        })
    );
}

#[tokio::test]
async fn test_bounds_timer_after_destroy_is_harmless() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    factory.window(&window.id()).unwrap().emit(WindowEvent::Resized);
    window.force_close();

    tokio::time::sleep(BOUNDS_QUIET_PERIOD + Duration::from_millis(300)).await;
    assert_eq!(ctx.store.bounds("p1"), None);
}

#[test]
fn test_popup_opens_child_with_inherited_chrome() {
    let (ctx, factory) = context();
    let mut parent_spec = spec("p1");
    parent_spec.show_frame = true;
    parent_spec.session = "persist:work".to_string();
    let window = PageWindow::open(&ctx, parent_spec, WindowRole::Page, None).unwrap();

    let action = window.open_popup("https://example.com/share").unwrap();
    assert_eq!(action, PopupAction::OpenChild("https://example.com/share".into()));

    let popups = window.live_popups();
    assert_eq!(popups.len(), 1);
    let child = &popups[0];
    assert_eq!(child.role(), WindowRole::Popup);
    assert_eq!(child.session(), "persist:work");
    assert!(child.spec().show_frame);
    assert_eq!(child.spec().opener, Some(window.id()));
    assert!(window.find_window(&child.id()).is_some());

    let child_native = factory.window(&child.id()).unwrap();
    window.force_close();
    assert!(child_native.is_destroyed());
}

#[test]
fn test_popup_policy_deny_and_external() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();

    ctx.store.set_setting(SettingId::PopupPolicy, json!("deny")).unwrap();
    assert_eq!(window.open_popup("https://example.com/").unwrap(), PopupAction::Ignore);

    ctx.store.set_setting(SettingId::PopupPolicy, json!("external")).unwrap();
    assert_eq!(
        window.open_popup("https://example.com/").unwrap(),
        PopupAction::OpenExternal("https://example.com/".into())
    );
    assert_eq!(factory.created().len(), 1);
}

#[test]
fn test_findbar() {
    let (ctx, factory) = context();
    let window = PageWindow::open(&ctx, spec("p1"), WindowRole::Page, None).unwrap();
    window.open_findbar().unwrap();
    window.find("needle", false).unwrap();
    window.find("", true).unwrap();
    window.close_findbar().unwrap();

    let state = factory.window(&window.id()).unwrap().snapshot();
    assert_eq!(state.finds, vec![("needle".to_string(), false)]);
    assert!(!state.findbar_visible);
    assert!(!window.is_findbar_open());
}
