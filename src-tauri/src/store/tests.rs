//! Unit tests for the store and its domain accessors.
//!
//! Everything runs against `MemoryBackend`; no files are touched.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::schema::{generate_page_id, PermissionStatus, PAGES_KEY};
use super::*;
use crate::config::SettingId;
use crate::page::bounds::StoredBounds;

fn store_with(values: Vec<(&str, Value)>) -> (Store, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::with_values(
        values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    ));
    (Store::new(Box::new(Arc::clone(&backend))), backend)
}

#[test]
fn test_get_returns_default_when_absent() {
    let store = Store::in_memory();
    assert_eq!(store.get("missing", json!(42)), json!(42));
}

#[test]
fn test_set_then_get_is_an_independent_copy() {
    let store = Store::in_memory();
    let original = json!({ "nested": { "list": [1, 2, 3] } });
    store.set("key", original.clone()).unwrap();

    let mut read = store.get("key", Value::Null);
    assert_eq!(read, original);

    // Mutating what we read must not leak into the cache.
    read["nested"]["list"] = json!([]);
    assert_eq!(store.get("key", Value::Null), original);
}

#[test]
fn test_cache_updated_before_backend() {
    let (store, backend) = store_with(vec![]);
    store.set("a", json!(1)).unwrap();
    assert_eq!(backend.write_count(), 1);

    // Reads are served from the cache.
    assert_eq!(store.get("a", Value::Null), json!(1));
    assert_eq!(backend.write_count(), 1);

    store.delete("a").unwrap();
    assert_eq!(store.get_raw("a"), None);
    assert!(!store.keys().contains(&"a".to_string()));
}

#[test]
fn test_generate_page_id_unique_within_batch() {
    let ids: std::collections::HashSet<_> = (0..10).map(generate_page_id).collect();
    assert_eq!(ids.len(), 10);
}

#[test]
fn test_pages_migration_assigns_ids_and_rekeys_bounds() {
    let (store, _) = store_with(vec![
        (
            PAGES_KEY,
            json!([
                { "label": "Docs", "url": "https://example.com" },
                { "id": "keep", "label": "Mail", "url": "https://mail.example.com", "persist": true }
            ]),
        ),
        ("WindowBounds.Docs", json!({ "x": 1, "y": 2, "width": 300, "height": 200 })),
    ]);

    let pages = store.pages().unwrap();
    let docs_id = pages[0].id.clone().unwrap();
    assert!(!docs_id.is_empty());
    assert_eq!(pages[0].session, "default");
    assert_eq!(pages[1].id.as_deref(), Some("keep"));
    assert!(pages[1].persist);

    assert_eq!(
        store.bounds(&docs_id),
        Some(StoredBounds {
            x: Some(1),
            y: Some(2),
            width: 300,
            height: 200,
        })
    );
    assert_eq!(store.get_raw("WindowBounds.Docs"), None);

    // The migration was written back: a second load keeps the same id.
    assert_eq!(store.pages().unwrap()[0].id.as_deref(), Some(docs_id.as_str()));
}

#[test]
fn test_set_pages_removes_orphaned_bounds() {
    let (store, _) = store_with(vec![]);
    store.set_bounds("a", &StoredBounds::size_only(100, 100)).unwrap();
    store.set_bounds("b", &StoredBounds::size_only(100, 100)).unwrap();
    store.set_shared_bounds(&StoredBounds::size_only(10, 10)).unwrap();

    let page = StoredPage {
        id: Some("a".into()),
        label: "A".into(),
        url: "https://a.example".into(),
        session: "default".into(),
        persist: false,
    };
    store.set_pages(vec![page]).unwrap();

    assert!(store.bounds("a").is_some());
    assert!(store.bounds("b").is_none());
    assert!(store.shared_bounds().is_some());
}

#[test]
fn test_settings_fall_back_to_defaults() {
    let store = Store::in_memory();
    assert_eq!(store.setting(SettingId::ShowFrame), json!(false));
    store.set_setting(SettingId::ShowFrame, json!(true)).unwrap();
    assert_eq!(store.setting(SettingId::ShowFrame), json!(true));
    assert_eq!(store.get_raw("WindowSettings.show_frame"), Some(json!(true)));
}

#[test]
fn test_permission_round_trip() {
    let store = Store::in_memory();
    assert_eq!(store.permission("default", "https://a.example", "media:video"), None);

    store
        .set_permission("default", "https://a.example", "media:video", PermissionStatus::Deny)
        .unwrap();
    assert_eq!(
        store.permission("default", "https://a.example", "media:video"),
        Some(PermissionStatus::Deny)
    );
    assert_eq!(
        store.get_raw(super::schema::PERMISSIONS_KEY),
        Some(json!({ "default": { "https://a.example": { "media:video": "deny" } } }))
    );
}

#[test]
fn test_revoke_with_wildcards() {
    let store = Store::in_memory();
    for (session, origin, cap) in [
        ("default", "https://a.example", "geolocation"),
        ("default", "https://a.example", "notifications"),
        ("default", "https://b.example", "geolocation"),
        ("persist:work", "https://a.example", "geolocation"),
    ] {
        store
            .set_permission(session, origin, cap, PermissionStatus::Allow)
            .unwrap();
    }

    // One capability of one origin.
    let removed = store
        .revoke_permissions(Some("default"), Some("https://a.example"), Some("notifications"))
        .unwrap();
    assert_eq!(removed, 1);

    // A capability everywhere.
    let removed = store.revoke_permissions(None, None, Some("geolocation")).unwrap();
    assert_eq!(removed, 3);
    assert!(store.permissions().is_empty());

    assert_eq!(store.revoke_permissions(None, None, None).unwrap(), 0);
}
