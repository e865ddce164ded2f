//! Desktop runtime persistence adapters for boot hydration and save-on-change.
//!
//! Snapshots are decoded leniently: every top-level field is read on its own and falls back to its
//! default when missing or malformed, so one corrupt field never costs the whole session.

use platform_host::{
    build_app_state_envelope, AppStateEnvelope, AppStateStore, SESSION_STATE_NAMESPACE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::apps;
use crate::file_system::FileTree;
use crate::model::{
    AppId, DesktopPreferences, DesktopSettings, DesktopSnapshot, DesktopState, WindowRecord,
    SESSION_SCHEMA_VERSION,
};
use crate::recycle_bin::RecycleBin;

/// Loads the persisted session snapshot, if a usable one exists.
///
/// Store failures and snapshots written by a newer schema yield `None`. A payload that is not a
/// JSON object is deleted from the store.
pub async fn load_session_snapshot<S>(store: &S) -> Option<DesktopSnapshot>
where
    S: AppStateStore + ?Sized,
{
    let envelope = match store.load_app_state_envelope(SESSION_STATE_NAMESPACE).await {
        Ok(Some(envelope)) => envelope,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(%err, "session snapshot load failed");
            return None;
        }
    };

    match migrate_session_snapshot(&envelope) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(%err, "discarding corrupt session snapshot");
            if let Err(err) = store.delete_app_state(SESSION_STATE_NAMESPACE).await {
                tracing::warn!(%err, "failed to delete corrupt session snapshot");
            }
            None
        }
    }
}

/// Persists the session snapshot for `state`.
pub async fn persist_session_snapshot<S>(store: &S, state: &DesktopState) -> Result<(), String>
where
    S: AppStateStore + ?Sized,
{
    let envelope = build_app_state_envelope(
        SESSION_STATE_NAMESPACE,
        SESSION_SCHEMA_VERSION,
        &state.snapshot(),
    )?;
    store.save_app_state_envelope(&envelope).await
}

/// Removes the persisted session snapshot.
pub async fn clear_session_snapshot<S>(store: &S) -> Result<(), String>
where
    S: AppStateStore + ?Sized,
{
    store.delete_app_state(SESSION_STATE_NAMESPACE).await
}

fn migrate_session_snapshot(
    envelope: &AppStateEnvelope,
) -> Result<Option<DesktopSnapshot>, String> {
    match envelope.schema_version {
        version if version <= SESSION_SCHEMA_VERSION => decode_snapshot_lenient(&envelope.payload)
            .map(Some)
            .ok_or_else(|| "session payload is not a JSON object".to_string()),
        newer => {
            tracing::warn!(
                schema_version = newer,
                supported = SESSION_SCHEMA_VERSION,
                "ignoring session snapshot from a newer schema"
            );
            Ok(None)
        }
    }
}

/// Decodes a snapshot payload field by field. Returns `None` only when `payload` is not an object.
pub fn decode_snapshot_lenient(payload: &Value) -> Option<DesktopSnapshot> {
    let object = payload.as_object()?;

    let windows = match object.get("windows") {
        Some(Value::Array(items)) => items.iter().filter_map(decode_window).collect(),
        Some(_) => {
            tracing::warn!("session `windows` is not an array; starting with none");
            Vec::new()
        }
        None => Vec::new(),
    };

    let pinned_app_ids = match object.get("pinned_app_ids") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().and_then(AppId::from_id))
            .collect(),
        Some(_) => Vec::new(),
        None => apps::default_pinned_app_ids(),
    };

    Some(DesktopSnapshot {
        schema_version: SESSION_SCHEMA_VERSION,
        windows,
        file_system: decode_field::<FileTree>(object, "file_system")
            .unwrap_or_else(FileTree::seeded),
        recycle_bin: decode_field::<RecycleBin>(object, "recycle_bin").unwrap_or_default(),
        settings: decode_settings(object.get("settings")),
        preferences: decode_preferences(object.get("preferences")),
        pinned_app_ids,
        next_z_index: decode_field(object, "next_z_index").unwrap_or(0),
        next_window_id: decode_field(object, "next_window_id").unwrap_or(0),
    })
}

fn decode_window(item: &Value) -> Option<WindowRecord> {
    serde_json::from_value(item.clone())
        .map_err(|err| tracing::debug!(%err, "dropping unreadable window record"))
        .ok()
}

fn decode_settings(value: Option<&Value>) -> DesktopSettings {
    let mut settings = DesktopSettings::default();
    let Some(object) = value.and_then(Value::as_object) else {
        return settings;
    };
    if let Some(theme) = decode_field(object, "theme") {
        settings.theme = theme;
    }
    if let Some(wallpaper) = decode_field(object, "wallpaper") {
        settings.wallpaper = wallpaper;
    }
    settings
}

fn decode_preferences(value: Option<&Value>) -> DesktopPreferences {
    let mut preferences = DesktopPreferences::default();
    let Some(object) = value.and_then(Value::as_object) else {
        return preferences;
    };
    if let Some(capacity) = decode_field(object, "recycle_bin_capacity") {
        preferences.recycle_bin_capacity = capacity;
    }
    if let Some(restore) = decode_field(object, "restore_windows_on_boot") {
        preferences.restore_windows_on_boot = restore;
    }
    if let Some(max) = decode_field(object, "max_restore_windows") {
        preferences.max_restore_windows = max;
    }
    preferences
}

fn decode_field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    let value = object.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!(field = key, %err, "discarding unreadable session field");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{AppStateEnvelope, MemoryAppStateStore, NodePath};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{Theme, INITIAL_Z_INDEX};
    use crate::window_manager;

    fn store_with_payload(schema_version: u32, payload: Value) -> MemoryAppStateStore {
        let store = MemoryAppStateStore::default();
        let envelope = AppStateEnvelope::new(SESSION_STATE_NAMESPACE, schema_version, payload);
        block_on(store.save_app_state_envelope(&envelope)).expect("seed store");
        store
    }

    #[test]
    fn persisted_state_loads_back_equal() {
        let store = MemoryAppStateStore::default();
        let mut state = DesktopState::default();
        window_manager::open_window(
            &mut state,
            crate::model::OpenWindowRequest::editor(
                NodePath::parse("C:/Documents/hello.txt").expect("path"),
            ),
        );
        state.settings.theme = Theme::Light;

        block_on(persist_session_snapshot(&store, &state)).expect("persist");
        let snapshot = block_on(load_session_snapshot(&store)).expect("snapshot");
        assert_eq!(DesktopState::from_snapshot(snapshot), state);
    }

    #[test]
    fn missing_snapshot_loads_nothing() {
        let store = MemoryAppStateStore::default();
        assert_eq!(block_on(load_session_snapshot(&store)), None);
    }

    #[test]
    fn non_object_payload_is_discarded_and_deleted() {
        let store = store_with_payload(SESSION_SCHEMA_VERSION, json!("garbage"));
        assert_eq!(block_on(load_session_snapshot(&store)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn newer_schema_is_ignored_but_kept() {
        let store = store_with_payload(SESSION_SCHEMA_VERSION + 1, json!({}));
        assert_eq!(block_on(load_session_snapshot(&store)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn partial_payload_falls_back_per_field() {
        let payload = json!({
            "windows": "not-a-list",
            "settings": {"theme": "light", "wallpaper": 42},
            "preferences": {"recycle_bin_capacity": 5, "restore_windows_on_boot": "yes"},
            "pinned_app_ids": ["terminal", "solitaire", "explorer"],
            "file_system": 17,
            "next_z_index": 3
        });
        let snapshot = decode_snapshot_lenient(&payload).expect("object payload");

        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.settings.theme, Theme::Light);
        assert_eq!(snapshot.settings.wallpaper, DesktopSettings::default().wallpaper);
        assert_eq!(snapshot.preferences.recycle_bin_capacity, 5);
        assert!(snapshot.preferences.restore_windows_on_boot);
        assert_eq!(snapshot.pinned_app_ids, vec![AppId::Terminal, AppId::Explorer]);
        assert_eq!(snapshot.file_system, FileTree::seeded());

        let state = DesktopState::from_snapshot(snapshot);
        assert_eq!(state.next_z_index, INITIAL_Z_INDEX);
    }

    #[test]
    fn unknown_app_windows_are_dropped_and_z_index_recomputed() {
        let window = |id: u64, app_id: &str, z_index: u32| {
            json!({
                "id": id,
                "app_id": app_id,
                "title": "t",
                "position": {"x": 1, "y": 2},
                "size": {"width": 700, "height": 500},
                "z_index": z_index,
                "is_minimized": false,
                "is_maximized": false,
                "is_focused": false
            })
        };
        let payload = json!({
            "windows": [window(3, "terminal", 41), window(4, "solitaire", 90)],
            "next_z_index": 12
        });
        let snapshot = decode_snapshot_lenient(&payload).expect("object payload");
        assert_eq!(snapshot.windows.len(), 1);
        assert_eq!(snapshot.pinned_app_ids, apps::default_pinned_app_ids());

        let state = DesktopState::from_snapshot(snapshot);
        assert_eq!(state.next_z_index, 42);
        assert_eq!(state.next_window_id, 4);
    }

    #[test]
    fn clear_removes_snapshot() {
        let store = store_with_payload(SESSION_SCHEMA_VERSION, json!({}));
        block_on(clear_session_snapshot(&store)).expect("clear");
        assert!(store.is_empty());
    }
}
