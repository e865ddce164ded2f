//! Session persistence contracts, envelope types, and helpers.
//!
//! The desktop core only needs a load-at-startup / save-on-change contract from its host. Hosts
//! implement [`AppStateStore`] over whatever key-value substrate they have (browser local storage,
//! IndexedDB, a file); [`MemoryAppStateStore`] backs tests and headless runs.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version for [`AppStateEnvelope`] metadata serialization.
pub const APP_STATE_ENVELOPE_VERSION: u32 = 1;
/// Namespace used by the desktop session snapshot.
pub const SESSION_STATE_NAMESPACE: &str = "desktop.session";

thread_local! {
    static LAST_ENVELOPE_TIMESTAMP_MS: Cell<u64> = const { Cell::new(0) };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned envelope for persisted state payloads.
pub struct AppStateEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Namespace identifying the owning domain.
    pub namespace: String,
    /// Domain-defined schema version for the payload.
    pub schema_version: u32,
    /// Last update time in unix milliseconds.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl AppStateEnvelope {
    /// Creates a new envelope and stamps it with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: APP_STATE_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: next_envelope_timestamp_ms(),
            payload,
        }
    }
}

/// Object-safe boxed future used by [`AppStateStore`] async methods.
pub type AppStateStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Storage service for loading and saving state envelopes by namespace.
pub trait AppStateStore {
    /// Loads a persisted envelope by namespace.
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>>;

    /// Saves a full envelope, replacing any previous one in the same namespace.
    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;

    /// Deletes persisted state for a namespace.
    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for hosts without durable storage.
pub struct NoopAppStateStore;

impl AppStateStore for NoopAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        _envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_app_state<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by namespace. Clones share the same backing map.
pub struct MemoryAppStateStore {
    inner: Rc<RefCell<HashMap<String, AppStateEnvelope>>>,
}

impl MemoryAppStateStore {
    /// Number of namespaces currently stored (shared across clones).
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when no namespace is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl AppStateStore for MemoryAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(namespace).cloned()) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(envelope.namespace.clone(), envelope.clone());
            Ok(())
        })
    }

    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(namespace);
            Ok(())
        })
    }
}

/// Builds a versioned [`AppStateEnvelope`] from a serializable payload.
///
/// # Errors
///
/// Returns an error when `payload` cannot be converted to JSON.
pub fn build_app_state_envelope<T: Serialize>(
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<AppStateEnvelope, String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    Ok(AppStateEnvelope::new(namespace, schema_version, payload))
}

/// Returns a unix millisecond timestamp that is strictly increasing within this thread, even when
/// the wall clock stalls or steps backwards.
pub fn next_envelope_timestamp_ms() -> u64 {
    let now = unix_time_ms_now();
    LAST_ENVELOPE_TIMESTAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

#[cfg(target_arch = "wasm32")]
fn unix_time_ms_now() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn unix_time_ms_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
