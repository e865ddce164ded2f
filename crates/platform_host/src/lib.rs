//! Typed host-domain contracts shared between the desktop runtime and its hosts.
//!
//! This crate is the API-first boundary for platform services: the drive-rooted virtual path
//! algebra, the file content envelope convention, and the session persistence store contract.
//! Concrete storage substrates implement [`AppStateStore`] on the host side.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod fs;
pub mod storage;

pub use fs::path::{
    is_drive_label, is_valid_node_name, resolve_relative, NodePath, PATH_SEPARATOR, SYSTEM_DRIVE,
};
pub use fs::types::{FileContent, FsNodeKind, DEFAULT_CONTENT_MIME};
pub use storage::app_state::{
    build_app_state_envelope, next_envelope_timestamp_ms, AppStateEnvelope, AppStateStore,
    AppStateStoreFuture, MemoryAppStateStore, NoopAppStateStore, APP_STATE_ENVELOPE_VERSION,
    SESSION_STATE_NAMESPACE,
};
