pub mod apps;
pub mod file_system;
pub mod model;
pub mod persistence;
pub mod recycle_bin;
pub mod reducer;
pub mod session;
pub mod window_manager;

pub use file_system::{FileTree, FsError, FsNode, NodeBody};
pub use model::*;
pub use persistence::{
    clear_session_snapshot, decode_snapshot_lenient, load_session_snapshot,
    persist_session_snapshot,
};
pub use recycle_bin::{BinEntry, BinEntryId, RecycleBin, RecycleBinError};
pub use reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};
pub use session::DesktopSession;
