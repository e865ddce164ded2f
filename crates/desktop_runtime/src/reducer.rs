//! Reducer actions, side-effect intents, and transition logic for the desktop runtime.

use platform_host::{FileContent, NodePath};
use thiserror::Error;

use crate::file_system::{FileTree, FsError};
use crate::model::{
    AppId, DesktopSnapshot, DesktopState, DragSession, InteractionState, OpenWindowRequest,
    PendingConfirmation, PointerPosition, ResizeEdge, ResizeSession, SettingsPatch, WindowId,
    WindowPosition, WindowSize,
};
use crate::recycle_bin::{BinEntryId, RecycleBinError};
use crate::window_manager;

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a new window using the supplied request.
    OpenWindow(OpenWindowRequest),
    /// Close a window by id.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Flip the minimized flag.
    ToggleMinimize {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Flip the maximized flag.
    ToggleMaximize {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Taskbar button click: toggle minimize, then focus.
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Overwrite a window's position.
    MoveWindow {
        /// Window to move.
        window_id: WindowId,
        /// New top-left corner.
        position: WindowPosition,
    },
    /// Overwrite a window's size (clamped to the minimum).
    ResizeWindow {
        /// Window to resize.
        window_id: WindowId,
        /// Requested size.
        size: WindowSize,
    },
    /// Begin dragging a window.
    BeginMove {
        /// Window being dragged.
        window_id: WindowId,
        /// Pointer position at drag start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window drag.
    UpdateMove {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window drag.
    EndMove,
    /// Begin resizing a window.
    BeginResize {
        /// Window being resized.
        window_id: WindowId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window resize.
    UpdateResize {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window resize.
    EndResize,
    /// Overwrite a window title.
    SetWindowTitle {
        /// Window to retitle.
        window_id: WindowId,
        /// New title.
        title: String,
    },
    /// Merge a partial settings update.
    UpdateSettings(SettingsPatch),
    /// Replace the whole file tree.
    UpdateFileSystem {
        /// Replacement tree. Paths are repaired from ancestry before it is stored.
        file_system: FileTree,
    },
    /// Replace the content of one file.
    UpdateFileContent {
        /// File to update.
        path: NodePath,
        /// New content.
        content: FileContent,
    },
    /// Create an empty folder.
    CreateFolder {
        /// Folder receiving the new child.
        parent_path: NodePath,
        /// New folder name.
        name: String,
    },
    /// Create a file with the given content.
    UploadFile {
        /// Folder receiving the new file.
        parent_path: NodePath,
        /// New file name.
        name: String,
        /// File content, already encoded when binary.
        content: FileContent,
    },
    /// Soft-delete a node into the recycle bin.
    MoveToRecycleBin {
        /// Node to delete.
        path: NodePath,
    },
    /// Put a recycle bin entry back where it came from.
    RestoreNode {
        /// Entry to restore.
        entry_id: BinEntryId,
    },
    /// Ask to discard a recycle bin entry for good.
    PermanentlyDeleteNode {
        /// Entry to discard.
        entry_id: BinEntryId,
    },
    /// Ask to discard every recycle bin entry.
    EmptyRecycleBin,
    /// Answer the pending confirmation prompt.
    ResolveConfirmation {
        /// Whether the user accepted the destructive operation.
        accept: bool,
    },
    /// Pin an app to the taskbar.
    PinApp {
        /// App to pin.
        app_id: AppId,
    },
    /// Remove an app from the taskbar pins.
    UnpinApp {
        /// App to unpin.
        app_id: AppId,
    },
    /// Hydrate runtime state from a persisted snapshot.
    HydrateSnapshot {
        /// Snapshot payload to restore.
        snapshot: DesktopSnapshot,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the host to execute.
pub enum RuntimeEffect {
    /// Persist the current session snapshot.
    PersistSession,
    /// Move focus into the newly focused window's primary input.
    FocusWindowInput(WindowId),
    /// Show a confirmation prompt; answer with [`DesktopAction::ResolveConfirmation`].
    ConfirmationRequired(PendingConfirmation),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions whose failure the invoking UI must report.
///
/// When [`reduce_desktop`] returns an error the state has not been modified.
pub enum ReducerError {
    /// A file-tree precondition failed (name collision, bad parent, bad name).
    #[error(transparent)]
    FileSystem(#[from] FsError),
    /// A recycle bin operation failed (restore collision).
    #[error(transparent)]
    RecycleBin(#[from] RecycleBinError),
    /// A confirmation answer arrived with nothing pending.
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
}

/// Applies a [`DesktopAction`] to the desktop runtime state and collects resulting side effects.
///
/// Actions referencing windows or recycle bin entries that no longer exist are ignored and return
/// no effects. Every state change emits [`RuntimeEffect::PersistSession`].
///
/// # Errors
///
/// Returns [`ReducerError`] for file-system and restore failures the UI must report. The state is
/// left untouched in that case.
pub fn reduce_desktop(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(req) => {
            if let Some(window_id) = window_manager::open_window(state, req) {
                effects.push(RuntimeEffect::PersistSession);
                effects.push(RuntimeEffect::FocusWindowInput(window_id));
            }
        }
        DesktopAction::CloseWindow { window_id } => {
            if window_manager::close_window(state, window_id) {
                end_sessions_for(interaction, window_id);
                effects.push(RuntimeEffect::PersistSession);
            } else {
                ignore_stale_window("close", window_id);
            }
        }
        DesktopAction::FocusWindow { window_id } => {
            if window_manager::focus_window(state, window_id) {
                effects.push(RuntimeEffect::PersistSession);
                effects.push(RuntimeEffect::FocusWindowInput(window_id));
            } else {
                ignore_stale_window("focus", window_id);
            }
        }
        DesktopAction::ToggleMinimize { window_id } => {
            if window_manager::toggle_minimize(state, window_id) {
                effects.push(RuntimeEffect::PersistSession);
            } else {
                ignore_stale_window("minimize", window_id);
            }
        }
        DesktopAction::ToggleMaximize { window_id } => {
            if window_manager::toggle_maximize(state, window_id) {
                end_sessions_for(interaction, window_id);
                effects.push(RuntimeEffect::PersistSession);
            } else {
                ignore_stale_window("maximize", window_id);
            }
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            if window_manager::toggle_minimize(state, window_id) {
                window_manager::focus_window(state, window_id);
                effects.push(RuntimeEffect::PersistSession);
                effects.push(RuntimeEffect::FocusWindowInput(window_id));
            } else {
                ignore_stale_window("taskbar toggle", window_id);
            }
        }
        DesktopAction::MoveWindow {
            window_id,
            position,
        } => {
            if window_manager::move_window(state, window_id, position) {
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::ResizeWindow { window_id, size } => {
            if window_manager::resize_window(state, window_id, size) {
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::BeginMove { window_id, pointer } => {
            let Some(window) = state.window(window_id) else {
                ignore_stale_window("begin move", window_id);
                return Ok(effects);
            };
            let can_drag = !window.is_maximized;
            let position_start = window.position;
            window_manager::focus_window(state, window_id);
            effects.push(RuntimeEffect::PersistSession);
            interaction.resizing = None;
            interaction.dragging = can_drag.then_some(DragSession {
                window_id,
                pointer_start: pointer,
                position_start,
            });
        }
        DesktopAction::UpdateMove { pointer } => {
            if let Some(session) = interaction.dragging.as_ref() {
                let dx = pointer.x.saturating_sub(session.pointer_start.x);
                let dy = pointer.y.saturating_sub(session.pointer_start.y);
                let position = session.position_start.offset(dx, dy);
                if window_manager::move_window(state, session.window_id, position) {
                    effects.push(RuntimeEffect::PersistSession);
                }
            }
        }
        DesktopAction::EndMove => {
            interaction.dragging = None;
        }
        DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            let Some(window) = state.window(window_id) else {
                ignore_stale_window("begin resize", window_id);
                return Ok(effects);
            };
            let can_resize = !window.is_maximized;
            let position_start = window.position;
            let size_start = window.size;
            window_manager::focus_window(state, window_id);
            effects.push(RuntimeEffect::PersistSession);
            interaction.dragging = None;
            interaction.resizing = can_resize.then_some(ResizeSession {
                window_id,
                edge,
                pointer_start: pointer,
                position_start,
                size_start,
            });
        }
        DesktopAction::UpdateResize { pointer } => {
            if let Some(session) = interaction.resizing.as_ref() {
                let (position, size) = window_manager::resize_geometry(
                    session.position_start,
                    session.size_start,
                    session.edge,
                    pointer.x.saturating_sub(session.pointer_start.x),
                    pointer.y.saturating_sub(session.pointer_start.y),
                );
                if window_manager::set_window_geometry(state, session.window_id, position, size) {
                    effects.push(RuntimeEffect::PersistSession);
                }
            }
        }
        DesktopAction::EndResize => {
            interaction.resizing = None;
        }
        DesktopAction::SetWindowTitle { window_id, title } => {
            if window_manager::set_window_title(state, window_id, title) {
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::UpdateSettings(patch) => {
            let settings = patch.apply_to(&state.settings);
            if settings != state.settings {
                state.settings = settings;
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::UpdateFileSystem { mut file_system } => {
            file_system.repair();
            if file_system != state.file_system {
                state.file_system = file_system;
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::UpdateFileContent { path, content } => {
            state.file_system.update_file_content(&path, content)?;
            effects.push(RuntimeEffect::PersistSession);
        }
        DesktopAction::CreateFolder { parent_path, name } => {
            let name = name.trim();
            if name.is_empty() {
                tracing::debug!(parent = %parent_path, "ignoring folder creation without a name");
                return Ok(effects);
            }
            state.file_system.create_folder(&parent_path, name)?;
            effects.push(RuntimeEffect::PersistSession);
        }
        DesktopAction::UploadFile {
            parent_path,
            name,
            content,
        } => {
            state
                .file_system
                .create_file(&parent_path, name.trim(), content)?;
            effects.push(RuntimeEffect::PersistSession);
        }
        DesktopAction::MoveToRecycleBin { path } => {
            let capacity = state.preferences.recycle_bin_capacity;
            let entry_id =
                state
                    .recycle_bin
                    .move_to_bin(&mut state.file_system, &path, capacity)?;
            tracing::debug!(%path, %entry_id, "moved node to recycle bin");
            effects.push(RuntimeEffect::PersistSession);
        }
        DesktopAction::RestoreNode { entry_id } => {
            if state.recycle_bin.entry(entry_id).is_none() {
                tracing::debug!(%entry_id, "ignoring restore of unknown recycle bin entry");
                return Ok(effects);
            }
            state
                .recycle_bin
                .restore(&mut state.file_system, entry_id)?;
            effects.push(RuntimeEffect::PersistSession);
        }
        DesktopAction::PermanentlyDeleteNode { entry_id } => {
            let Some(entry) = state.recycle_bin.entry(entry_id) else {
                tracing::debug!(%entry_id, "ignoring delete of unknown recycle bin entry");
                return Ok(effects);
            };
            let pending = PendingConfirmation::PermanentDelete {
                entry_id,
                name: entry.node.name.clone(),
            };
            interaction.pending_confirmation = Some(pending.clone());
            effects.push(RuntimeEffect::ConfirmationRequired(pending));
        }
        DesktopAction::EmptyRecycleBin => {
            if state.recycle_bin.is_empty() {
                return Ok(effects);
            }
            let pending = PendingConfirmation::EmptyRecycleBin {
                entry_ids: state.recycle_bin.entries().iter().map(|e| e.id).collect(),
            };
            interaction.pending_confirmation = Some(pending.clone());
            effects.push(RuntimeEffect::ConfirmationRequired(pending));
        }
        DesktopAction::ResolveConfirmation { accept } => {
            let pending = interaction
                .pending_confirmation
                .take()
                .ok_or(ReducerError::NoPendingConfirmation)?;
            if accept && apply_confirmed(state, pending) {
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::PinApp { app_id } => {
            if !state.is_pinned(app_id) {
                state.pinned_app_ids.push(app_id);
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::UnpinApp { app_id } => {
            if state.is_pinned(app_id) {
                state.pinned_app_ids.retain(|pinned| *pinned != app_id);
                effects.push(RuntimeEffect::PersistSession);
            }
        }
        DesktopAction::HydrateSnapshot { snapshot } => {
            *state = hydrate(snapshot);
            *interaction = InteractionState::default();
        }
    }

    Ok(effects)
}

fn apply_confirmed(state: &mut DesktopState, pending: PendingConfirmation) -> bool {
    match pending {
        PendingConfirmation::PermanentDelete { entry_id, .. } => {
            match state.recycle_bin.purge(entry_id) {
                Ok(_) => true,
                Err(err) => {
                    tracing::debug!(%err, "confirmed delete target is gone");
                    false
                }
            }
        }
        PendingConfirmation::EmptyRecycleBin { entry_ids } => {
            state.recycle_bin.purge_all(&entry_ids) > 0
        }
    }
}

fn hydrate(snapshot: DesktopSnapshot) -> DesktopState {
    let mut state = DesktopState::from_snapshot(snapshot);
    let preferences = &state.preferences;
    if !preferences.restore_windows_on_boot {
        state.windows.clear();
    } else if state.windows.len() > preferences.max_restore_windows {
        let mut by_z = state.windows.iter().map(|w| w.z_index).collect::<Vec<_>>();
        by_z.sort_unstable_by(|a, b| b.cmp(a));
        let cutoff = by_z
            .get(preferences.max_restore_windows.saturating_sub(1))
            .copied()
            .unwrap_or(u32::MAX);
        let keep = preferences.max_restore_windows;
        state.windows.retain(|w| w.z_index >= cutoff);
        state.windows.truncate(keep);
    }
    tracing::info!(windows = state.windows.len(), "hydrated desktop session");
    state
}

fn end_sessions_for(interaction: &mut InteractionState, window_id: WindowId) {
    if interaction
        .dragging
        .as_ref()
        .is_some_and(|session| session.window_id == window_id)
    {
        interaction.dragging = None;
    }
    if interaction
        .resizing
        .as_ref()
        .is_some_and(|session| session.window_id == window_id)
    {
        interaction.resizing = None;
    }
}

fn ignore_stale_window(intent: &'static str, window_id: WindowId) {
    tracing::debug!(intent, %window_id, "ignoring intent for unknown window");
}
