use std::collections::BTreeSet;
use std::fmt;

use platform_host::NodePath;
use serde::{Deserialize, Serialize};

use crate::apps;
use crate::file_system::FileTree;
use crate::recycle_bin::{BinEntryId, RecycleBin};
use crate::window_manager::{MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};

pub const SESSION_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_WINDOW_WIDTH: i32 = 700;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 500;
pub const INITIAL_Z_INDEX: u32 = 10;
pub const DEFAULT_WALLPAPER: &str = "bg-zinc-900";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppId {
    #[serde(rename = "explorer")]
    Explorer,
    #[serde(rename = "editor")]
    Editor,
    #[serde(rename = "settings")]
    Settings,
    #[serde(rename = "calculator")]
    Calculator,
    #[serde(rename = "chatbot")]
    Chatbot,
    #[serde(rename = "browser")]
    Browser,
    #[serde(rename = "recycleBin")]
    RecycleBin,
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "terminal")]
    Terminal,
    #[serde(rename = "games")]
    Games,
}

impl AppId {
    pub const ALL: [AppId; 10] = [
        Self::Explorer,
        Self::Editor,
        Self::Settings,
        Self::Calculator,
        Self::Chatbot,
        Self::Browser,
        Self::RecycleBin,
        Self::Player,
        Self::Terminal,
        Self::Games,
    ];

    /// Stable string id used by launchers and persisted snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explorer => "explorer",
            Self::Editor => "editor",
            Self::Settings => "settings",
            Self::Calculator => "calculator",
            Self::Chatbot => "chatbot",
            Self::Browser => "browser",
            Self::RecycleBin => "recycleBin",
            Self::Player => "player",
            Self::Terminal => "terminal",
            Self::Games => "games",
        }
    }

    /// Maps a raw launcher id. Unknown ids return `None`.
    pub fn from_id(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|app_id| app_id.as_str() == raw)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

impl WindowPosition {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

impl WindowSize {
    pub fn clamped_min(self, min_width: i32, min_height: i32) -> Self {
        Self {
            width: self.width.max(min_width),
            height: self.height.max(min_height),
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Typed launch data forwarded to the hosted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LaunchPayload {
    Editor { file_path: NodePath, file_name: String },
    Browser { initial_url: String },
    Explorer { path: NodePath },
    Player { file_path: NodePath },
}

impl LaunchPayload {
    /// Application this payload belongs to.
    pub fn app_id(&self) -> AppId {
        match self {
            Self::Editor { .. } => AppId::Editor,
            Self::Browser { .. } => AppId::Browser,
            Self::Explorer { .. } => AppId::Explorer,
            Self::Player { .. } => AppId::Player,
        }
    }

    /// Initial window title implied by the payload, if any.
    pub fn title_hint(&self) -> Option<&str> {
        match self {
            Self::Editor { file_name, .. } if !file_name.is_empty() => Some(file_name.as_str()),
            _ => None,
        }
    }

    /// Opens a file in the editor, titling the window with the file's leaf name.
    pub fn editor_for(file_path: NodePath) -> Self {
        let file_name = file_path.leaf().to_string();
        Self::Editor {
            file_path,
            file_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub app_id: AppId,
    pub title: String,
    pub position: WindowPosition,
    pub size: WindowSize,
    pub z_index: u32,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub is_focused: bool,
    #[serde(default)]
    pub payload: Option<LaunchPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    pub theme: Theme,
    /// Wallpaper preset class or image URL.
    pub wallpaper: String,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            wallpaper: DEFAULT_WALLPAPER.to_string(),
        }
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub wallpaper: Option<String>,
}

impl SettingsPatch {
    pub fn apply_to(&self, settings: &DesktopSettings) -> DesktopSettings {
        DesktopSettings {
            theme: self.theme.unwrap_or(settings.theme),
            wallpaper: self
                .wallpaper
                .clone()
                .unwrap_or_else(|| settings.wallpaper.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopPreferences {
    pub recycle_bin_capacity: usize,
    pub restore_windows_on_boot: bool,
    pub max_restore_windows: usize,
}

impl Default for DesktopPreferences {
    fn default() -> Self {
        Self {
            recycle_bin_capacity: 100,
            restore_windows_on_boot: true,
            max_restore_windows: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesktopState {
    pub windows: Vec<WindowRecord>,
    pub file_system: FileTree,
    pub recycle_bin: RecycleBin,
    pub settings: DesktopSettings,
    pub preferences: DesktopPreferences,
    pub pinned_app_ids: Vec<AppId>,
    pub next_z_index: u32,
    pub next_window_id: u64,
}

impl Default for DesktopState {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
            file_system: FileTree::seeded(),
            recycle_bin: RecycleBin::default(),
            settings: DesktopSettings::default(),
            preferences: DesktopPreferences::default(),
            pinned_app_ids: apps::default_pinned_app_ids(),
            next_z_index: INITIAL_Z_INDEX,
            next_window_id: 1,
        }
    }
}

impl DesktopState {
    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn is_pinned(&self, app_id: AppId) -> bool {
        self.pinned_app_ids.contains(&app_id)
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            schema_version: SESSION_SCHEMA_VERSION,
            windows: self.windows.clone(),
            file_system: self.file_system.clone(),
            recycle_bin: self.recycle_bin.clone(),
            settings: self.settings.clone(),
            preferences: self.preferences.clone(),
            pinned_app_ids: self.pinned_app_ids.clone(),
            next_z_index: self.next_z_index,
            next_window_id: self.next_window_id,
        }
    }

    /// Rebuilds state from a snapshot, re-establishing the invariants a hand-edited or stale
    /// snapshot may violate. Window ids and z-indices end up unique, sizes respect the minimum,
    /// at most one window is focused, counters run ahead of every issued value, and node paths
    /// match their ancestry.
    pub fn from_snapshot(snapshot: DesktopSnapshot) -> Self {
        let mut windows: Vec<WindowRecord> = Vec::with_capacity(snapshot.windows.len());
        for mut window in snapshot.windows {
            if windows.iter().all(|w| w.id != window.id) {
                window.size = window.size.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
                windows.push(window);
            }
        }

        let max_z = windows.iter().map(|w| w.z_index).max();
        let mut next_z_index = snapshot
            .next_z_index
            .max(max_z.map_or(INITIAL_Z_INDEX, |z| z.saturating_add(1)))
            .max(INITIAL_Z_INDEX);
        // Later duplicates of a z-index move to the top, in their stored order.
        let mut seen_z = BTreeSet::new();
        for window in &mut windows {
            if !seen_z.insert(window.z_index) {
                window.z_index = next_z_index;
                next_z_index = next_z_index.saturating_add(1);
                seen_z.insert(window.z_index);
            }
        }

        let focused_top = windows
            .iter()
            .filter(|w| w.is_focused)
            .max_by_key(|w| w.z_index)
            .map(|w| w.id);
        for window in &mut windows {
            window.is_focused = Some(window.id) == focused_top;
        }

        let max_id = windows.iter().map(|w| w.id.0).max().unwrap_or(0);

        let mut file_system = snapshot.file_system;
        file_system.repair();

        let mut pinned_app_ids: Vec<AppId> = Vec::with_capacity(snapshot.pinned_app_ids.len());
        for app_id in snapshot.pinned_app_ids {
            if !pinned_app_ids.contains(&app_id) {
                pinned_app_ids.push(app_id);
            }
        }

        Self {
            windows,
            file_system,
            recycle_bin: snapshot.recycle_bin.normalized(),
            settings: snapshot.settings,
            preferences: snapshot.preferences,
            pinned_app_ids,
            next_z_index,
            next_window_id: snapshot
                .next_window_id
                .max(max_id.saturating_add(1))
                .max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    pub schema_version: u32,
    pub windows: Vec<WindowRecord>,
    pub file_system: FileTree,
    pub recycle_bin: RecycleBin,
    pub settings: DesktopSettings,
    pub preferences: DesktopPreferences,
    pub pinned_app_ids: Vec<AppId>,
    pub next_z_index: u32,
    pub next_window_id: u64,
}

impl Default for DesktopSnapshot {
    fn default() -> Self {
        DesktopState::default().snapshot()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWindowRequest {
    pub app_id: AppId,
    pub title: Option<String>,
    pub position: Option<WindowPosition>,
    pub size: Option<WindowSize>,
    pub payload: Option<LaunchPayload>,
}

impl OpenWindowRequest {
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            title: None,
            position: None,
            size: None,
            payload: None,
        }
    }

    /// Builds a request from a raw launcher id; unknown ids yield `None`.
    pub fn for_raw_app_id(raw: &str) -> Option<Self> {
        AppId::from_id(raw).map(Self::new)
    }

    pub fn with_payload(mut self, payload: LaunchPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Opens the editor on `file_path`.
    pub fn editor(file_path: NodePath) -> Self {
        Self::new(AppId::Editor).with_payload(LaunchPayload::editor_for(file_path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub fn moves_left_edge(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    pub fn moves_top_edge(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub position_start: WindowPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub position_start: WindowPosition,
    pub size_start: WindowSize,
}

/// Destructive operation waiting for an explicit go-ahead from the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirmation {
    PermanentDelete {
        entry_id: BinEntryId,
        name: String,
    },
    /// Entries present when the prompt was raised; later arrivals are not part of the answer.
    EmptyRecycleBin {
        entry_ids: Vec<BinEntryId>,
    },
}

impl PendingConfirmation {
    /// User-facing question for the confirmation prompt.
    pub fn prompt(&self) -> String {
        match self {
            Self::PermanentDelete { name, .. } => {
                format!("Permanently delete \"{name}\"? This cannot be undone.")
            }
            Self::EmptyRecycleBin { entry_ids } => format!(
                "Permanently delete all {} item(s) in the Recycle Bin? This cannot be undone.",
                entry_ids.len()
            ),
        }
    }
}

/// Transient pointer/prompt state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
    pub pending_confirmation: Option<PendingConfirmation>,
}
