use crate::model::{AppId, LaunchPayload, OpenWindowRequest};

/// Default page for new browser windows.
pub const BROWSER_HOME_URL: &str = "https://www.google.com/webhp?igu=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDescriptor {
    pub app_id: AppId,
    pub name: &'static str,
    pub icon_id: &'static str,
    pub pinned_by_default: bool,
    pub show_on_desktop: bool,
}

const APP_REGISTRY: [AppDescriptor; 10] = [
    AppDescriptor {
        app_id: AppId::Explorer,
        name: "File Explorer",
        icon_id: "folder",
        pinned_by_default: true,
        show_on_desktop: true,
    },
    AppDescriptor {
        app_id: AppId::Editor,
        name: "Text Editor",
        icon_id: "file-text",
        pinned_by_default: false,
        show_on_desktop: false,
    },
    AppDescriptor {
        app_id: AppId::Settings,
        name: "Settings",
        icon_id: "settings",
        pinned_by_default: false,
        show_on_desktop: false,
    },
    AppDescriptor {
        app_id: AppId::Calculator,
        name: "Calculator",
        icon_id: "calculator",
        pinned_by_default: false,
        show_on_desktop: false,
    },
    AppDescriptor {
        app_id: AppId::Chatbot,
        name: "Gemini Chat",
        icon_id: "message-square",
        pinned_by_default: true,
        show_on_desktop: true,
    },
    AppDescriptor {
        app_id: AppId::Browser,
        name: "Browser",
        icon_id: "globe",
        pinned_by_default: true,
        show_on_desktop: true,
    },
    AppDescriptor {
        app_id: AppId::RecycleBin,
        name: "Recycle Bin",
        icon_id: "trash-2",
        pinned_by_default: false,
        show_on_desktop: true,
    },
    AppDescriptor {
        app_id: AppId::Player,
        name: "Media Player",
        icon_id: "play",
        pinned_by_default: false,
        show_on_desktop: false,
    },
    AppDescriptor {
        app_id: AppId::Terminal,
        name: "Terminal",
        icon_id: "terminal",
        pinned_by_default: false,
        show_on_desktop: false,
    },
    AppDescriptor {
        app_id: AppId::Games,
        name: "Games",
        icon_id: "gamepad-2",
        pinned_by_default: false,
        show_on_desktop: true,
    },
];

pub fn app_registry() -> &'static [AppDescriptor] {
    &APP_REGISTRY
}

pub fn desktop_icon_apps() -> Vec<AppDescriptor> {
    app_registry()
        .iter()
        .copied()
        .filter(|entry| entry.show_on_desktop)
        .collect()
}

pub fn default_pinned_app_ids() -> Vec<AppId> {
    app_registry()
        .iter()
        .filter(|entry| entry.pinned_by_default)
        .map(|entry| entry.app_id)
        .collect()
}

pub fn app_descriptor(app_id: AppId) -> Option<&'static AppDescriptor> {
    app_registry().iter().find(|entry| entry.app_id == app_id)
}

/// Launch data an app receives when opened without an explicit payload.
pub fn default_launch_payload(app_id: AppId) -> Option<LaunchPayload> {
    match app_id {
        AppId::Browser => Some(LaunchPayload::Browser {
            initial_url: BROWSER_HOME_URL.to_string(),
        }),
        _ => None,
    }
}

/// Request used by launchers (start menu, taskbar pins, desktop icons).
pub fn default_open_request(app_id: AppId) -> OpenWindowRequest {
    let mut req = OpenWindowRequest::new(app_id);
    req.payload = default_launch_payload(app_id);
    req
}
