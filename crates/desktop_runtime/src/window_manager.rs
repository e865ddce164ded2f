//! Window-manager transition helpers used by the desktop reducer.
//!
//! Every helper reports whether it changed state; unknown window ids are ignored.

use crate::apps;
use crate::model::{
    DesktopState, OpenWindowRequest, ResizeEdge, WindowId, WindowPosition, WindowRecord,
    WindowSize,
};

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 300;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 200;

const CASCADE_ORIGIN: i32 = 100;
const CASCADE_STEP: i32 = 24;
const CASCADE_SLOTS: u64 = 8;

/// Issues the next stacking value. Values are never reused within a session.
pub fn allocate_z_index(state: &mut DesktopState) -> u32 {
    let z_index = state.next_z_index;
    state.next_z_index = state.next_z_index.saturating_add(1);
    z_index
}

/// Default top-left corner for a new window: a cascade that wraps every few windows.
pub fn default_window_position(window_id: WindowId) -> WindowPosition {
    let slot = (window_id.0.saturating_sub(1) % CASCADE_SLOTS) as i32;
    WindowPosition {
        x: CASCADE_ORIGIN + slot * CASCADE_STEP,
        y: CASCADE_ORIGIN + slot * CASCADE_STEP,
    }
}

/// Opens a focused window on top of the stack and returns its id.
///
/// Returns `None` when the app has no registry entry. A payload belonging to a different app is
/// discarded in favor of the app's default payload.
pub fn open_window(state: &mut DesktopState, req: OpenWindowRequest) -> Option<WindowId> {
    let Some(descriptor) = apps::app_descriptor(req.app_id) else {
        tracing::debug!(app_id = %req.app_id, "ignoring open request for unregistered app");
        return None;
    };

    let payload = match req.payload {
        Some(payload) if payload.app_id() == req.app_id => Some(payload),
        Some(payload) => {
            tracing::warn!(
                app_id = %req.app_id,
                payload_app_id = %payload.app_id(),
                "dropping launch payload addressed to another app"
            );
            apps::default_launch_payload(req.app_id)
        }
        None => apps::default_launch_payload(req.app_id),
    };
    let title = req
        .title
        .filter(|title| !title.trim().is_empty())
        .or_else(|| {
            payload
                .as_ref()
                .and_then(|payload| payload.title_hint())
                .map(str::to_string)
        })
        .unwrap_or_else(|| descriptor.name.to_string());

    let window_id = WindowId(state.next_window_id);
    state.next_window_id = state.next_window_id.saturating_add(1);
    let z_index = allocate_z_index(state);

    for window in &mut state.windows {
        window.is_focused = false;
    }
    state.windows.push(WindowRecord {
        id: window_id,
        app_id: req.app_id,
        title,
        position: req
            .position
            .unwrap_or_else(|| default_window_position(window_id)),
        size: req
            .size
            .unwrap_or_default()
            .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT),
        z_index,
        is_minimized: false,
        is_maximized: false,
        is_focused: true,
        payload,
    });
    Some(window_id)
}

/// Removes a window. Focus is not transferred to another window.
pub fn close_window(state: &mut DesktopState, window_id: WindowId) -> bool {
    let before = state.windows.len();
    state.windows.retain(|w| w.id != window_id);
    state.windows.len() != before
}

/// Focuses `window_id` and raises it above every other window.
pub fn focus_window(state: &mut DesktopState, window_id: WindowId) -> bool {
    if state.window(window_id).is_none() {
        return false;
    }
    let z_index = allocate_z_index(state);
    for window in &mut state.windows {
        window.is_focused = window.id == window_id;
        if window.is_focused {
            window.z_index = z_index;
        }
    }
    true
}

pub fn toggle_minimize(state: &mut DesktopState, window_id: WindowId) -> bool {
    let Some(window) = find_window_mut(state, window_id) else {
        return false;
    };
    window.is_minimized = !window.is_minimized;
    true
}

/// Flips the maximized flag. Maximizing a minimized window also un-minimizes it; minimizing a
/// maximized window keeps the maximized flag so it comes back maximized.
pub fn toggle_maximize(state: &mut DesktopState, window_id: WindowId) -> bool {
    let Some(window) = find_window_mut(state, window_id) else {
        return false;
    };
    window.is_maximized = !window.is_maximized;
    if window.is_maximized {
        window.is_minimized = false;
    }
    true
}

/// Overwrites a window's position. Maximized windows keep their stored geometry.
pub fn move_window(state: &mut DesktopState, window_id: WindowId, position: WindowPosition) -> bool {
    match find_window_mut(state, window_id) {
        Some(window) if !window.is_maximized && window.position != position => {
            window.position = position;
            true
        }
        _ => false,
    }
}

/// Overwrites a window's size, clamped to the minimum window size.
pub fn resize_window(state: &mut DesktopState, window_id: WindowId, size: WindowSize) -> bool {
    let size = size.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    match find_window_mut(state, window_id) {
        Some(window) if !window.is_maximized && window.size != size => {
            window.size = size;
            true
        }
        _ => false,
    }
}

/// Applies position and size together, as produced by an edge resize.
pub fn set_window_geometry(
    state: &mut DesktopState,
    window_id: WindowId,
    position: WindowPosition,
    size: WindowSize,
) -> bool {
    let size = size.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    match find_window_mut(state, window_id) {
        Some(window)
            if !window.is_maximized && (window.position != position || window.size != size) =>
        {
            window.position = position;
            window.size = size;
            true
        }
        _ => false,
    }
}

pub fn set_window_title(state: &mut DesktopState, window_id: WindowId, title: String) -> bool {
    match find_window_mut(state, window_id) {
        Some(window) if window.title != title => {
            window.title = title;
            true
        }
        _ => false,
    }
}

/// Applies a pointer delta to the dragged edge or corner.
///
/// The size is clamped to the minimum window size. When the left or top edge moves, the opposite
/// edge stays anchored, so a clamped resize never drifts the window.
pub fn resize_geometry(
    position: WindowPosition,
    size: WindowSize,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
) -> (WindowPosition, WindowSize) {
    let (width, height) = match edge {
        ResizeEdge::East => (size.width.saturating_add(dx), size.height),
        ResizeEdge::West => (size.width.saturating_sub(dx), size.height),
        ResizeEdge::South => (size.width, size.height.saturating_add(dy)),
        ResizeEdge::North => (size.width, size.height.saturating_sub(dy)),
        ResizeEdge::NorthEast => (size.width.saturating_add(dx), size.height.saturating_sub(dy)),
        ResizeEdge::NorthWest => (size.width.saturating_sub(dx), size.height.saturating_sub(dy)),
        ResizeEdge::SouthEast => (size.width.saturating_add(dx), size.height.saturating_add(dy)),
        ResizeEdge::SouthWest => (size.width.saturating_sub(dx), size.height.saturating_add(dy)),
    };
    let next_size = WindowSize { width, height }.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);

    let x = if edge.moves_left_edge() {
        anchored_origin(position.x, size.width, next_size.width)
    } else {
        position.x
    };
    let y = if edge.moves_top_edge() {
        anchored_origin(position.y, size.height, next_size.height)
    } else {
        position.y
    };
    (WindowPosition { x, y }, next_size)
}

/// Origin that keeps the far edge at `origin + extent` after the extent becomes `next_extent`.
fn anchored_origin(origin: i32, extent: i32, next_extent: i32) -> i32 {
    let shifted = i64::from(origin) + i64::from(extent) - i64::from(next_extent);
    shifted.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn find_window_mut(state: &mut DesktopState, window_id: WindowId) -> Option<&mut WindowRecord> {
    state.windows.iter_mut().find(|w| w.id == window_id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::model::{AppId, LaunchPayload, INITIAL_Z_INDEX};
    use platform_host::NodePath;

    fn open(state: &mut DesktopState, app_id: AppId) -> WindowId {
        open_window(state, OpenWindowRequest::new(app_id)).expect("registered app")
    }

    #[test]
    fn open_assigns_sequential_ids_and_z_indices() {
        let mut state = DesktopState::default();
        let first = open(&mut state, AppId::Explorer);
        let second = open(&mut state, AppId::Terminal);

        assert_eq!(first, WindowId(1));
        assert_eq!(second, WindowId(2));
        assert_eq!(state.window(first).expect("first").z_index, INITIAL_Z_INDEX);
        assert_eq!(state.window(second).expect("second").z_index, INITIAL_Z_INDEX + 1);
        assert_eq!(state.focused_window_id(), Some(second));
        assert!(!state.window(first).expect("first").is_focused);
        assert_eq!(state.next_z_index, INITIAL_Z_INDEX + 2);
    }

    #[test]
    fn open_uses_defaults_and_payload_titles() {
        let mut state = DesktopState::default();
        let explorer = open(&mut state, AppId::Explorer);
        let record = state.window(explorer).expect("window").clone();
        assert_eq!(record.title, "File Explorer");
        assert_eq!(record.size, WindowSize::default());
        assert_eq!(record.position, WindowPosition { x: 100, y: 100 });

        let file = NodePath::parse("C:/Documents/hello.txt").expect("path");
        let editor = open_window(&mut state, OpenWindowRequest::editor(file)).expect("open");
        assert_eq!(state.window(editor).expect("editor").title, "hello.txt");
    }

    #[test]
    fn open_drops_payload_for_another_app() {
        let mut state = DesktopState::default();
        let req = OpenWindowRequest::new(AppId::Terminal).with_payload(LaunchPayload::Browser {
            initial_url: "https://example.com".to_string(),
        });
        let id = open_window(&mut state, req).expect("open");
        assert_eq!(state.window(id).expect("window").payload, None);
    }

    #[test]
    fn open_clamps_requested_size() {
        let mut state = DesktopState::default();
        let mut req = OpenWindowRequest::new(AppId::Calculator);
        req.size = Some(WindowSize {
            width: 10,
            height: 10,
        });
        let id = open_window(&mut state, req).expect("open");
        assert_eq!(
            state.window(id).expect("window").size,
            WindowSize {
                width: MIN_WINDOW_WIDTH,
                height: MIN_WINDOW_HEIGHT
            }
        );
    }

    #[test]
    fn focus_raises_with_fresh_z_index_and_ignores_unknown_ids() {
        let mut state = DesktopState::default();
        let first = open(&mut state, AppId::Explorer);
        let _second = open(&mut state, AppId::Settings);

        assert!(focus_window(&mut state, first));
        assert_eq!(state.focused_window_id(), Some(first));
        assert_eq!(state.window(first).expect("first").z_index, INITIAL_Z_INDEX + 2);

        let before = state.clone();
        assert!(!focus_window(&mut state, WindowId(99)));
        assert_eq!(state, before);
    }

    #[test]
    fn close_does_not_transfer_focus() {
        let mut state = DesktopState::default();
        let _first = open(&mut state, AppId::Explorer);
        let second = open(&mut state, AppId::Editor);
        assert!(close_window(&mut state, second));
        assert_eq!(state.focused_window_id(), None);
        assert!(!close_window(&mut state, second));
    }

    #[test]
    fn maximize_clears_minimize_but_minimize_keeps_maximize() {
        let mut state = DesktopState::default();
        let id = open(&mut state, AppId::Browser);

        toggle_minimize(&mut state, id);
        toggle_maximize(&mut state, id);
        let record = state.window(id).expect("window");
        assert!(record.is_maximized);
        assert!(!record.is_minimized);

        toggle_minimize(&mut state, id);
        let record = state.window(id).expect("window");
        assert!(record.is_maximized);
        assert!(record.is_minimized);
    }

    #[test]
    fn maximized_windows_ignore_move_and_resize() {
        let mut state = DesktopState::default();
        let id = open(&mut state, AppId::Browser);
        toggle_maximize(&mut state, id);
        let before = state.clone();

        assert!(!move_window(&mut state, id, WindowPosition { x: 5, y: 5 }));
        assert!(!resize_window(
            &mut state,
            id,
            WindowSize {
                width: 900,
                height: 900
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn resize_window_clamps_to_minimum() {
        let mut state = DesktopState::default();
        let id = open(&mut state, AppId::Terminal);
        assert!(resize_window(
            &mut state,
            id,
            WindowSize {
                width: 120,
                height: 900
            }
        ));
        assert_eq!(
            state.window(id).expect("window").size,
            WindowSize {
                width: MIN_WINDOW_WIDTH,
                height: 900
            }
        );
    }

    #[test]
    fn resize_geometry_anchors_opposite_edge_when_clamped() {
        let position = WindowPosition { x: 100, y: 100 };
        let size = WindowSize {
            width: 400,
            height: 300,
        };

        let (moved, resized) = resize_geometry(position, size, ResizeEdge::West, -50, 0);
        assert_eq!(moved, WindowPosition { x: 50, y: 100 });
        assert_eq!(resized.width, 450);

        let (moved, resized) = resize_geometry(position, size, ResizeEdge::NorthWest, 250, 250);
        assert_eq!(
            resized,
            WindowSize {
                width: MIN_WINDOW_WIDTH,
                height: MIN_WINDOW_HEIGHT
            }
        );
        assert_eq!(moved, WindowPosition { x: 200, y: 200 });

        let (moved, resized) = resize_geometry(position, size, ResizeEdge::SouthEast, 20, 30);
        assert_eq!(moved, position);
        assert_eq!(
            resized,
            WindowSize {
                width: 420,
                height: 330
            }
        );
    }

    fn edge_strategy() -> impl Strategy<Value = ResizeEdge> {
        prop_oneof![
            Just(ResizeEdge::North),
            Just(ResizeEdge::South),
            Just(ResizeEdge::East),
            Just(ResizeEdge::West),
            Just(ResizeEdge::NorthEast),
            Just(ResizeEdge::NorthWest),
            Just(ResizeEdge::SouthEast),
            Just(ResizeEdge::SouthWest),
        ]
    }

    proptest! {
        #[test]
        fn resize_geometry_never_goes_below_minimum_or_moves_anchored_edges(
            edge in edge_strategy(),
            dx in -2000i32..2000,
            dy in -2000i32..2000,
            width in MIN_WINDOW_WIDTH..1600,
            height in MIN_WINDOW_HEIGHT..1200,
        ) {
            let position = WindowPosition { x: 40, y: 60 };
            let size = WindowSize { width, height };
            let (next_position, next_size) = resize_geometry(position, size, edge, dx, dy);

            prop_assert!(next_size.width >= MIN_WINDOW_WIDTH);
            prop_assert!(next_size.height >= MIN_WINDOW_HEIGHT);
            if edge.moves_left_edge() {
                prop_assert_eq!(next_position.x + next_size.width, position.x + size.width);
            } else {
                prop_assert_eq!(next_position.x, position.x);
            }
            if edge.moves_top_edge() {
                prop_assert_eq!(next_position.y + next_size.height, position.y + size.height);
            } else {
                prop_assert_eq!(next_position.y, position.y);
            }
        }

        #[test]
        fn random_focus_sequences_keep_one_focused_window_on_top(
            ops in proptest::collection::vec(0u64..6, 1..40)
        ) {
            let mut state = DesktopState::default();
            for _ in 0..4 {
                open(&mut state, AppId::Terminal);
            }
            for op in ops {
                focus_window(&mut state, WindowId(op));
                let focused = state.windows.iter().filter(|w| w.is_focused).count();
                prop_assert_eq!(focused, 1);
                let top = state.windows.iter().max_by_key(|w| w.z_index).map(|w| w.id);
                prop_assert_eq!(top, state.focused_window_id());
                prop_assert!(state.windows.iter().all(|w| w.z_index < state.next_z_index));
            }
        }
    }
}
