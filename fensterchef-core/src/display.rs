//! The display facade (spec.md §6 "Display facade").
//!
//! Grounded in how the teacher's `pgwm-app`/`pgwm-core` split puts a
//! single `CallWrapper<CTX>` between window-manager logic and `x11rb` --
//! every mutation the manager wants to make against the server goes
//! through one seam. Here that seam is promoted to a trait so
//! `fensterchef-core` depends on X11 semantics without depending on
//! `x11rb` at all; `fensterchef` (bin) is the only crate that implements
//! it for real, over `x11rb`, matching the teacher's actual dependency.

use crate::geometry::Rectangle;

pub type WindowHandle = u32;
pub type AtomId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub event_mask: u32,
    pub border_pixel: u32,
    pub override_redirect: bool,
    /// False for `InputOnly` windows, which spec.md §4.D "Creation"
    /// excludes from management.
    pub input_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub rect: Rectangle,
    pub border_width: u32,
}

/// Queried once per RandR screen-change, spec.md §4.B.
#[derive(Debug, Clone)]
pub struct OutputInfo {
    pub name: String,
    pub rect: Rectangle,
    pub primary: bool,
}

/// A raw, already-decoded display event (spec.md §6 "Event dispatch").
/// The bin crate's `x11rb`-backed implementation decodes wire events
/// into this enum; `fensterchef-core`'s event handlers only ever see
/// this type.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    KeyPress { window: WindowHandle, keycode: u8, modifiers: u32 },
    KeyRelease { window: WindowHandle, keycode: u8, modifiers: u32 },
    ButtonPress { window: WindowHandle, button: u8, modifiers: u32, root_x: i32, root_y: i32 },
    ButtonRelease { window: WindowHandle, button: u8, modifiers: u32, root_x: i32, root_y: i32 },
    Motion { root_x: i32, root_y: i32 },
    MapRequest { window: WindowHandle },
    ConfigureRequest { window: WindowHandle, rect: Rectangle, border_width: u32 },
    UnmapNotify { window: WindowHandle },
    DestroyNotify { window: WindowHandle },
    PropertyNotify { window: WindowHandle, atom: AtomId },
    ClientMessage { window: WindowHandle, message_type: AtomId, data: [u32; 5] },
    XkbMapNotify,
    ScreenChange,
}

/// Every server-facing operation `fensterchef-core` needs, per spec.md
/// §6. No method here does X11 wire-protocol work itself -- that lives
/// entirely in the bin crate's implementation.
pub trait Display {
    fn query_outputs(&mut self) -> Vec<OutputInfo>;

    /// Current attributes and class of an existing, possibly
    /// foreign-created window (spec.md §4.D "Creation" needs
    /// `override_redirect` and the `InputOutput`/`InputOnly` class before
    /// deciding whether to manage a `MapRequest`).
    fn query_attributes(&mut self, window: WindowHandle) -> WindowAttributes;
    /// Whether the window is currently mapped at the server, per
    /// `map_state != IsUnmapped` (spec.md §4.D "Creation").
    fn is_mapped(&mut self, window: WindowHandle) -> bool;

    fn create_window(&mut self, geometry: WindowGeometry, attributes: WindowAttributes) -> WindowHandle;
    fn destroy_window(&mut self, window: WindowHandle);
    fn map_window(&mut self, window: WindowHandle);
    fn unmap_window(&mut self, window: WindowHandle);
    fn configure_window(&mut self, window: WindowHandle, geometry: WindowGeometry);
    fn change_attributes(&mut self, window: WindowHandle, attributes: WindowAttributes);
    fn set_cursor(&mut self, window: WindowHandle, cursor_name: &str);

    fn grab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32);
    fn ungrab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32);
    fn grab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32);
    fn ungrab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32);

    fn set_input_focus(&mut self, window: WindowHandle);
    fn raise_window(&mut self, window: WindowHandle);
    fn restack(&mut self, order_bottom_to_top: &[WindowHandle]);

    fn query_tree(&mut self) -> Vec<WindowHandle>;

    /// Resolves a keysym to whatever keycode the current keyboard mapping
    /// produces it at, re-run on `XkbMapNotify` (spec.md §3 "Key bindings"
    /// keep the keysym around for exactly this).
    fn keysym_to_keycode(&mut self, keysym: u32) -> Option<u8>;

    fn intern_atom(&mut self, name: &str) -> AtomId;
    fn get_property(&mut self, window: WindowHandle, atom: AtomId) -> Option<Vec<u8>>;
    fn set_property(&mut self, window: WindowHandle, atom: AtomId, data: &[u8]);
    fn delete_property(&mut self, window: WindowHandle, atom: AtomId);

    fn send_client_message(&mut self, window: WindowHandle, message_type: AtomId, data: [u32; 5]);

    fn next_event(&mut self) -> Option<DisplayEvent>;
    fn flush(&mut self);
}

/// A recording fake used by `fensterchef-core`'s own tests (and
/// available to the bin crate's integration tests) so the manager's
/// decision logic can be exercised without a real X connection --
/// mirrors how the teacher's test modules stand in a `CallWrapper`
/// double.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub calls: Vec<String>,
    pub next_handle: WindowHandle,
    pub next_atom: AtomId,
    pub atoms: std::collections::HashMap<String, AtomId>,
    pub properties: std::collections::HashMap<(WindowHandle, AtomId), Vec<u8>>,
    pub queued_events: std::collections::VecDeque<DisplayEvent>,
    pub window_attributes: std::collections::HashMap<WindowHandle, WindowAttributes>,
    pub mapped: std::collections::HashMap<WindowHandle, bool>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Display for RecordingDisplay {
    fn query_outputs(&mut self) -> Vec<OutputInfo> {
        self.calls.push("query_outputs".to_string());
        Vec::new()
    }

    fn query_attributes(&mut self, window: WindowHandle) -> WindowAttributes {
        self.window_attributes.get(&window).copied().unwrap_or(WindowAttributes {
            event_mask: 0,
            border_pixel: 0,
            override_redirect: false,
            input_output: true,
        })
    }

    fn is_mapped(&mut self, window: WindowHandle) -> bool {
        self.mapped.get(&window).copied().unwrap_or(false)
    }

    fn create_window(&mut self, geometry: WindowGeometry, attributes: WindowAttributes) -> WindowHandle {
        self.next_handle += 1;
        self.calls.push(format!("create_window({:?})", geometry.rect));
        self.window_attributes.insert(self.next_handle, attributes);
        self.next_handle
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        self.calls.push(format!("destroy_window({window})"));
    }

    fn map_window(&mut self, window: WindowHandle) {
        self.calls.push(format!("map_window({window})"));
        self.mapped.insert(window, true);
    }

    fn unmap_window(&mut self, window: WindowHandle) {
        self.calls.push(format!("unmap_window({window})"));
        self.mapped.insert(window, false);
    }

    fn configure_window(&mut self, window: WindowHandle, geometry: WindowGeometry) {
        self.calls.push(format!("configure_window({window}, {:?})", geometry.rect));
    }

    fn change_attributes(&mut self, window: WindowHandle, _attributes: WindowAttributes) {
        self.calls.push(format!("change_attributes({window})"));
    }

    fn set_cursor(&mut self, window: WindowHandle, cursor_name: &str) {
        self.calls.push(format!("set_cursor({window}, {cursor_name})"));
    }

    fn grab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32) {
        self.calls.push(format!("grab_key({window}, {keycode}, {modifiers})"));
    }

    fn ungrab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32) {
        self.calls.push(format!("ungrab_key({window}, {keycode}, {modifiers})"));
    }

    fn grab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32) {
        self.calls.push(format!("grab_button({window}, {button}, {modifiers})"));
    }

    fn ungrab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32) {
        self.calls.push(format!("ungrab_button({window}, {button}, {modifiers})"));
    }

    fn set_input_focus(&mut self, window: WindowHandle) {
        self.calls.push(format!("set_input_focus({window})"));
    }

    fn raise_window(&mut self, window: WindowHandle) {
        self.calls.push(format!("raise_window({window})"));
    }

    fn restack(&mut self, order_bottom_to_top: &[WindowHandle]) {
        self.calls.push(format!("restack({order_bottom_to_top:?})"));
    }

    fn query_tree(&mut self) -> Vec<WindowHandle> {
        self.calls.push("query_tree".to_string());
        Vec::new()
    }

    fn keysym_to_keycode(&mut self, keysym: u32) -> Option<u8> {
        Some((keysym % 256) as u8)
    }

    fn intern_atom(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.atoms.get(name) {
            return id;
        }
        self.next_atom += 1;
        self.atoms.insert(name.to_string(), self.next_atom);
        self.next_atom
    }

    fn get_property(&mut self, window: WindowHandle, atom: AtomId) -> Option<Vec<u8>> {
        self.properties.get(&(window, atom)).cloned()
    }

    fn set_property(&mut self, window: WindowHandle, atom: AtomId, data: &[u8]) {
        self.properties.insert((window, atom), data.to_vec());
    }

    fn delete_property(&mut self, window: WindowHandle, atom: AtomId) {
        self.properties.remove(&(window, atom));
    }

    fn send_client_message(&mut self, window: WindowHandle, message_type: AtomId, data: [u32; 5]) {
        self.calls.push(format!("send_client_message({window}, {message_type}, {data:?})"));
    }

    fn next_event(&mut self) -> Option<DisplayEvent> {
        self.queued_events.pop_front()
    }

    fn flush(&mut self) {
        self.calls.push("flush".to_string());
    }
}
