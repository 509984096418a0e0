//! Atom cache and property decoding (spec.md §6 "Atoms honored / emitted").
//!
//! Grounded in `pgwm-core/src/state/properties.rs` for the decoded-struct
//! shape (`WindowProperties`, `NetWmState`, `WmState`) and in spec.md §6's
//! exact atom list for which names get interned. `Display::get_property`
//! only ever hands back raw bytes, so this module is where the ICCCM/EWMH
//! wire layouts (`WM_NORMAL_HINTS`'s 18 longs, `_NET_WM_STRUT_PARTIAL`'s 12,
//! ...) get turned into `window::Properties` -- the teacher does the same
//! kind of decoding against raw `GetPropertyReply` bytes in
//! `pgwm-core/src/state/properties.rs`, just against a fixed `x11rb` type
//! instead of this crate's abstracted facade.

use crate::display::{AtomId, Display, WindowHandle};
use crate::geometry::BitGravity;
use crate::window::{Properties, SizeHints, StrutPartial, WmHints, WmState};

/// Every atom the manager interns once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: AtomId,
    pub wm_take_focus: AtomId,
    pub wm_delete_window: AtomId,
    pub wm_change_state: AtomId,
    pub wm_hints: AtomId,
    pub wm_normal_hints: AtomId,
    pub wm_class: AtomId,
    pub wm_name: AtomId,
    pub wm_state: AtomId,
    pub wm_transient_for: AtomId,
    pub net_wm_name: AtomId,
    pub net_wm_window_type: AtomId,
    pub net_wm_window_type_dock: AtomId,
    pub net_wm_window_type_desktop: AtomId,
    pub net_wm_state: AtomId,
    pub net_wm_state_fullscreen: AtomId,
    pub net_wm_state_maximized_horz: AtomId,
    pub net_wm_state_maximized_vert: AtomId,
    pub net_wm_state_hidden: AtomId,
    pub net_wm_state_focused: AtomId,
    pub net_wm_strut_partial: AtomId,
    pub net_wm_strut: AtomId,
    pub net_wm_fullscreen_monitors: AtomId,
    pub net_wm_allowed_actions: AtomId,
    pub net_frame_extents: AtomId,
    pub net_supported: AtomId,
    pub net_supporting_wm_check: AtomId,
    pub net_active_window: AtomId,
    pub net_client_list: AtomId,
    pub net_client_list_stacking: AtomId,
    pub net_close_window: AtomId,
    pub net_moveresize_window: AtomId,
    pub net_wm_moveresize: AtomId,
    pub fensterchef_command: AtomId,
}

impl Atoms {
    pub fn intern(display: &mut dyn Display) -> Self {
        let mut a = |name: &str| display.intern_atom(name);
        Atoms {
            wm_protocols: a("WM_PROTOCOLS"),
            wm_take_focus: a("WM_TAKE_FOCUS"),
            wm_delete_window: a("WM_DELETE_WINDOW"),
            wm_change_state: a("WM_CHANGE_STATE"),
            wm_hints: a("WM_HINTS"),
            wm_normal_hints: a("WM_NORMAL_HINTS"),
            wm_class: a("WM_CLASS"),
            wm_name: a("WM_NAME"),
            wm_state: a("WM_STATE"),
            wm_transient_for: a("WM_TRANSIENT_FOR"),
            net_wm_name: a("_NET_WM_NAME"),
            net_wm_window_type: a("_NET_WM_WINDOW_TYPE"),
            net_wm_window_type_dock: a("_NET_WM_WINDOW_TYPE_DOCK"),
            net_wm_window_type_desktop: a("_NET_WM_WINDOW_TYPE_DESKTOP"),
            net_wm_state: a("_NET_WM_STATE"),
            net_wm_state_fullscreen: a("_NET_WM_STATE_FULLSCREEN"),
            net_wm_state_maximized_horz: a("_NET_WM_STATE_MAXIMIZED_HORZ"),
            net_wm_state_maximized_vert: a("_NET_WM_STATE_MAXIMIZED_VERT"),
            net_wm_state_hidden: a("_NET_WM_STATE_HIDDEN"),
            net_wm_state_focused: a("_NET_WM_STATE_FOCUSED"),
            net_wm_strut_partial: a("_NET_WM_STRUT_PARTIAL"),
            net_wm_strut: a("_NET_WM_STRUT"),
            net_wm_fullscreen_monitors: a("_NET_WM_FULLSCREEN_MONITORS"),
            net_wm_allowed_actions: a("_NET_WM_ALLOWED_ACTIONS"),
            net_frame_extents: a("_NET_FRAME_EXTENTS"),
            net_supported: a("_NET_SUPPORTED"),
            net_supporting_wm_check: a("_NET_SUPPORTING_WM_CHECK"),
            net_active_window: a("_NET_ACTIVE_WINDOW"),
            net_client_list: a("_NET_CLIENT_LIST"),
            net_client_list_stacking: a("_NET_CLIENT_LIST_STACKING"),
            net_close_window: a("_NET_CLOSE_WINDOW"),
            net_moveresize_window: a("_NET_MOVERESIZE_WINDOW"),
            net_wm_moveresize: a("_NET_WM_MOVERESIZE"),
            fensterchef_command: a("FENSTERCHEF_COMMAND"),
        }
    }
}

fn u32_le(bytes: &[u8], idx: usize) -> Option<u32> {
    let start = idx * 4;
    bytes.get(start..start + 4).map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_atom_list(bytes: &[u8]) -> Vec<u32> {
    (0..bytes.len() / 4).filter_map(|i| u32_le(bytes, i)).collect()
}

fn decode_wm_class(bytes: &[u8]) -> (Option<String>, Option<String>) {
    let text = String::from_utf8_lossy(bytes);
    let mut parts = text.split('\0');
    let instance = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let class = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    (instance, class)
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
}

/// ICCCM `WM_NORMAL_HINTS`: a 18-long array: flags, x, y, width, height,
/// min_width, min_height, max_width, max_height, width_inc, height_inc,
/// min_aspect(2), max_aspect(2), base_width, base_height, win_gravity.
const USSIZE_OR_PSIZE: u32 = 1 << 3;
const PMIN_SIZE: u32 = 1 << 4;
const PMAX_SIZE: u32 = 1 << 5;
const PWIN_GRAVITY: u32 = 1 << 9;

fn decode_size_hints(bytes: &[u8]) -> SizeHints {
    let flags = u32_le(bytes, 0).unwrap_or(0);
    let min = if flags & PMIN_SIZE != 0 {
        Some((u32_le(bytes, 5).unwrap_or(0), u32_le(bytes, 6).unwrap_or(0)))
    } else if flags & USSIZE_OR_PSIZE != 0 {
        Some((u32_le(bytes, 3).unwrap_or(0), u32_le(bytes, 4).unwrap_or(0)))
    } else {
        None
    };
    let max = if flags & PMAX_SIZE != 0 {
        Some((u32_le(bytes, 7).unwrap_or(0), u32_le(bytes, 8).unwrap_or(0)))
    } else {
        None
    };
    let win_gravity = if flags & PWIN_GRAVITY != 0 {
        gravity_from_wire(u32_le(bytes, 17).unwrap_or(1))
    } else {
        None
    };
    SizeHints { min, max, win_gravity }
}

fn gravity_from_wire(value: u32) -> Option<BitGravity> {
    Some(match value {
        1 => BitGravity::NorthWest,
        2 => BitGravity::North,
        3 => BitGravity::NorthEast,
        4 => BitGravity::West,
        5 => BitGravity::Center,
        6 => BitGravity::East,
        7 => BitGravity::SouthWest,
        8 => BitGravity::South,
        9 => BitGravity::SouthEast,
        _ => return None,
    })
}

/// ICCCM `WM_HINTS`: flags, input, initial_state, ...
const INPUT_HINT: u32 = 1 << 0;
const STATE_HINT: u32 = 1 << 1;

fn decode_wm_hints(bytes: &[u8]) -> WmHints {
    let flags = u32_le(bytes, 0).unwrap_or(0);
    let input = if flags & INPUT_HINT != 0 { Some(u32_le(bytes, 1).unwrap_or(0) != 0) } else { None };
    let (mut iconic, mut withdrawn) = (false, false);
    if flags & STATE_HINT != 0 {
        match u32_le(bytes, 2).unwrap_or(1) {
            0 => withdrawn = true,
            3 => iconic = true,
            _ => {}
        }
    }
    WmHints { input, initial_state_iconic: iconic, initial_state_withdrawn: withdrawn }
}

fn decode_strut_partial(bytes: &[u8]) -> StrutPartial {
    let vals: Vec<u32> = (0..12).map(|i| u32_le(bytes, i).unwrap_or(0)).collect();
    StrutPartial {
        extents: crate::geometry::Extents {
            left: vals[0] as i32,
            right: vals[1] as i32,
            top: vals[2] as i32,
            bottom: vals[3] as i32,
        },
        spans: [(vals[4], vals[5]), (vals[6], vals[7]), (vals[8], vals[9]), (vals[10], vals[11])],
    }
}

fn decode_strut(bytes: &[u8]) -> StrutPartial {
    let vals: Vec<u32> = (0..4).map(|i| u32_le(bytes, i).unwrap_or(0)).collect();
    StrutPartial {
        extents: crate::geometry::Extents {
            left: vals[0] as i32,
            right: vals[1] as i32,
            top: vals[2] as i32,
            bottom: vals[3] as i32,
        },
        spans: [(0, 0); 4],
    }
}

fn atom_name(atoms: &Atoms, atom: u32) -> Option<&'static str> {
    // Only the handful the manager cares about by identity need names back;
    // everything else is kept as an opaque atom id in `net_wm_state_atoms`.
    if atom == atoms.net_wm_state_fullscreen {
        Some("_NET_WM_STATE_FULLSCREEN")
    } else if atom == atoms.net_wm_state_maximized_horz {
        Some("_NET_WM_STATE_MAXIMIZED_HORZ")
    } else if atom == atoms.net_wm_state_maximized_vert {
        Some("_NET_WM_STATE_MAXIMIZED_VERT")
    } else if atom == atoms.net_wm_state_hidden {
        Some("_NET_WM_STATE_HIDDEN")
    } else if atom == atoms.net_wm_state_focused {
        Some("_NET_WM_STATE_FOCUSED")
    } else {
        None
    }
}

/// Loads and decodes every property `fensterchef-core` cares about for
/// window `handle` (spec.md §4.D "Creation", §6 "Atoms honored").
pub fn load_properties(display: &mut dyn Display, atoms: &Atoms, handle: WindowHandle) -> Properties {
    let mut props = Properties::default();

    if let Some(bytes) = display.get_property(handle, atoms.net_wm_name) {
        props.name = Some(decode_text(&bytes));
    } else if let Some(bytes) = display.get_property(handle, atoms.wm_name) {
        props.name = Some(decode_text(&bytes));
    }

    if let Some(bytes) = display.get_property(handle, atoms.wm_class) {
        let (instance, class) = decode_wm_class(&bytes);
        props.instance = instance;
        props.class = class;
    }

    if let Some(bytes) = display.get_property(handle, atoms.wm_normal_hints) {
        props.size_hints = decode_size_hints(&bytes);
    }

    if let Some(bytes) = display.get_property(handle, atoms.wm_hints) {
        props.wm_hints = decode_wm_hints(&bytes);
    }

    if let Some(bytes) = display.get_property(handle, atoms.wm_protocols) {
        let wanted = read_atom_list(&bytes);
        props.protocols_take_focus = wanted.contains(&atoms.wm_take_focus);
        props.protocols_delete_window = wanted.contains(&atoms.wm_delete_window);
    }

    if let Some(bytes) = display.get_property(handle, atoms.net_wm_strut_partial) {
        props.strut = Some(decode_strut_partial(&bytes));
    } else if let Some(bytes) = display.get_property(handle, atoms.net_wm_strut) {
        props.strut = Some(decode_strut(&bytes));
    }

    if let Some(bytes) = display.get_property(handle, atoms.net_wm_window_type) {
        let types = read_atom_list(&bytes);
        props.window_type_dock = types.contains(&atoms.net_wm_window_type_dock);
        props.window_type_desktop = types.contains(&atoms.net_wm_window_type_desktop);
    }

    if let Some(bytes) = display.get_property(handle, atoms.net_wm_state) {
        let states = read_atom_list(&bytes);
        props.net_wm_state_atoms = states.iter().filter_map(|&s| atom_name(atoms, s)).map(str::to_string).collect();
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_class_splits_instance_and_class() {
        let bytes = b"xterm\0XTerm\0";
        let (instance, class) = decode_wm_class(bytes);
        assert_eq!(instance.as_deref(), Some("xterm"));
        assert_eq!(class.as_deref(), Some("XTerm"));
    }

    #[test]
    fn size_hints_min_equals_max_detected_downstream() {
        let mut bytes = vec![0u8; 18 * 4];
        bytes[0..4].copy_from_slice(&(PMIN_SIZE | PMAX_SIZE).to_ne_bytes());
        bytes[20..24].copy_from_slice(&100u32.to_ne_bytes());
        bytes[24..28].copy_from_slice(&50u32.to_ne_bytes());
        bytes[28..32].copy_from_slice(&100u32.to_ne_bytes());
        bytes[32..36].copy_from_slice(&50u32.to_ne_bytes());
        let hints = decode_size_hints(&bytes);
        assert!(hints.forces_floating());
    }

    #[test]
    fn wm_hints_decodes_input_and_iconic() {
        let mut bytes = vec![0u8; 3 * 4];
        bytes[0..4].copy_from_slice(&(INPUT_HINT | STATE_HINT).to_ne_bytes());
        bytes[4..8].copy_from_slice(&1u32.to_ne_bytes());
        bytes[8..12].copy_from_slice(&3u32.to_ne_bytes());
        let hints = decode_wm_hints(&bytes);
        assert_eq!(hints.input, Some(true));
        assert!(hints.initial_state_iconic);
    }
}
