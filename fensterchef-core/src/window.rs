//! The window model: per-client state, the properties cache, the four
//! intersecting order lists and focus (spec.md §3 "Client Window", §4.D).
//!
//! Grounded in `original_source/include/core/window.h` for the field set
//! and `pgwm-core/src/state/workspace.rs` for the "one struct per client,
//! kept in parallel order lists" shape the teacher already uses for its
//! own per-workspace window vectors. DESIGN NOTES (spec.md §9) sanctions
//! replacing the four intrusive linked lists with `Vec<WindowId>` order
//! vectors owned by the arena.

use crate::display::WindowAttributes;
use crate::error::{Error, Result};
use crate::geometry::Rectangle;
use crate::ids::{FrameId, WindowId};

pub const WINDOW_MINIMUM_SIZE: u32 = 4;
pub const REQUEST_CLOSE_MAX_DURATION_SECS: u64 = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mode {
    Tiling,
    Floating,
    Fullscreen,
    Dock,
    Desktop,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WmState {
    Normal,
    Withdrawn,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SizeHints {
    pub min: Option<(u32, u32)>,
    pub max: Option<(u32, u32)>,
    pub win_gravity: Option<crate::geometry::BitGravity>,
}

impl SizeHints {
    /// min == max forces Floating mode (spec.md §4.D "Creation").
    #[must_use]
    pub fn forces_floating(&self) -> bool {
        matches!((self.min, self.max), (Some(a), Some(b)) if a == b)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct WmHints {
    pub input: Option<bool>,
    pub initial_state_iconic: bool,
    pub initial_state_withdrawn: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StrutPartial {
    pub extents: crate::geometry::Extents,
    /// `(start, end)` spans along the edge for left/right/top/bottom, in
    /// that order, as in `_NET_WM_STRUT_PARTIAL`'s 12-long layout.
    pub spans: [(u32, u32); 4],
}

#[derive(Debug, Clone, Default)]
pub struct Properties {
    pub name: Option<String>,
    pub class: Option<String>,
    pub instance: Option<String>,
    pub size_hints: SizeHints,
    pub wm_hints: WmHints,
    pub protocols_take_focus: bool,
    pub protocols_delete_window: bool,
    pub transient_for: Option<WindowId>,
    pub strut: Option<StrutPartial>,
    pub fullscreen_monitors: Option<(crate::ids::MonitorId, crate::ids::MonitorId, crate::ids::MonitorId, crate::ids::MonitorId)>,
    pub net_wm_state_atoms: Vec<String>,
    pub wm_state: WmState,
    pub window_type_dock: bool,
    pub window_type_desktop: bool,
    pub override_redirect: bool,
    pub input_output: bool,
}

#[derive(Debug, Clone)]
pub struct FcWindow {
    refcount: u32,
    /// `None` once the underlying X window is gone but the struct is
    /// still referenced (spec.md §3 "zombie" id=None state).
    pub server_id: Option<u32>,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub border_size: u32,
    pub border_color: u32,
    /// Preserved across mode flips (spec.md §3 "Client Window").
    pub floating: Rectangle,
    /// Cached so `sync::synchronize` can repaint just the border pixel
    /// through `Display::change_attributes` without recomputing the
    /// rest of the attribute set.
    pub attrs: WindowAttributes,
    pub props: Properties,
    pub is_visible: bool,
    pub was_close_requested: bool,
    pub user_request_close_time: Option<u64>,
    pub mode: Mode,
    pub previous_mode: Mode,
    pub frame: Option<FrameId>,
    pub number: u32,
}

impl FcWindow {
    /// Builds a fresh, not-yet-inserted window record. `refcount` starts
    /// at zero; `WindowArena::insert` sets it to one, mirroring how every
    /// other construction path for a window goes through the arena.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server_id: Option<u32>,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        border_size: u32,
        border_color: u32,
        floating: Rectangle,
        attrs: WindowAttributes,
        props: Properties,
        mode: Mode,
    ) -> Self {
        FcWindow {
            refcount: 0,
            server_id,
            x,
            y,
            w,
            h,
            border_size,
            border_color,
            floating,
            attrs,
            props,
            is_visible: false,
            was_close_requested: false,
            user_request_close_time: None,
            mode,
            previous_mode: mode,
            frame: None,
            number: 0,
        }
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.server_id.is_some()
    }

    #[must_use]
    pub fn is_borderless(&self, configured_borderless: bool) -> bool {
        matches!(self.mode, Mode::Desktop | Mode::Dock | Mode::Fullscreen) || configured_borderless
    }

    /// True iff the window advertises `WM_TAKE_FOCUS`, sets `InputHint`
    /// with input=true, or its mode is neither Dock nor Desktop (spec.md
    /// §4.D "Focusability").
    #[must_use]
    pub fn is_focusable(&self) -> bool {
        if self.props.protocols_take_focus {
            return true;
        }
        if self.props.wm_hints.input == Some(true) {
            return true;
        }
        !matches!(self.mode, Mode::Dock | Mode::Desktop)
    }
}

/// The four order lists: age (oldest-first), Z-order (bottom-to-top),
/// server Z-order (last value pushed to the display) and number
/// (ascending). Kept as plain `Vec<WindowId>` per DESIGN NOTES rather
/// than intrusive links.
#[derive(Debug, Default)]
pub struct WindowArena {
    slots: Vec<Option<FcWindow>>,
    free: Vec<usize>,
    age: Vec<WindowId>,
    z_order: Vec<WindowId>,
    server_z_order: Vec<WindowId>,
    by_number: Vec<WindowId>,
    pub focused_window: Option<WindowId>,
}

impl WindowArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: WindowId) -> &FcWindow {
        self.slots[id.index()].as_ref().expect("window slot accessed after free")
    }

    pub fn get_mut(&mut self, id: WindowId) -> &mut FcWindow {
        self.slots[id.index()].as_mut().expect("window slot accessed after free")
    }

    pub fn try_get(&self, id: WindowId) -> Result<&FcWindow> {
        self.slots.get(id.index()).and_then(Option::as_ref).ok_or(Error::UnknownWindow(id))
    }

    #[must_use]
    pub fn is_alive(&self, id: WindowId) -> bool {
        self.slots.get(id.index()).map(Option::is_some).unwrap_or(false)
    }

    #[must_use]
    pub fn age_order(&self) -> &[WindowId] {
        &self.age
    }

    #[must_use]
    pub fn z_order(&self) -> &[WindowId] {
        &self.z_order
    }

    #[must_use]
    pub fn server_z_order(&self) -> &[WindowId] {
        &self.server_z_order
    }

    pub fn set_server_z_order(&mut self, order: Vec<WindowId>) {
        self.server_z_order = order;
    }

    #[must_use]
    pub fn by_number(&self) -> &[WindowId] {
        &self.by_number
    }

    /// Inserts a freshly created window into all four lists: age at
    /// tail, Z at top, server-Z at top (so the first sync pass diffs it
    /// in), number at the first gap >= `first_window_number` (spec.md §3
    /// W2).
    pub fn insert(&mut self, mut window: FcWindow, first_window_number: u32) -> WindowId {
        window.refcount = 1;
        let id = self.alloc(window);
        self.age.push(id);
        self.z_order.push(id);
        self.server_z_order.push(id);
        let number = self.first_free_number(first_window_number);
        self.get_mut(id).number = number;
        self.insert_sorted_by_number(id);
        id
    }

    fn alloc(&mut self, window: FcWindow) -> WindowId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(window);
            WindowId(idx)
        } else {
            self.slots.push(Some(window));
            WindowId(self.slots.len() - 1)
        }
    }

    fn first_free_number(&self, first_window_number: u32) -> u32 {
        let used: std::collections::HashSet<u32> = self.by_number.iter().map(|&id| self.get(id).number).collect();
        let mut n = first_window_number;
        while used.contains(&n) {
            n += 1;
        }
        n
    }

    fn insert_sorted_by_number(&mut self, id: WindowId) {
        let number = self.get(id).number;
        let pos = self.by_number.partition_point(|&w| self.get(w).number < number);
        self.by_number.insert(pos, id);
    }

    pub fn incref(&mut self, id: WindowId) {
        self.get_mut(id).refcount += 1;
    }

    /// Drops a reference; frees the slot once it reaches zero. Call after
    /// `mark_destroyed` has already torn down server-visible state.
    pub fn decref(&mut self, id: WindowId) {
        let refcount = {
            let w = self.get_mut(id);
            w.refcount -= 1;
            w.refcount
        };
        if refcount == 0 {
            self.slots[id.index()] = None;
            self.free.push(id.index());
        }
    }

    /// `DestroyNotify`: unlinks from age/Z/server-Z/number lists, marks
    /// the server id gone, clears any focus pointer referring to it, and
    /// decrefs once (spec.md §4.D "Destroy").
    pub fn mark_destroyed(&mut self, id: WindowId) {
        self.age.retain(|&w| w != id);
        self.z_order.retain(|&w| w != id);
        self.server_z_order.retain(|&w| w != id);
        self.by_number.retain(|&w| w != id);
        if self.focused_window == Some(id) {
            self.focused_window = None;
        }
        self.get_mut(id).server_id = None;
        self.decref(id);
    }

    /// Unlinks `id` from the Z list only, for layer recomputation.
    fn unlink_z(&mut self, id: WindowId) {
        self.z_order.retain(|&w| w != id);
    }

    /// Renames `id`'s number, clearing the first gap, and re-sorts the
    /// number list (spec.md §4.E `assign I`).
    pub fn assign_number(&mut self, id: WindowId, number: u32) {
        if let Some(prior) = self.by_number.iter().position(|&w| self.get(w).number == number) {
            let prior_id = self.by_number.remove(prior);
            self.get_mut(prior_id).number = 0;
        }
        self.by_number.retain(|&w| w != id);
        self.get_mut(id).number = number;
        self.insert_sorted_by_number(id);
    }

    /// Recomputes the window's Z position: Tiling goes just above the
    /// topmost Desktop window (else the bottom), Floating/Fullscreen/Dock
    /// go to the top, Desktop goes to the bottom. Afterwards, every
    /// window transient for `id` is raised to sit immediately above it,
    /// recursively (spec.md §4.D "Layer computation", W3).
    pub fn update_layer(&mut self, id: WindowId) {
        self.unlink_z(id);
        let mode = self.get(id).mode;
        match mode {
            Mode::Tiling => {
                let insert_at = self
                    .z_order
                    .iter()
                    .rposition(|&w| self.get(w).mode == Mode::Desktop)
                    .map_or(0, |p| p + 1);
                self.z_order.insert(insert_at, id);
            }
            Mode::Floating | Mode::Fullscreen | Mode::Dock => {
                self.z_order.push(id);
            }
            Mode::Desktop => {
                self.z_order.insert(0, id);
            }
        }
        self.raise_transients_of(id);
    }

    fn raise_transients_of(&mut self, id: WindowId) {
        let transients: Vec<WindowId> = self
            .z_order
            .iter()
            .copied()
            .filter(|&w| self.get(w).props.transient_for == Some(id))
            .collect();
        if transients.is_empty() {
            return;
        }
        let Some(mut insert_at) = self.z_order.iter().position(|&w| w == id) else {
            return;
        };
        for t in transients {
            self.z_order.retain(|&w| w != t);
            insert_at = self.z_order.iter().position(|&w| w == id).unwrap_or(insert_at);
            self.z_order.insert(insert_at + 1, t);
            self.raise_transients_of(t);
        }
    }

    /// `set_focus`: validates visibility and focusability, falling back
    /// to `None` (spec.md §4.D "Focus").
    pub fn set_focus(&mut self, id: Option<WindowId>) {
        self.focused_window = id.filter(|&w| self.is_alive(w) && self.get(w).is_visible && self.get(w).is_focusable());
    }

    /// Clamps `(w, h)` to `WINDOW_MINIMUM_SIZE` and the property-supplied
    /// min/max, then stores `floating` if currently in Floating mode
    /// (spec.md §4.D "Size clamping").
    pub fn set_size(&mut self, id: WindowId, x: i32, y: i32, w: u32, h: u32) {
        let win = self.get_mut(id);
        let mut w = w.max(WINDOW_MINIMUM_SIZE);
        let mut h = h.max(WINDOW_MINIMUM_SIZE);
        if let Some((min_w, min_h)) = win.props.size_hints.min {
            w = w.max(min_w);
            h = h.max(min_h);
        }
        if let Some((max_w, max_h)) = win.props.size_hints.max {
            w = w.min(max_w.max(WINDOW_MINIMUM_SIZE));
            h = h.min(max_h.max(WINDOW_MINIMUM_SIZE));
        }
        win.x = x;
        win.y = y;
        win.w = w;
        win.h = h;
        if win.mode == Mode::Floating {
            win.floating = Rectangle::new(x, y, w, h);
        }
    }

    /// Marks `was_close_requested`/the timestamp for the 2s escalation
    /// window (spec.md §4.D "Close").
    pub fn record_close_request(&mut self, id: WindowId, now_secs: u64) {
        let w = self.get_mut(id);
        w.was_close_requested = true;
        w.user_request_close_time = Some(now_secs);
    }

    /// True if a prior close request is still within the escalation
    /// window, i.e. a second request should force-destroy instead.
    #[must_use]
    pub fn should_force_close(&self, id: WindowId, now_secs: u64) -> bool {
        match self.get(id).user_request_close_time {
            Some(t) => now_secs.saturating_sub(t) < REQUEST_CLOSE_MAX_DURATION_SECS,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_window() -> FcWindow {
        FcWindow {
            refcount: 1,
            server_id: Some(1),
            x: 0,
            y: 0,
            w: 100,
            h: 100,
            border_size: 0,
            border_color: 0,
            floating: Rectangle::default(),
            attrs: WindowAttributes { event_mask: 0, border_pixel: 0, override_redirect: false, input_output: true },
            props: Properties::default(),
            is_visible: true,
            was_close_requested: false,
            user_request_close_time: None,
            mode: Mode::Tiling,
            previous_mode: Mode::Tiling,
            frame: None,
            number: 0,
        }
    }

    #[test]
    fn number_list_stays_sorted() {
        let mut arena = WindowArena::new();
        let a = arena.insert(blank_window(), 1);
        let b = arena.insert(blank_window(), 1);
        assert_eq!(arena.get(a).number, 1);
        assert_eq!(arena.get(b).number, 2);
        assert_eq!(arena.by_number(), &[a, b]);
    }

    #[test]
    fn destroy_clears_focus() {
        let mut arena = WindowArena::new();
        let a = arena.insert(blank_window(), 1);
        arena.set_focus(Some(a));
        arena.mark_destroyed(a);
        assert_eq!(arena.focused_window, None);
    }

    #[test]
    fn transient_window_raised_above_owner() {
        let mut arena = WindowArena::new();
        let owner = arena.insert(blank_window(), 1);
        arena.get_mut(owner).mode = Mode::Floating;
        arena.update_layer(owner);
        let mut t = blank_window();
        t.props.transient_for = Some(owner);
        t.mode = Mode::Floating;
        let transient = arena.insert(t, 1);
        arena.update_layer(transient);
        arena.update_layer(owner);
        let pos_owner = arena.z_order().iter().position(|&w| w == owner).unwrap();
        let pos_t = arena.z_order().iter().position(|&w| w == transient).unwrap();
        assert_eq!(pos_t, pos_owner + 1);
    }
}
