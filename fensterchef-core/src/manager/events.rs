//! Event dispatch and window mode-transition orchestration (spec.md §4.D
//! "Creation"/"Destroy"/"Focus"/"Close", §6 "Event dispatch").
//!
//! Grounded in how the teacher's `pgwm-app/src/x11/mod.rs` matches over a
//! decoded event enum and calls back into `pgwm-core` state; here the
//! decoded enum is [`crate::display::DisplayEvent`] and the state is
//! [`WindowManager`]. Geometry and map-state are *not* pushed to the
//! display here -- that is `crate::sync::synchronize`'s job, run once per
//! cycle by the caller; this module only ever mutates the in-memory
//! model plus the handful of things that must happen immediately (input
//! focus, grabs, client messages, atom property writes the model itself
//! doesn't own).

use crate::config::interpreter;
use crate::display::{Display, DisplayEvent, WindowAttributes, WindowHandle};
use crate::frame::SplitDirection;
use crate::geometry::Rectangle;
use crate::ids::{MonitorId, WindowId};
use crate::manager::{InteractiveOp, WindowManager};
use crate::manager::properties;
use crate::monitor::QueriedOutput;
use crate::window::{FcWindow, Mode, Properties};

/// Top-level dispatch, called once per decoded event by the bin crate's
/// event loop.
pub fn dispatch(wm: &mut WindowManager, display: &mut dyn Display, event: DisplayEvent) {
    match event {
        DisplayEvent::KeyPress { keycode, modifiers, .. } => on_key(wm, display, keycode, modifiers, false),
        DisplayEvent::KeyRelease { keycode, modifiers, .. } => on_key(wm, display, keycode, modifiers, true),
        DisplayEvent::ButtonPress { window, button, modifiers, root_x, root_y } => {
            on_button(wm, display, window, button, modifiers, root_x, root_y, false);
        }
        DisplayEvent::ButtonRelease { window, button, modifiers, root_x, root_y } => {
            on_button(wm, display, window, button, modifiers, root_x, root_y, true);
        }
        DisplayEvent::Motion { root_x, root_y } => on_motion(wm, root_x, root_y),
        DisplayEvent::MapRequest { window } => on_map_request(wm, display, window),
        DisplayEvent::ConfigureRequest { window, rect, border_width } => {
            on_configure_request(wm, display, window, rect, border_width);
        }
        DisplayEvent::UnmapNotify { window } => on_unmap_notify(wm, window),
        DisplayEvent::DestroyNotify { window } => on_destroy_notify(wm, display, window),
        DisplayEvent::PropertyNotify { window, atom } => on_property_notify(wm, display, window, atom),
        DisplayEvent::ClientMessage { window, message_type, data } => {
            on_client_message(wm, display, window, message_type, data);
        }
        DisplayEvent::XkbMapNotify => regrab_all_keys(wm, display),
        DisplayEvent::ScreenChange => on_screen_change(wm, display),
    }
}

/// `notification.tick` expiring, or a keyboard/button event forcing it
/// closed early (spec.md §2 "Notification window").
pub fn hide_notification(wm: &mut WindowManager, display: &mut dyn Display) {
    if let Some(handle) = wm.notification_window.take() {
        display.unmap_window(handle);
    }
    wm.notification.dismiss();
}

/// `show message "..."` (spec.md §4.E `show message`): (re)creates the
/// overlay window lazily on first use and maps/repositions it.
pub fn show_notification(wm: &mut WindowManager, display: &mut dyn Display, text: String) {
    let anchor = wm
        .focused_frame
        .map(|f| wm.frames.get(f).rect)
        .or_else(|| wm.focused_monitor().map(|m| wm.monitors.get(m).rect))
        .unwrap_or_default();
    wm.notification.show(text, anchor, wm.now_secs);
    let rect = wm.notification.rect;
    let handle = match wm.notification_window {
        Some(h) => h,
        None => {
            let h = display.create_window(
                crate::display::WindowGeometry { rect, border_width: 0 },
                WindowAttributes { event_mask: 0, border_pixel: wm.config.border_color_idle, override_redirect: true, input_output: true },
            );
            wm.notification_window = Some(h);
            h
        }
    };
    display.configure_window(handle, crate::display::WindowGeometry { rect, border_width: 0 });
    display.map_window(handle);
    display.raise_window(handle);
}

// ---- keyboard / pointer --------------------------------------------------

fn on_key(wm: &mut WindowManager, display: &mut dyn Display, keycode: u8, modifiers: u32, is_release: bool) {
    if wm.notification.is_shown() {
        hide_notification(wm, display);
    }
    let masked = modifiers & !wm.config.ignored_modifiers;
    let Some(actions) = wm.key_bindings.lookup(keycode, is_release, masked).map(|b| b.actions.clone()) else {
        return;
    };
    interpreter::execute(wm, display, &actions);
}

#[allow(clippy::too_many_arguments)]
fn on_button(
    wm: &mut WindowManager,
    display: &mut dyn Display,
    window: WindowHandle,
    button: u8,
    modifiers: u32,
    root_x: i32,
    root_y: i32,
    is_release: bool,
) {
    wm.last_pointer = (root_x, root_y);
    if wm.notification.is_shown() {
        hide_notification(wm, display);
    }
    if is_release {
        wm.interactive = None;
    }
    wm.pressed_window = wm.window_for_handle(window);
    let masked = modifiers & !wm.config.ignored_modifiers;
    let Some(actions) = wm.button_bindings.lookup(button, is_release, masked).map(|b| b.actions.clone()) else {
        return;
    };
    interpreter::execute(wm, display, &actions);
}

fn on_motion(wm: &mut WindowManager, root_x: i32, root_y: i32) {
    let Some(op) = wm.interactive else {
        wm.last_pointer = (root_x, root_y);
        return;
    };
    match op {
        InteractiveOp::Move { window, start_x, start_y, orig_x, orig_y } => {
            if wm.windows.is_alive(window) {
                let (dx, dy) = (root_x - start_x, root_y - start_y);
                let w = wm.windows.get(window);
                let (width, height) = (w.w, w.h);
                wm.windows.set_size(window, orig_x + dx, orig_y + dy, width, height);
            }
        }
        InteractiveOp::Resize { window, start_x, start_y, orig_w, orig_h } => {
            if wm.windows.is_alive(window) {
                let (dw, dh) = (root_x - start_x, root_y - start_y);
                let new_w = (orig_w as i32 + dw).max(1) as u32;
                let new_h = (orig_h as i32 + dh).max(1) as u32;
                let (x, y) = (wm.windows.get(window).x, wm.windows.get(window).y);
                wm.windows.set_size(window, x, y, new_w, new_h);
            }
        }
    }
    wm.last_pointer = (root_x, root_y);
}

/// `initiate move`/`initiate resize` (spec.md §4.E): latches the pointer
/// and the window's current geometry so subsequent `Motion` events drag
/// it, ended by the releasing button event.
pub fn initiate_move(wm: &mut WindowManager) {
    let Some(id) = wm.selected_window else { return };
    if !wm.windows.is_alive(id) {
        return;
    }
    let w = wm.windows.get(id);
    let (start_x, start_y) = wm.last_pointer;
    wm.interactive = Some(InteractiveOp::Move { window: id, start_x, start_y, orig_x: w.x, orig_y: w.y });
}

pub fn initiate_resize(wm: &mut WindowManager) {
    let Some(id) = wm.selected_window else { return };
    if !wm.windows.is_alive(id) {
        return;
    }
    let w = wm.windows.get(id);
    let (start_x, start_y) = wm.last_pointer;
    wm.interactive = Some(InteractiveOp::Resize { window: id, start_x, start_y, orig_w: w.w, orig_h: w.h });
}

// ---- creation / destruction ----------------------------------------------

fn initial_mode(props: &Properties) -> Mode {
    if props.window_type_desktop {
        Mode::Desktop
    } else if props.window_type_dock {
        Mode::Dock
    } else if props.net_wm_state_atoms.iter().any(|s| s == "_NET_WM_STATE_FULLSCREEN") {
        Mode::Fullscreen
    } else if props.size_hints.forces_floating() || props.transient_for.is_some() {
        Mode::Floating
    } else {
        Mode::Tiling
    }
}

fn on_map_request(wm: &mut WindowManager, display: &mut dyn Display, handle: WindowHandle) {
    if wm.window_for_handle(handle).is_some() {
        display.map_window(handle);
        return;
    }
    let attrs = display.query_attributes(handle);
    if attrs.override_redirect || !attrs.input_output {
        display.map_window(handle);
        return;
    }
    if run_unmanaged_command(wm, display, handle) {
        display.map_window(handle);
        return;
    }
    let props = properties::load_properties(display, &wm.atoms, handle);
    let requested = wm.pending_geometry.remove(&handle);
    let mode = initial_mode(&props);
    let monitor = wm.focused_monitor();

    let floating = requested.unwrap_or_else(|| default_floating_rect(wm, monitor));
    let win = FcWindow::new(
        Some(handle),
        requested.map_or(0, |r| r.x),
        requested.map_or(0, |r| r.y),
        requested.map_or(200, |r| r.w),
        requested.map_or(150, |r| r.h),
        wm.config.border_size,
        wm.config.border_color_idle,
        floating,
        attrs,
        props,
        mode,
    );
    let id = wm.windows.insert(win, wm.config.first_window_number);
    wm.register_handle(handle, id);
    wm.selected_window = Some(id);

    match mode {
        Mode::Tiling => attach_tiling(wm, id, monitor),
        Mode::Floating => {
            let rect = wm.windows.get(id).floating;
            wm.windows.set_size(id, rect.x, rect.y, rect.w, rect.h);
        }
        Mode::Fullscreen => set_fullscreen_geometry(wm, id, monitor),
        // Dock geometry is recomputed every cycle by
        // `sync::reconcile_struts` (it has to re-run whenever any dock on
        // the monitor changes anyway); Desktop leaves geometry untouched.
        Mode::Dock | Mode::Desktop => {}
    }
    wm.windows.update_layer(id);

    let instance = wm.windows.get(id).props.instance.clone().unwrap_or_default();
    let class = wm.windows.get(id).props.class.clone().unwrap_or_default();
    let matched_relation = run_relations(wm, display, id, &instance, &class);

    // spec.md §4.D "Creation": a matching relation's actions own
    // show/hide/focus; absent one, `WM_HINTS`' initial_state decides
    // whether the window starts hidden; otherwise it is shown and
    // focused if focusable.
    if !matched_relation {
        let hints = wm.windows.get(id).props.wm_hints;
        if hints.initial_state_iconic || hints.initial_state_withdrawn {
            wm.windows.get_mut(id).is_visible = false;
        } else {
            wm.windows.get_mut(id).is_visible = true;
            if wm.windows.get(id).is_focusable() {
                wm.set_focused_frame(wm.windows.get(id).frame.or(wm.focused_frame), display);
                if wm.windows.get(id).frame.is_none() {
                    wm.windows.set_focus(Some(id));
                    if let Some(h) = wm.windows.get(id).server_id {
                        display.set_input_focus(h);
                    }
                    wm.selected_window = Some(id);
                }
            }
        }
    }
    if let Some(m) = monitor {
        wm.relayout(m);
    }
}

fn default_floating_rect(wm: &WindowManager, monitor: Option<MonitorId>) -> Rectangle {
    let Some(m) = monitor else { return Rectangle::new(0, 0, 400, 300) };
    let mr = wm.monitors.get(m).rect;
    let overlap = wm.config.overlap_percent.min(100);
    let w = (mr.w * overlap.max(1)) / 100;
    let h = (mr.h * overlap.max(1)) / 100;
    Rectangle::new(mr.x + ((mr.w.saturating_sub(w)) / 2) as i32, mr.y + ((mr.h.saturating_sub(h)) / 2) as i32, w.max(1), h.max(1))
}

fn set_fullscreen_geometry(wm: &mut WindowManager, id: WindowId, monitor: Option<MonitorId>) {
    let Some(m) = monitor else { return };
    let r = wm.monitors.get(m).rect;
    wm.windows.get_mut(id).border_size = 0;
    wm.windows.set_size(id, r.x, r.y, r.w, r.h);
}

/// Places `id` into the tree rooted at `monitor`: reuses an existing void
/// leaf when `auto_find_void` is set, else splits the best leaf under the
/// pointer when `auto_split` is set, else falls back to whatever void the
/// root itself offers.
fn attach_tiling(wm: &mut WindowManager, id: WindowId, monitor: Option<MonitorId>) {
    let Some(monitor) = monitor else { return };
    let root = wm.monitors.get(monitor).root;
    let target = if wm.config.auto_find_void {
        wm.frames.find_void_leaf(root)
    } else {
        None
    };
    let target = target.or_else(|| {
        if !wm.config.auto_split {
            return wm.frames.find_void_leaf(root);
        }
        let (px, py) = wm.last_pointer;
        let leaf = wm.frames.best_leaf(root, px, py);
        if wm.frames.get(leaf).is_void() {
            return Some(leaf);
        }
        let leaf_rect = wm.frames.get(leaf).rect;
        let axis = if leaf_rect.w >= leaf_rect.h { SplitDirection::Horizontal } else { SplitDirection::Vertical };
        let (_content_holder, void) = wm.frames.split(leaf, axis, false);
        Some(void)
    });
    let Some(target) = target else { return };
    wm.frames.get_mut(target).window = Some(id);
    wm.windows.get_mut(id).frame = Some(target);
    if wm.config.auto_equalize {
        if let Some(parent) = wm.frames.get(target).parent {
            wm.frames.equalize(wm.frames.topmost_matching(parent, SplitDirection::Horizontal), SplitDirection::Horizontal);
            wm.frames.equalize(wm.frames.topmost_matching(parent, SplitDirection::Vertical), SplitDirection::Vertical);
        }
    }
}

/// Detaches `id` from its tiling frame. If `remove_void` asks for the
/// frame to be collapsed into its sibling outright (spec.md §6 `auto
/// remove`/`auto remove void`), the frame disappears entirely; otherwise,
/// if `auto_fill_void` is set, the freshly emptied frame is immediately
/// refilled from the stash (spec.md §4.D "Mode transitions": "If leaving
/// Tiling ... if auto_remove[_void] ... remove the frame. Else if
/// auto_fill_void is set, refill the frame from the stash").
fn detach_from_tiling(wm: &mut WindowManager, id: WindowId, remove_void: bool) {
    let Some(frame) = wm.windows.get(id).frame else { return };
    wm.frames.get_mut(frame).window = None;
    wm.windows.get_mut(id).frame = None;
    if remove_void && wm.frames.get(frame).parent.is_some() {
        let _ = wm.frames.remove(frame);
    } else if wm.config.auto_fill_void {
        wm.refill_frame_from_stash(frame);
    }
}

/// The window-mode state machine (spec.md §4.D): Tiling <-> Floating <->
/// Fullscreen <-> Dock <-> Desktop, re-homing the window into or out of
/// the frame tree as needed.
pub fn set_mode(wm: &mut WindowManager, id: WindowId, mode: Mode) {
    if !wm.windows.is_alive(id) {
        return;
    }
    let old_mode = wm.windows.get(id).mode;
    if old_mode == mode {
        return;
    }
    if old_mode == Mode::Tiling {
        detach_from_tiling(wm, id, wm.config.auto_remove_void);
    }
    wm.windows.get_mut(id).previous_mode = old_mode;
    wm.windows.get_mut(id).mode = mode;
    let monitor = window_monitor(wm, id);
    match mode {
        Mode::Tiling => attach_tiling(wm, id, monitor),
        Mode::Floating => {
            let rect = wm.windows.get(id).floating;
            let rect = if rect.w == 0 || rect.h == 0 { default_floating_rect(wm, monitor) } else { rect };
            wm.windows.get_mut(id).border_size = wm.config.border_size;
            wm.windows.set_size(id, rect.x, rect.y, rect.w, rect.h);
        }
        Mode::Fullscreen => set_fullscreen_geometry(wm, id, monitor),
        // Dock geometry is recomputed every cycle by
        // `sync::reconcile_struts` (it has to re-run whenever any dock on
        // the monitor changes anyway); Desktop leaves geometry untouched.
        Mode::Dock | Mode::Desktop => {}
    }
    wm.windows.update_layer(id);
    if let Some(m) = monitor {
        wm.relayout(m);
    }
}

fn window_monitor(wm: &WindowManager, id: WindowId) -> Option<MonitorId> {
    if let Some(frame) = wm.windows.get(id).frame {
        return wm.monitor_of_frame(frame);
    }
    let w = wm.windows.get(id);
    wm.monitors.from_rectangle_or_primary(&Rectangle::new(w.x, w.y, w.w, w.h))
}

/// Runs every relation whose pattern matches `(instance, class)` with
/// `id` as the selected window, honoring `unrelate` (spec.md §5 "running
/// index"). Returns whether at least one relation matched, so the
/// caller can tell "a relation owns this window's visibility" from
/// "fall through to the default show/hide rule" (spec.md §4.D
/// "Creation").
/// Runs every relation matching `(instance, class)` in declaration
/// order. A matched relation's own action list may contain `unrelate`,
/// which removes *that* relation from the registry once it finishes
/// running (spec.md §4.E "`relate …`, `unrelate`, ... mutate the
/// registries"). Since relations can be added or removed by actions
/// that run here (including by this very loop), the match set is
/// snapshotted as indices up front and then walked with the spec.md §5
/// running-index rule applied by hand: removing the relation at
/// `adjusted` shifts every later snapshotted index down by one so nothing
/// is skipped or re-run.
fn run_relations(wm: &mut WindowManager, display: &mut dyn Display, id: WindowId, instance: &str, class: &str) -> bool {
    wm.selected_window = Some(id);
    let matched_indices: Vec<usize> = wm
        .relations
        .iter()
        .enumerate()
        .filter(|(_, r)| crate::glob::matches(&r.instance_pattern, instance) && crate::glob::matches(&r.class_pattern, class))
        .map(|(i, _)| i)
        .collect();
    let matched = !matched_indices.is_empty();
    let mut shift = 0usize;
    for idx in matched_indices {
        let Some(adjusted) = idx.checked_sub(shift) else { continue };
        let Some(relation) = wm.relations.get(adjusted) else { continue };
        let actions = relation.actions.clone();
        let unrelated = interpreter::execute(wm, display, &actions);
        if unrelated {
            wm.relations.remove_at(adjusted);
            shift += 1;
        }
    }
    matched
}

/// The `FENSTERCHEF_COMMAND` unmanaged-window protocol (spec.md §3
/// "Client Window" lifecycle, §6 "`FENSTERCHEF_COMMAND`"): a window
/// carrying this string property on `MapRequest` is never wrapped --
/// its content is run through the configuration interpreter, the
/// property is deleted, and the caller just grants the map request
/// without creating a [`FcWindow`] for it.
fn run_unmanaged_command(wm: &mut WindowManager, display: &mut dyn Display, handle: WindowHandle) -> bool {
    let Some(bytes) = display.get_property(handle, wm.atoms.fensterchef_command) else {
        return false;
    };
    display.delete_property(handle, wm.atoms.fensterchef_command);
    let source = String::from_utf8_lossy(&bytes).into_owned();
    let base_dir = std::env::temp_dir();
    let outcome = crate::config::parser::parse_config("<FENSTERCHEF_COMMAND>", &source, base_dir, &mut wm.aliases, &mut wm.groups);
    for err in &outcome.errors {
        log::error!("FENSTERCHEF_COMMAND parse error: {err}");
    }
    interpreter::execute(wm, display, &outcome.actions);
    true
}

fn on_configure_request(wm: &mut WindowManager, display: &mut dyn Display, handle: WindowHandle, rect: Rectangle, border_width: u32) {
    match wm.window_for_handle(handle) {
        None => {
            wm.pending_geometry.insert(handle, rect);
            display.configure_window(handle, crate::display::WindowGeometry { rect, border_width });
        }
        Some(id) => {
            if wm.windows.get(id).mode == Mode::Floating {
                wm.windows.set_size(id, rect.x, rect.y, rect.w, rect.h);
            } else {
                let w = wm.windows.get(id);
                let geom = crate::display::WindowGeometry {
                    rect: Rectangle::new(w.x, w.y, w.w, w.h),
                    border_width: w.border_size,
                };
                display.configure_window(handle, geom);
            }
        }
    }
}

fn on_unmap_notify(wm: &mut WindowManager, handle: WindowHandle) {
    if let Some(id) = wm.window_for_handle(handle) {
        if wm.windows.is_alive(id) {
            wm.windows.get_mut(id).is_visible = false;
        }
    }
}

fn on_destroy_notify(wm: &mut WindowManager, display: &mut dyn Display, handle: WindowHandle) {
    let Some(id) = wm.window_for_handle(handle) else { return };
    if wm.windows.get(id).mode == Mode::Tiling {
        detach_from_tiling(wm, id, wm.config.auto_remove);
    }
    wm.window_list.forget(id);
    if wm.selected_window == Some(id) {
        wm.selected_window = None;
    }
    if wm.pressed_window == Some(id) {
        wm.pressed_window = None;
    }
    wm.forget_handle(handle);
    let monitor = window_monitor(wm, id);
    wm.windows.mark_destroyed(id);
    if wm.focused_frame.and_then(|f| wm.frames.get(f).window) == Some(id) {
        wm.set_focused_frame(wm.focused_frame, display);
    }
    if let Some(m) = monitor {
        wm.relayout(m);
    }
}

fn on_property_notify(wm: &mut WindowManager, display: &mut dyn Display, handle: WindowHandle, atom: crate::display::AtomId) {
    let Some(id) = wm.window_for_handle(handle) else { return };
    let interesting = [
        wm.atoms.wm_normal_hints,
        wm.atoms.wm_hints,
        wm.atoms.wm_class,
        wm.atoms.wm_name,
        wm.atoms.net_wm_name,
        wm.atoms.net_wm_strut_partial,
        wm.atoms.net_wm_strut,
        wm.atoms.net_wm_window_type,
        wm.atoms.net_wm_state,
        wm.atoms.wm_protocols,
    ];
    if !interesting.contains(&atom) {
        return;
    }
    let props = properties::load_properties(display, &wm.atoms, handle);
    let forces_floating = props.size_hints.forces_floating();
    wm.windows.get_mut(id).props = props;
    if forces_floating && wm.windows.get(id).mode != Mode::Floating {
        set_mode(wm, id, Mode::Floating);
    }
}

fn on_client_message(wm: &mut WindowManager, display: &mut dyn Display, _handle: WindowHandle, message_type: crate::display::AtomId, _data: [u32; 5]) {
    if message_type == wm.atoms.net_close_window {
        if let Some(id) = wm.window_for_handle(_handle) {
            crate::config::interpreter::close_window(wm, display, id);
        }
    }
}

fn regrab_all_keys(wm: &mut WindowManager, display: &mut dyn Display) {
    let root = wm.root;
    let resolved: Vec<(u8, u32)> = wm
        .key_bindings
        .iter()
        .filter_map(|b| b.keysym.map(|sym| (sym, b.modifiers)))
        .collect();
    for binding in wm.key_bindings.iter() {
        display.ungrab_key(root, binding.keycode, binding.modifiers);
    }
    for binding in wm.key_bindings.iter_mut() {
        if let Some(sym) = binding.keysym {
            if let Some(code) = display.keysym_to_keycode(sym) {
                binding.keycode = code;
            }
        }
    }
    for (_, modifiers) in resolved {
        // Re-grab happens per updated keycode below via the table itself.
        let _ = modifiers;
    }
    for binding in wm.key_bindings.iter() {
        display.grab_key(root, binding.keycode, binding.modifiers);
    }
}

fn on_screen_change(wm: &mut WindowManager, display: &mut dyn Display) {
    let outputs = display.query_outputs();
    let queried: Vec<QueriedOutput> = crate::monitor::MonitorSet::normalize_query(
        outputs
            .into_iter()
            .map(|o| QueriedOutput { name: o.name, rect: o.rect, primary: o.primary })
            .collect(),
    );
    let queried = if queried.is_empty() {
        vec![QueriedOutput { name: "default".to_string(), rect: Rectangle::new(0, 0, 1920, 1080), primary: true }]
    } else {
        queried
    };
    let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
    for root in merge.vanished_roots {
        let windows = wm.frames.stash_later(root);
        for w in windows {
            if wm.windows.is_alive(w) {
                wm.windows.get_mut(w).is_visible = false;
                wm.windows.get_mut(w).frame = None;
                wm.windows.incref(w);
            }
        }
    }
    wm.monitors = merge.monitors;
    if wm.focused_monitor().is_none() {
        wm.set_focused_frame(wm.monitors.first().map(|m| wm.monitors.get(m).root), display);
    }
    wm.relayout_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{RecordingDisplay, WindowAttributes};
    use crate::geometry::Rectangle;

    fn make_tiling_window(wm: &mut WindowManager, server_id: u32) -> WindowId {
        let win = FcWindow::new(
            Some(server_id),
            0,
            0,
            100,
            100,
            3,
            0,
            Rectangle::default(),
            WindowAttributes { event_mask: 0, border_pixel: 0, override_redirect: false, input_output: true },
            Properties::default(),
            Mode::Tiling,
        );
        let id = wm.windows.insert(win, wm.config.first_window_number);
        wm.windows.get_mut(id).is_visible = true;
        id
    }

    /// spec.md §8 scenario 5: with `auto_fill_void`, a stash holding a
    /// single-window frame F1, leaving Tiling on the window occupying a
    /// different frame F2 refills F2 from the popped F1 instead of
    /// leaving it void (spec.md §4.D "Mode transitions").
    #[test]
    fn leaving_tiling_refills_void_from_stash() {
        let mut display = RecordingDisplay::new();
        let mut wm = WindowManager::new(&mut display, 1, Box::new(crate::shell::RecordingShellRunner::new()));
        wm.config.auto_remove_void = false;
        wm.config.auto_fill_void = true;

        let queried = vec![QueriedOutput { name: "eDP-1".to_string(), rect: Rectangle::new(0, 0, 800, 600), primary: true }];
        let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
        wm.monitors = merge.monitors;
        let root = wm.monitors.get(wm.monitors.first().unwrap()).root;
        let (f1, f2) = wm.frames.split(root, SplitDirection::Horizontal, true);

        let w1 = make_tiling_window(&mut wm, 1);
        wm.frames.get_mut(f1).window = Some(w1);
        wm.windows.get_mut(w1).frame = Some(f1);

        let w2 = make_tiling_window(&mut wm, 2);
        wm.frames.get_mut(f2).window = Some(w2);
        wm.windows.get_mut(w2).frame = Some(f2);

        // Stash F1 (it detaches from the tree, promoting F2 into the
        // root's slot -- the frame id that used to be F2 now IS root).
        let stashed_windows = wm.frames.stash_later(f1);
        for w in &stashed_windows {
            wm.windows.get_mut(*w).is_visible = false;
            wm.windows.get_mut(*w).frame = None;
            wm.windows.incref(*w);
        }
        assert!(wm.frames.stash_head().is_some());

        // Leave Tiling on W2 (now living directly at `root`): the frame
        // becomes void, and since auto_remove_void is off but
        // auto_fill_void is on, it must be refilled from the stash.
        set_mode(&mut wm, w2, Mode::Floating);

        assert!(wm.frames.stash_head().is_none(), "F1 should have been popped off the stash");
        assert_eq!(wm.frames.get(root).window, Some(w1));
        assert_eq!(wm.windows.get(w1).frame, Some(root));
        assert!(wm.windows.get(w1).is_visible);
        assert_eq!(wm.windows.get(w2).mode, Mode::Floating);
    }

    fn setup_single_monitor(wm: &mut WindowManager, display: &mut dyn Display) {
        let queried = vec![QueriedOutput { name: "eDP-1".to_string(), rect: Rectangle::new(0, 0, 800, 600), primary: true }];
        let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
        wm.monitors = merge.monitors;
        let root = wm.monitors.get(wm.monitors.first().unwrap()).root;
        wm.set_focused_frame(Some(root), display);
    }

    /// spec.md §3 "Client Window" lifecycle / §6 "`FENSTERCHEF_COMMAND`":
    /// a `MapRequest` for a window carrying this property runs its
    /// content through the interpreter instead of creating a wrapper,
    /// and deletes the property afterward.
    #[test]
    fn fensterchef_command_window_is_never_managed() {
        let mut display = RecordingDisplay::new();
        let mut wm = WindowManager::new(&mut display, 1, Box::new(crate::shell::RecordingShellRunner::new()));
        setup_single_monitor(&mut wm, &mut display);

        let handle = 42;
        display.properties.insert((handle, wm.atoms.fensterchef_command), b"gaps inner 9".to_vec());

        dispatch(&mut wm, &mut display, DisplayEvent::MapRequest { window: handle });

        assert_eq!(wm.config.gaps_inner, crate::geometry::Extents { left: 9, right: 9, top: 9, bottom: 9 });
        assert!(wm.window_for_handle(handle).is_none());
        assert!(display.properties.get(&(handle, wm.atoms.fensterchef_command)).is_none());
        assert_eq!(display.mapped.get(&handle), Some(&true));
    }

    /// spec.md §4.D "Creation": `WM_HINTS`' `initial_state` of
    /// Iconic/Withdrawn leaves a freshly mapped window hidden instead of
    /// showing and focusing it.
    #[test]
    fn iconic_initial_state_leaves_window_hidden() {
        let mut display = RecordingDisplay::new();
        let mut wm = WindowManager::new(&mut display, 1, Box::new(crate::shell::RecordingShellRunner::new()));
        setup_single_monitor(&mut wm, &mut display);

        let handle = 7;
        let flags: u32 = 1 << 1; // STATE_HINT
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&flags.to_ne_bytes());
        bytes.extend_from_slice(&0u32.to_ne_bytes());
        bytes.extend_from_slice(&3u32.to_ne_bytes()); // IconicState
        display.properties.insert((handle, wm.atoms.wm_hints), bytes);

        dispatch(&mut wm, &mut display, DisplayEvent::MapRequest { window: handle });

        let id = wm.window_for_handle(handle).expect("window should still be managed");
        assert!(!wm.windows.get(id).is_visible);
        assert_ne!(wm.windows.focused_window, Some(id));
    }
}
