//! Executes an [`ActionList`] against a [`WindowManager`] (spec.md §4.E
//! "Full action catalog").
//!
//! Grounded in how the teacher's `pgwm-app` dispatches a decoded keypress
//! to one of a fixed set of functions over `&mut State`
//! (`pgwm-app/src/x11/mod.rs`); here the dispatch table is the `Action`
//! enum itself rather than a keybinding-to-function map, since the same
//! interpreter runs at parse time (defaults, `reload configuration`),
//! at bind time (a key/button firing its stored `ActionList`) and from
//! `call`/relations.

use crate::action::{Action, ActionList, ButtonTarget, Int, KeyTarget};
use crate::config::registry::{ButtonBinding, GroupEffects, KeyBinding, Relation};
use crate::display::Display;
use crate::frame::{Direction, SplitDirection};
use crate::ids::{FrameId, WindowId};
use crate::manager::events;
use crate::manager::WindowManager;
use crate::shell::ShellRunner;
use crate::window::Mode;

/// Non-percent integer arguments (border sizes, colors, gaps, ...) have no
/// "total" to resolve a percent against; negative values clamp to zero.
fn as_u32(n: &Int) -> u32 {
    n.value.max(0) as u32
}

fn as_i32(n: &Int) -> i32 {
    n.value as i32
}

/// Runs every action in `actions` in order. Returns `true` if an
/// `Unrelate` fired, letting a relation's own action list tell its
/// caller ([`events::run_relations`]-style callers) to stop treating the
/// relation as still installed.
pub fn execute(wm: &mut WindowManager, display: &mut dyn Display, actions: &ActionList) -> bool {
    let mut unrelated = false;
    for action in actions.iter() {
        if run_one(wm, display, action) {
            unrelated = true;
        }
    }
    unrelated
}

fn selected_window(wm: &WindowManager) -> Option<WindowId> {
    wm.selected_window
}

fn window_by_number(wm: &WindowManager, n: i64) -> Option<WindowId> {
    if n < 0 {
        return None;
    }
    let n = n as u32;
    wm.windows.by_number().iter().copied().find(|&w| wm.windows.get(w).number == n)
}

fn frame_by_number(wm: &WindowManager, n: i64) -> Option<FrameId> {
    if n <= 0 {
        return None;
    }
    wm.frames.find_by_number(n as u32, &wm.monitors.roots())
}

fn cross_monitor_root(wm: &WindowManager, dir: Direction) -> Option<FrameId> {
    let mon = wm.focused_monitor()?;
    let target = wm.monitors.directional(mon, dir)?;
    Some(wm.monitors.get(target).root)
}

fn focus_dir(wm: &mut WindowManager, display: &mut dyn Display, dir: Direction) {
    let Some(f) = wm.focused_frame else { return };
    if let Some(target) = wm.frames.navigate(f, dir).or_else(|| cross_monitor_root(wm, dir)) {
        wm.set_focused_frame(Some(target), display);
    }
}

fn move_dir(wm: &mut WindowManager, dir: Direction) {
    let Some(f) = wm.focused_frame else { return };
    let cross = cross_monitor_root(wm, dir);
    if wm.frames.move_towards(f, dir, cross) {
        wm.resync_tiling_frames();
        wm.relayout_all();
    }
}

fn exchange_dir(wm: &mut WindowManager, dir: Direction) {
    let Some(f) = wm.focused_frame else { return };
    if let Some(target) = wm.frames.navigate(f, dir).or_else(|| cross_monitor_root(wm, dir)) {
        if target != f {
            if wm.frames.exchange(f, target).is_ok() {
                wm.resync_tiling_frames();
                wm.relayout_all();
            }
        }
    }
}

/// `focus child [I]`: descends `levels` times, each time picking the
/// child `moved_from_left` points at (the side that inherited the
/// split's old content, per `FrameArena::split`) rather than always the
/// left/top child. Stops early once a leaf is reached.
fn focus_child_n(wm: &mut WindowManager, display: &mut dyn Display, levels: i64) {
    let Some(mut f) = wm.focused_frame else { return };
    for _ in 0..levels.max(1) {
        let Some((a, b)) = wm.frames.get(f).children else { break };
        f = if wm.frames.get(f).moved_from_left { a } else { b };
    }
    wm.set_focused_frame(Some(f), display);
}

/// `focus parent [I]`: ascends `levels` times, each time recording on
/// the parent which child it came from so a later `focus child` returns
/// to the same side. Stops early once the root is reached.
fn focus_parent_n(wm: &mut WindowManager, display: &mut dyn Display, levels: i64) {
    let Some(mut f) = wm.focused_frame else { return };
    for _ in 0..levels.max(1) {
        let Some(parent) = wm.frames.get(f).parent else { break };
        if let Some((a, _b)) = wm.frames.get(parent).children {
            wm.frames.get_mut(parent).moved_from_left = f == a;
        }
        f = parent;
    }
    wm.set_focused_frame(Some(f), display);
}

/// Splits the focused frame, following focus from `from` into the fresh
/// frame that inherits its content, per spec.md §4.C "Split": "Focus
/// follows `from`->`new` if `from` had focus" -- always true here since
/// `from` is `wm.focused_frame` itself.
fn split(wm: &mut WindowManager, display: &mut dyn Display, dir: SplitDirection, is_left: bool) {
    let Some(f) = wm.focused_frame else { return };
    let (content, _void) = wm.frames.split(f, dir, is_left);
    if wm.config.auto_equalize {
        if let Some(parent) = wm.frames.get(content).parent {
            wm.frames.equalize(parent, dir);
        }
    }
    wm.resync_tiling_frames();
    wm.set_focused_frame(Some(content), display);
    wm.relayout_all();
}

/// Collapses `frame` into its sibling per spec.md §4.C "Remove": "Focus
/// is repaired to `best_leaf(parent)` if it pointed into the removed
/// subtree" -- the removed subtree is exactly `frame` itself (the
/// sibling survives, reparented, under the same ids it already had).
fn remove_frame(wm: &mut WindowManager, display: &mut dyn Display, frame: FrameId) {
    if wm.frames.get(frame).parent.is_none() {
        return;
    }
    let had_focus = wm.focused_frame == Some(frame);
    if let Ok((parent, removed_window)) = wm.frames.remove(frame) {
        if let Some(w) = removed_window {
            if wm.windows.is_alive(w) {
                wm.windows.get_mut(w).frame = None;
                events::set_mode(wm, w, Mode::Floating);
            }
        }
        wm.resync_tiling_frames();
        if had_focus {
            let rect = wm.frames.get(parent).rect;
            let leaf = wm.frames.best_leaf(parent, rect.x, rect.y);
            wm.set_focused_frame(Some(leaf), display);
        }
        wm.relayout_all();
    }
}

fn pop_stash(wm: &mut WindowManager) {
    let Some(target) = wm.focused_frame.filter(|&f| wm.frames.get(f).is_void()) else { return };
    wm.refill_frame_from_stash(target);
    wm.relayout_all();
}

pub fn close_window(wm: &mut WindowManager, display: &mut dyn Display, id: WindowId) {
    if !wm.windows.is_alive(id) {
        return;
    }
    let now = wm.now_secs;
    if wm.windows.should_force_close(id, now) {
        if let Some(handle) = wm.windows.get(id).server_id {
            display.destroy_window(handle);
        }
        return;
    }
    let supports_delete = wm.windows.get(id).props.protocols_delete_window;
    let handle = wm.windows.get(id).server_id;
    if supports_delete {
        if let Some(h) = handle {
            display.send_client_message(h, wm.atoms.wm_protocols, [wm.atoms.wm_delete_window, 0, 0, 0, 0]);
        }
        wm.windows.record_close_request(id, now);
    } else if let Some(h) = handle {
        display.destroy_window(h);
    }
}

fn center_window(wm: &mut WindowManager, id: WindowId, monitor: Option<crate::ids::MonitorId>) {
    let Some(m) = monitor else { return };
    let mr = wm.monitors.get(m).rect;
    let w = wm.windows.get(id);
    let (ww, wh) = (w.w, w.h);
    let x = mr.x + (mr.w as i32 - ww as i32) / 2;
    let y = mr.y + (mr.h as i32 - wh as i32) / 2;
    wm.windows.set_size(id, x, y, ww, wh);
}

fn bind_key(wm: &mut WindowManager, display: &mut dyn Display, def: &crate::action::KeyBindingDef) {
    let keycode = match def.key {
        KeyTarget::Keycode(c) => c,
        KeyTarget::Keysym(sym) => match display.keysym_to_keycode(sym) {
            Some(c) => c,
            None => return,
        },
    };
    let keysym = match def.key {
        KeyTarget::Keysym(sym) => Some(sym),
        KeyTarget::Keycode(_) => None,
    };
    display.grab_key(wm.root, keycode, def.modifiers);
    wm.key_bindings.set(KeyBinding {
        is_release: def.flags.is_release,
        modifiers: def.modifiers,
        keysym,
        keycode,
        actions: def.actions.clone(),
    });
}

fn bind_button(wm: &mut WindowManager, display: &mut dyn Display, def: &crate::action::ButtonBindingDef) {
    let crate::action::ButtonTarget::Index(button) = def.button;
    display.grab_button(wm.root, button, def.modifiers);
    wm.button_bindings.set(ButtonBinding {
        is_release: def.flags.is_release,
        is_transparent: def.flags.is_transparent,
        modifiers: def.modifiers,
        button,
        actions: def.actions.clone(),
    });
}

fn unbind_key(wm: &mut WindowManager, display: &mut dyn Display, modifiers: u32, key: KeyTarget) {
    let keycode = match key {
        KeyTarget::Keycode(c) => c,
        KeyTarget::Keysym(sym) => match display.keysym_to_keycode(sym) {
            Some(c) => c,
            None => return,
        },
    };
    wm.key_bindings.unset(keycode, false, modifiers);
    wm.key_bindings.unset(keycode, true, modifiers);
    display.ungrab_key(wm.root, keycode, modifiers);
}

fn unbind_button(wm: &mut WindowManager, display: &mut dyn Display, modifiers: u32, button: ButtonTarget) {
    let ButtonTarget::Index(button) = button;
    wm.button_bindings.unset(button, false, modifiers);
    wm.button_bindings.unset(button, true, modifiers);
    display.ungrab_button(wm.root, button, modifiers);
}

/// `call NAME`: runs a group's body, recording every relation/binding it
/// newly installs into the group's [`GroupEffects`] so a later `ungroup`
/// can reverse exactly those changes (spec.md §5 GLOSSARY "ungroup").
fn call_group(wm: &mut WindowManager, display: &mut dyn Display, name: &str) {
    let Some(actions) = wm.groups.get(name).map(|g| g.actions.clone()) else { return };
    let before_relations = wm.relations.len();
    let before_keys: std::collections::HashSet<(u8, bool, u32)> =
        wm.key_bindings.iter().map(|b| (b.keycode, b.is_release, b.modifiers)).collect();
    let before_buttons: std::collections::HashSet<(u8, bool, u32)> =
        wm.button_bindings.iter().map(|b| (b.button, b.is_release, b.modifiers)).collect();

    execute(wm, display, &actions);

    let mut effects = GroupEffects::default();
    for i in before_relations..wm.relations.len() {
        effects.relation_indices.push(i);
    }
    for b in wm.key_bindings.iter() {
        if !before_keys.contains(&(b.keycode, b.is_release, b.modifiers)) {
            let target = b.keysym.map_or(KeyTarget::Keycode(b.keycode), KeyTarget::Keysym);
            effects.key_bindings.push((b.modifiers, target));
        }
    }
    for b in wm.button_bindings.iter() {
        if !before_buttons.contains(&(b.button, b.is_release, b.modifiers)) {
            effects.button_bindings.push((b.modifiers, ButtonTarget::Index(b.button)));
        }
    }
    if let Some(g) = wm.groups.get_mut_by_name(name) {
        g.effects = effects;
    }
}

/// `ungroup NAME`: reverses exactly the side effects `call` recorded,
/// then forgets the group (spec.md §5 GLOSSARY).
fn ungroup(wm: &mut WindowManager, display: &mut dyn Display, name: &str) {
    let Some(entry) = wm.groups.remove(name) else { return };
    for &idx in entry.effects.relation_indices.iter().rev() {
        wm.relations.remove_at(idx);
    }
    for (modifiers, target) in entry.effects.key_bindings {
        unbind_key(wm, display, modifiers, target);
    }
    for (modifiers, target) in entry.effects.button_bindings {
        unbind_button(wm, display, modifiers, target);
    }
}

fn run_one(wm: &mut WindowManager, display: &mut dyn Display, action: &Action) -> bool {
    match action {
        Action::Nop | Action::Empty => {}

        Action::Assign(n) => {
            if let Some(f) = wm.focused_frame {
                let number = as_u32(n);
                let roots = wm.monitors.roots();
                wm.frames.assign_number(f, number, &roots);
            }
        }
        Action::AssignWindow(n) => {
            if let Some(w) = selected_window(wm) {
                wm.windows.assign_number(w, as_u32(n));
            }
        }

        Action::AutoEqualize(v) => wm.config.auto_equalize = *v,
        Action::AutoFillVoid(v) => wm.config.auto_fill_void = *v,
        Action::AutoFindVoid(v) => wm.config.auto_find_void = *v,
        Action::AutoRemove(v) => wm.config.auto_remove = *v,
        Action::AutoRemoveVoid(v) => wm.config.auto_remove_void = *v,
        Action::AutoSplit(v) => wm.config.auto_split = *v,

        Action::Background(n) => wm.config.background = as_u32(n),
        Action::Foreground(n) => wm.config.foreground = as_u32(n),
        Action::BorderColorActive(n) => wm.config.border_color_active = as_u32(n),
        Action::BorderColorFocus(n) => wm.config.border_color_focus = as_u32(n),
        Action::BorderColor(n) => wm.config.border_color_idle = as_u32(n),
        Action::BorderSize(n) => wm.config.border_size = as_u32(n),
        Action::BorderColorCurrent(n) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    wm.windows.get_mut(w).border_color = as_u32(n);
                }
            }
        }
        Action::BorderSizeCurrent(n) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    wm.windows.get_mut(w).border_size = as_u32(n);
                    wm.relayout_all();
                }
            }
        }

        Action::Call(name) => call_group(wm, display, name),

        Action::CenterWindow => {
            if let Some(w) = selected_window(wm) {
                let monitor = wm.focused_monitor();
                center_window(wm, w, monitor);
            }
        }
        Action::CenterWindowTo(pattern) => {
            if let Some(w) = selected_window(wm) {
                let monitor = wm.monitors.by_pattern_or_primary(pattern);
                center_window(wm, w, monitor);
            }
        }

        Action::CloseWindow => {
            if let Some(w) = selected_window(wm) {
                close_window(wm, display, w);
            }
        }
        Action::CloseWindowI(n) => {
            if let Some(w) = window_by_number(wm, n.value) {
                close_window(wm, display, w);
            }
        }

        Action::CursorHorizontal(name)
        | Action::CursorMoving(name)
        | Action::CursorRoot(name)
        | Action::CursorSizing(name)
        | Action::CursorVertical(name) => display.set_cursor(wm.root, name),

        Action::DumpLayout(path) => {
            let dump = format!("{:#?}", wm.monitors.roots());
            let _ = std::fs::write(path, dump);
        }

        Action::Equalize => {
            if let Some(f) = wm.focused_frame {
                wm.frames.equalize(f, SplitDirection::Horizontal);
                wm.frames.equalize(f, SplitDirection::Vertical);
                wm.relayout_all();
            }
        }

        Action::ExchangeDown => exchange_dir(wm, Direction::Down),
        Action::ExchangeLeft => exchange_dir(wm, Direction::Left),
        Action::ExchangeRight => exchange_dir(wm, Direction::Right),
        Action::ExchangeUp => exchange_dir(wm, Direction::Up),

        Action::FocusChild => focus_child_n(wm, display, 1),
        Action::FocusChildI(n) => focus_child_n(wm, display, n.value),
        Action::FocusDown => focus_dir(wm, display, Direction::Down),
        Action::FocusLeft => focus_dir(wm, display, Direction::Left),
        Action::FocusRight => focus_dir(wm, display, Direction::Right),
        Action::FocusUp => focus_dir(wm, display, Direction::Up),
        Action::Focus => wm.set_focused_frame(wm.focused_frame, display),
        Action::FocusI(n) => {
            if let Some(f) = frame_by_number(wm, n.value) {
                wm.set_focused_frame(Some(f), display);
            }
        }
        Action::FocusLeaf => {
            if let Some(f) = wm.focused_frame {
                let (px, py) = wm.last_pointer;
                let leaf = wm.frames.best_leaf(f, px, py);
                wm.set_focused_frame(Some(leaf), display);
            }
        }
        Action::FocusParent => focus_parent_n(wm, display, 1),
        Action::FocusParentI(n) => focus_parent_n(wm, display, n.value),
        Action::FocusMonitor(pattern) => {
            if let Some(m) = wm.monitors.by_pattern_or_primary(pattern) {
                let root = wm.monitors.get(m).root;
                wm.set_focused_frame(Some(root), display);
            }
        }
        Action::FocusRoot => {
            if let Some(m) = wm.focused_monitor() {
                let root = wm.monitors.get(m).root;
                wm.set_focused_frame(Some(root), display);
            }
        }
        Action::FocusRootS(pattern) => {
            if let Some(m) = wm.monitors.by_pattern_or_primary(pattern) {
                let root = wm.monitors.get(m).root;
                wm.set_focused_frame(Some(root), display);
            }
        }
        Action::FocusWindow => {
            if let Some(w) = selected_window(wm) {
                if let Some(f) = wm.windows.get(w).frame {
                    wm.set_focused_frame(Some(f), display);
                } else {
                    wm.windows.set_focus(Some(w));
                    if let Some(h) = wm.windows.get(w).server_id {
                        display.set_input_focus(h);
                    }
                }
            }
        }
        Action::FocusWindowI(n) => {
            if let Some(w) = window_by_number(wm, n.value) {
                if let Some(f) = wm.windows.get(w).frame {
                    wm.set_focused_frame(Some(f), display);
                }
            }
        }

        Action::Font(f) => wm.config.font = f.clone(),

        Action::GapsInner(n) => {
            let v = as_i32(n);
            wm.config.gaps_inner = crate::geometry::Extents { left: v, right: v, top: v, bottom: v };
            wm.relayout_all();
        }
        Action::GapsInnerII(h, v) => {
            let (h, v) = (as_i32(h), as_i32(v));
            wm.config.gaps_inner = crate::geometry::Extents { left: h, right: h, top: v, bottom: v };
            wm.relayout_all();
        }
        Action::GapsInnerIIII(l, r, t, b) => {
            wm.config.gaps_inner =
                crate::geometry::Extents { left: as_i32(l), right: as_i32(r), top: as_i32(t), bottom: as_i32(b) };
            wm.relayout_all();
        }
        Action::GapsOuter(n) => {
            let v = as_i32(n);
            wm.config.gaps_outer = crate::geometry::Extents { left: v, right: v, top: v, bottom: v };
            wm.relayout_all();
        }
        Action::GapsOuterII(h, v) => {
            let (h, v) = (as_i32(h), as_i32(v));
            wm.config.gaps_outer = crate::geometry::Extents { left: h, right: h, top: v, bottom: v };
            wm.relayout_all();
        }
        Action::GapsOuterIIII(l, r, t, b) => {
            wm.config.gaps_outer =
                crate::geometry::Extents { left: as_i32(l), right: as_i32(r), top: as_i32(t), bottom: as_i32(b) };
            wm.relayout_all();
        }

        Action::HintSplitHorizontally => split(wm, display, SplitDirection::Horizontal, true),
        Action::HintSplitVertically => split(wm, display, SplitDirection::Vertical, true),

        Action::Indicate => {}

        Action::InitiateMove => events::initiate_move(wm),
        Action::InitiateResize => events::initiate_resize(wm),

        Action::MinimizeWindow => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    wm.windows.get_mut(w).is_visible = false;
                }
            }
        }
        Action::MinimizeWindowI(n) => {
            if let Some(w) = window_by_number(wm, n.value) {
                if wm.windows.is_alive(w) {
                    wm.windows.get_mut(w).is_visible = false;
                }
            }
        }

        Action::ModifiersIgnore(n) => wm.config.ignored_modifiers = as_u32(n),

        Action::MoveDown => move_dir(wm, Direction::Down),
        Action::MoveLeft => move_dir(wm, Direction::Left),
        Action::MoveRight => move_dir(wm, Direction::Right),
        Action::MoveUp => move_dir(wm, Direction::Up),

        Action::MoveWindowBy(dx, dy) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    let monitor_w = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.w);
                    let monitor_h = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.h);
                    let win = wm.windows.get(w);
                    let (x, y, ww, wh) = (win.x, win.y, win.w, win.h);
                    let nx = x + dx.resolve(monitor_w) as i32;
                    let ny = y + dy.resolve(monitor_h) as i32;
                    wm.windows.set_size(w, nx, ny, ww, wh);
                }
            }
        }
        Action::MoveWindowTo(x, y) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    let monitor_w = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.w);
                    let monitor_h = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.h);
                    let win = wm.windows.get(w);
                    let (ww, wh) = (win.w, win.h);
                    wm.windows.set_size(w, x.resolve(monitor_w) as i32, y.resolve(monitor_h) as i32, ww, wh);
                }
            }
        }

        Action::NotificationDuration(n) => {
            wm.config.notification_duration_secs = as_u32(n);
            wm.notification.set_duration_secs(wm.config.notification_duration_secs);
        }
        Action::Overlap(n) => wm.config.overlap_percent = as_u32(n).min(100),

        Action::PopStash => pop_stash(wm),

        Action::Quit => wm.should_quit = true,
        Action::ReloadConfiguration => wm.reload_configuration(display),
        Action::SetDefaults => wm.load_defaults(display),

        Action::Remove => {
            if let Some(f) = wm.focused_frame {
                remove_frame(wm, display, f);
            }
        }
        Action::RemoveI(n) => {
            if let Some(f) = frame_by_number(wm, n.value) {
                remove_frame(wm, display, f);
            }
        }

        Action::ResizeWindowBy(dw, dh) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    let monitor_w = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.w);
                    let monitor_h = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.h);
                    let win = wm.windows.get(w);
                    let (x, y, ww, wh) = (win.x, win.y, win.w, win.h);
                    let nw = (ww as i64 + dw.resolve(monitor_w)).max(1) as u32;
                    let nh = (wh as i64 + dh.resolve(monitor_h)).max(1) as u32;
                    wm.windows.set_size(w, x, y, nw, nh);
                }
            }
        }
        Action::ResizeWindowTo(dw, dh) => {
            if let Some(w) = selected_window(wm) {
                if wm.windows.is_alive(w) {
                    let monitor_w = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.w);
                    let monitor_h = wm.focused_monitor().map_or(0, |m| wm.monitors.get(m).rect.h);
                    let win = wm.windows.get(w);
                    let (x, y) = (win.x, win.y);
                    let nw = dw.resolve(monitor_w).max(1) as u32;
                    let nh = dh.resolve(monitor_h).max(1) as u32;
                    wm.windows.set_size(w, x, y, nw, nh);
                }
            }
        }

        Action::Run(cmd) => {
            log::info!("run: {cmd}");
            wm.shell.spawn(cmd);
        }
        Action::ShowRun(cmd) => {
            log::info!("show run: {cmd}");
            let output = wm.shell.run_capturing(cmd);
            events::show_notification(wm, display, output);
        }

        Action::SelectFocus => wm.selected_window = wm.windows.focused_window,
        Action::SelectPressed => {
            if let Some(w) = wm.pressed_window {
                wm.selected_window = Some(w);
            }
        }
        Action::SelectWindow(n) => {
            if let Some(w) = window_by_number(wm, n.value) {
                wm.selected_window = Some(w);
            }
        }

        Action::SetFloating => {
            if let Some(w) = selected_window(wm) {
                events::set_mode(wm, w, Mode::Floating);
            }
        }
        Action::SetFullscreen => {
            if let Some(w) = selected_window(wm) {
                events::set_mode(wm, w, Mode::Fullscreen);
            }
        }
        Action::SetTiling => {
            if let Some(w) = selected_window(wm) {
                events::set_mode(wm, w, Mode::Tiling);
            }
        }
        Action::ToggleTiling => {
            if let Some(w) = selected_window(wm) {
                let mode = if wm.windows.get(w).mode == Mode::Tiling { wm.windows.get(w).previous_mode } else { Mode::Tiling };
                let mode = if mode == Mode::Tiling { Mode::Floating } else { mode };
                events::set_mode(wm, w, mode);
            }
        }
        Action::ToggleFullscreen => {
            if let Some(w) = selected_window(wm) {
                let mode = if wm.windows.get(w).mode == Mode::Fullscreen { wm.windows.get(w).previous_mode } else { Mode::Fullscreen };
                let mode = if mode == Mode::Fullscreen { Mode::Floating } else { mode };
                events::set_mode(wm, w, mode);
            }
        }
        Action::ToggleFocus => {
            if let Some(f) = wm.focused_frame {
                if let Some(parent) = wm.frames.get(f).parent {
                    wm.set_focused_frame(Some(parent), display);
                } else {
                    wm.set_focused_frame(Some(f), display);
                }
            }
        }

        Action::ShowList => {
            let by_number = wm.windows.by_number().to_vec();
            wm.window_list.toggle(&by_number, wm.windows.focused_window);
        }
        Action::ShowMessage(text) => events::show_notification(wm, display, text.clone()),
        Action::ShowNextWindow | Action::ShowNextWindowI(_) => {
            let by_number = wm.windows.by_number().to_vec();
            wm.window_list.step(&by_number, 1);
        }
        Action::ShowPreviousWindow | Action::ShowPreviousWindowI(_) => {
            let by_number = wm.windows.by_number().to_vec();
            wm.window_list.step(&by_number, -1);
        }
        Action::ShowWindow => {
            if let Some(w) = wm.window_list.selected() {
                wm.set_focused_frame(wm.windows.get(w).frame, display);
                wm.window_list.close();
            }
        }
        Action::ShowWindowI(n) => {
            if let Some(w) = window_by_number(wm, n.value) {
                wm.set_focused_frame(wm.windows.get(w).frame, display);
            }
        }

        Action::SplitHorizontally => split(wm, display, SplitDirection::Horizontal, true),
        Action::SplitVertically => split(wm, display, SplitDirection::Vertical, true),
        Action::SplitLeftHorizontally => split(wm, display, SplitDirection::Horizontal, false),
        Action::SplitLeftVertically => split(wm, display, SplitDirection::Vertical, false),

        Action::TextPadding(n) => wm.config.text_padding = as_u32(n),

        Action::Relation(def) => {
            wm.relations.push(Relation {
                instance_pattern: def.instance_pattern.clone(),
                class_pattern: def.class_pattern.clone(),
                actions: def.actions.clone(),
            });
        }
        Action::Unrelate => return true,

        Action::ButtonBinding(def) => bind_button(wm, display, def),
        Action::KeyBinding(def) => bind_key(wm, display, def),
        Action::Ungroup(name) => ungroup(wm, display, name),
        Action::UnbindKey { modifiers, key } => unbind_key(wm, display, *modifiers, *key),
        Action::UnbindButton { modifiers, button } => unbind_button(wm, display, *modifiers, *button),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::RecordingDisplay;
    use crate::geometry::Rectangle;
    use crate::monitor::QueriedOutput;

    fn two_monitor_manager() -> (WindowManager, RecordingDisplay) {
        let mut display = RecordingDisplay::new();
        let mut wm = WindowManager::new(&mut display, 1, Box::new(crate::shell::RecordingShellRunner::new()));
        let queried = vec![
            QueriedOutput { name: "Main".to_string(), rect: Rectangle::new(0, 0, 800, 600), primary: true },
            QueriedOutput { name: "Right".to_string(), rect: Rectangle::new(810, 0, 800, 600), primary: false },
        ];
        let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
        wm.monitors = merge.monitors;
        let first_root = wm.monitors.get(wm.monitors.first().unwrap()).root;
        wm.set_focused_frame(Some(first_root), &mut display);
        (wm, display)
    }

    /// spec.md §8 scenario 2: focusing the sole leaf of `Right` from
    /// `Main`'s leaf, with no in-tree neighbor, falls back to the
    /// adjacent monitor's root frame (`cross_monitor_root`).
    #[test]
    fn scenario_2_focus_right_crosses_monitor() {
        let (mut wm, mut display) = two_monitor_manager();
        let right_monitor = wm.monitors.by_name("Right").unwrap();
        let right_root = wm.monitors.get(right_monitor).root;

        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusRight]));

        assert_eq!(wm.focused_frame, Some(right_root));
    }

    #[test]
    fn focus_right_at_rightmost_monitor_does_not_move() {
        let (mut wm, mut display) = two_monitor_manager();
        let right_monitor = wm.monitors.by_name("Right").unwrap();
        let right_root = wm.monitors.get(right_monitor).root;
        wm.set_focused_frame(Some(right_root), &mut display);

        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusRight]));

        assert_eq!(wm.focused_frame, Some(right_root));
    }

    /// `split horizontally` then `remove` should return the tree to its
    /// prior single-leaf shape (spec.md §8 "Split then Remove" law).
    #[test]
    fn split_then_remove_round_trips_through_actions() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();
        let original_rect = wm.frames.get(root).rect;

        execute(&mut wm, &mut display, &ActionList(vec![Action::SplitHorizontally]));
        assert!(wm.frames.get(root).children.is_some());

        execute(&mut wm, &mut display, &ActionList(vec![Action::Remove]));

        assert_eq!(wm.focused_frame, Some(root));
        assert!(wm.frames.get(root).children.is_none());
        assert_eq!(wm.frames.get(root).rect, original_rect);
    }

    #[test]
    fn assign_action_renumbers_focused_frame() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();

        execute(&mut wm, &mut display, &ActionList(vec![Action::Assign(Int::plain(5))]));

        assert_eq!(wm.frames.get(root).number, 5);
    }

    #[test]
    fn toggle_tiling_restores_previous_mode() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();
        let win = crate::window::FcWindow::new(
            Some(7),
            0,
            0,
            100,
            100,
            3,
            0,
            Rectangle::default(),
            crate::display::WindowAttributes { event_mask: 0, border_pixel: 0, override_redirect: false, input_output: true },
            crate::window::Properties::default(),
            Mode::Tiling,
        );
        let id = wm.windows.insert(win, wm.config.first_window_number);
        wm.windows.get_mut(id).is_visible = true;
        wm.frames.get_mut(root).window = Some(id);
        wm.windows.get_mut(id).frame = Some(root);
        wm.selected_window = Some(id);

        execute(&mut wm, &mut display, &ActionList(vec![Action::ToggleFullscreen]));
        assert_eq!(wm.windows.get(id).mode, Mode::Fullscreen);

        execute(&mut wm, &mut display, &ActionList(vec![Action::ToggleFullscreen]));
        assert_eq!(wm.windows.get(id).mode, Mode::Tiling);
    }

    /// A window created (or left, via some earlier transition) with
    /// `previous_mode == Fullscreen` while already `Fullscreen` must
    /// still leave fullscreen into `Floating` on toggle, the same
    /// fallback `toggle tiling` already had for its own self-loop case.
    #[test]
    fn toggle_fullscreen_falls_back_to_floating_when_previous_mode_is_fullscreen() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();
        let win = crate::window::FcWindow::new(
            Some(8),
            0,
            0,
            100,
            100,
            3,
            0,
            Rectangle::default(),
            crate::display::WindowAttributes { event_mask: 0, border_pixel: 0, override_redirect: false, input_output: true },
            crate::window::Properties::default(),
            Mode::Fullscreen,
        );
        let id = wm.windows.insert(win, wm.config.first_window_number);
        wm.windows.get_mut(id).is_visible = true;
        wm.frames.get_mut(root).window = Some(id);
        wm.windows.get_mut(id).frame = Some(root);
        wm.selected_window = Some(id);

        execute(&mut wm, &mut display, &ActionList(vec![Action::ToggleFullscreen]));

        assert_eq!(wm.windows.get(id).mode, Mode::Floating);
    }

    #[test]
    fn run_action_spawns_through_shell_runner() {
        let (mut wm, mut display) = two_monitor_manager();

        execute(&mut wm, &mut display, &ActionList(vec![Action::Run("xterm".to_string())]));

        let shell: &crate::shell::RecordingShellRunner =
            wm.shell.as_any().downcast_ref().expect("test shell runner");
        assert_eq!(shell.spawned, vec!["xterm".to_string()]);
    }

    #[test]
    fn show_run_action_feeds_captured_output_into_notification() {
        let (mut wm, mut display) = two_monitor_manager();
        wm.shell
            .as_any_mut()
            .downcast_mut::<crate::shell::RecordingShellRunner>()
            .expect("test shell runner")
            .capture_output
            .insert("uptime".to_string(), "up 3 days".to_string());

        execute(&mut wm, &mut display, &ActionList(vec![Action::ShowRun("uptime".to_string())]));

        assert!(wm.notification.is_shown());
        assert_eq!(wm.notification.text, "up 3 days");
    }

    /// `focus child` follows `moved_from_left` rather than always
    /// descending into the first child; `focus parent` records which
    /// side it ascended from so a later `focus child` returns there.
    #[test]
    fn focus_child_follows_moved_from_left_and_focus_parent_updates_it() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();

        // A right-split puts the content-holder on the right (`b`).
        let (left, right) = wm.frames.split(root, SplitDirection::Horizontal, false);
        wm.set_focused_frame(Some(right), &mut display);

        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusParent]));
        assert_eq!(wm.focused_frame, Some(root));
        assert!(!wm.frames.get(root).moved_from_left, "ascending from the right child must clear moved_from_left");

        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusChild]));
        assert_eq!(wm.focused_frame, Some(right));

        wm.set_focused_frame(Some(left), &mut display);
        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusParent]));
        assert!(wm.frames.get(root).moved_from_left, "ascending from the left child must set moved_from_left");
        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusChild]));
        assert_eq!(wm.focused_frame, Some(left));
    }

    #[test]
    fn focus_child_i_descends_multiple_levels() {
        let (mut wm, mut display) = two_monitor_manager();
        let root = wm.focused_frame.unwrap();

        let (inner, _outer) = wm.frames.split(root, SplitDirection::Horizontal, true);
        let (leaf, _) = wm.frames.split(inner, SplitDirection::Vertical, true);

        execute(&mut wm, &mut display, &ActionList(vec![Action::FocusChildI(Int::plain(2))]));

        assert_eq!(wm.focused_frame, Some(leaf));
    }
}
