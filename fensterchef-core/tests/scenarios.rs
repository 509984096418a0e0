//! End-to-end scenarios (spec.md §8) driven through the public
//! `WindowManager` + `RecordingDisplay` seam, the same way the bin
//! crate's real event loop would: parse a configuration source, execute
//! it through the interpreter, dispatch display events, and assert on
//! the resulting frame/window model. Unlike the module-level
//! `#[cfg(test)]` blocks (which exercise `FrameArena`/`Parser` in
//! isolation), these tests go through `WindowManager::new` and
//! `manager::events::dispatch` exactly as `fensterchef/src/wm.rs` does,
//! requiring the `test-util` feature for `RecordingDisplay` (see this
//! crate's `Cargo.toml` dev-dependency).

use fensterchef_core::config::{self, interpreter};
use fensterchef_core::display::{Display, DisplayEvent, RecordingDisplay};
use fensterchef_core::geometry::Rectangle;
use fensterchef_core::manager::{events, WindowManager};
use fensterchef_core::monitor::QueriedOutput;

fn single_monitor(wm: &mut WindowManager, display: &mut dyn Display, w: u32, h: u32) {
    let queried = vec![QueriedOutput { name: "eDP-1".to_string(), rect: Rectangle::new(0, 0, w, h), primary: true }];
    let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
    wm.monitors = merge.monitors;
    let root = wm.monitors.get(wm.monitors.first().unwrap()).root;
    wm.set_focused_frame(Some(root), display);
}

fn run(wm: &mut WindowManager, display: &mut dyn Display, source: &str) {
    let mut aliases = fensterchef_core::config::registry::AliasTable::new();
    let mut groups = fensterchef_core::config::registry::GroupTable::new();
    let outcome = config::parser::parse_config("<test>", source, std::env::temp_dir(), &mut aliases, &mut groups);
    assert!(outcome.errors.is_empty(), "unexpected parse errors: {:?}", outcome.errors);
    interpreter::execute(wm, display, &outcome.actions);
}

/// spec.md §8 scenario 1: on a single 800x600 monitor with zero outer
/// gaps, `split horizontally, split vertically, equalize` must leave
/// exactly the three rectangles the scenario names.
#[test]
fn scenario_1_split_split_equalize() {
    let mut display = RecordingDisplay::new();
    let mut wm = WindowManager::new(&mut display, 1, Box::new(fensterchef_core::shell::RecordingShellRunner::new()));
    wm.config.gaps_outer = Default::default();
    wm.config.gaps_inner = Default::default();
    single_monitor(&mut wm, &mut display, 800, 600);

    run(&mut wm, &mut display, "split horizontally, split vertically, equalize");
    wm.relayout_all();

    let root = wm.monitors.get(wm.monitors.first().unwrap()).root;
    let (left, right) = wm.frames.get(root).children.expect("root should have split");
    let (top, bottom) = wm.frames.get(left).children.expect("left should have split");

    assert_eq!(wm.frames.get(top).rect, Rectangle::new(0, 0, 400, 300));
    assert_eq!(wm.frames.get(bottom).rect, Rectangle::new(0, 300, 400, 300));
    assert_eq!(wm.frames.get(right).rect, Rectangle::new(400, 0, 400, 600));
}

/// spec.md §8 scenario 2: with `Main(0,0,800,600)` and
/// `Right(810,0,800,600)`, focusing the sole leaf of `Main` and running
/// `focus right` must move `focused_frame` onto `Right`'s root.
#[test]
fn scenario_2_focus_right_crosses_monitor() {
    let mut display = RecordingDisplay::new();
    let mut wm = WindowManager::new(&mut display, 1, Box::new(fensterchef_core::shell::RecordingShellRunner::new()));

    let queried = vec![
        QueriedOutput { name: "Main".to_string(), rect: Rectangle::new(0, 0, 800, 600), primary: true },
        QueriedOutput { name: "Right".to_string(), rect: Rectangle::new(810, 0, 800, 600), primary: false },
    ];
    let merge = wm.monitors.merge(queried, &mut wm.frames, wm.config.auto_fill_void);
    wm.monitors = merge.monitors;
    let main = wm.monitors.first().unwrap();
    let main_root = wm.monitors.get(main).root;
    wm.set_focused_frame(Some(main_root), &mut display);

    run(&mut wm, &mut display, "focus right");

    let right = wm.monitors.ids().find(|&id| wm.monitors.get(id).name == "Right").unwrap();
    let right_root = wm.monitors.get(right).root;
    assert_eq!(wm.focused_frame, Some(right_root));
}

/// spec.md §8 scenario 4: `alias mod = Super` then `mod+Shift+q quit`
/// must emit exactly one key binding resolving to `Action::Quit` with
/// no data.
#[test]
fn scenario_4_alias_key_binding_emits_quit() {
    let mut display = RecordingDisplay::new();
    let mut wm = WindowManager::new(&mut display, 1, Box::new(fensterchef_core::shell::RecordingShellRunner::new()));
    // Clear the built-in defaults so only this source's bindings exist.
    wm.key_bindings = fensterchef_core::config::registry::KeyBindingTable::new();

    run(&mut wm, &mut display, "alias mod = Super\nmod+Shift+q quit");

    let bindings: Vec<_> = wm.key_bindings.iter().collect();
    assert_eq!(bindings.len(), 1, "expected exactly one key binding, got {bindings:?}");
    let binding = &bindings[0];
    assert_eq!(binding.actions.iter().collect::<Vec<_>>(), vec![&fensterchef_core::action::Action::Quit]);
}

/// spec.md §3 "`FENSTERCHEF_COMMAND`" + §4.D "Creation": mapping a
/// plain window with no special properties shows and focuses it,
/// attaching it to the focused (void) frame.
#[test]
fn plain_window_map_request_attaches_and_focuses() {
    let mut display = RecordingDisplay::new();
    let mut wm = WindowManager::new(&mut display, 1, Box::new(fensterchef_core::shell::RecordingShellRunner::new()));
    single_monitor(&mut wm, &mut display, 800, 600);

    events::dispatch(&mut wm, &mut display, DisplayEvent::MapRequest { window: 55 });

    let id = wm.window_for_handle(55).expect("window should be managed");
    assert!(wm.windows.get(id).is_visible);
    assert_eq!(wm.windows.focused_window, Some(id));
    let root = wm.monitors.get(wm.monitors.first().unwrap()).root;
    assert_eq!(wm.frames.get(root).window, Some(id));
}

/// spec.md §5 "Relations added or removed during relation execution
/// must not skip or repeat matches": a matching window whose middle
/// relation calls `unrelate` must still run the relation that comes
/// after it (no skip), must not run the unrelated one twice (no
/// repeat), and must leave that relation permanently removed from the
/// registry afterward.
#[test]
fn unrelate_during_iteration_does_not_skip_or_repeat() {
    let mut display = RecordingDisplay::new();
    let mut wm = WindowManager::new(&mut display, 1, Box::new(fensterchef_core::shell::RecordingShellRunner::new()));
    single_monitor(&mut wm, &mut display, 800, 600);

    run(
        &mut wm,
        &mut display,
        "relate \"term\" (gaps inner 1), relate \"term\" (unrelate, gaps inner 2), relate \"term\" (gaps inner 3)",
    );
    assert_eq!(wm.relations.len(), 3);

    let handle = 99;
    display.properties.insert((handle, wm.atoms.wm_class), b"xterm\0term\0".to_vec());
    events::dispatch(&mut wm, &mut display, DisplayEvent::MapRequest { window: handle });

    // All three relations matched and ran in order, so the inner gap
    // ends on the third one's value (2 and 3 must both have run after
    // the middle relation removed itself).
    assert_eq!(
        wm.config.gaps_inner,
        fensterchef_core::geometry::Extents { left: 3, right: 3, top: 3, bottom: 3 }
    );
    assert_eq!(wm.relations.len(), 2, "the unrelate'd relation must be gone afterward");
}
