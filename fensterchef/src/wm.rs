//! Connection setup, substructure-redirect acquisition and the main event
//! loop (SPEC_FULL.md §3.F/§3.G).
//!
//! Grounded in `pgwm/src/wm.rs`'s `run_wm`: connect, become the window
//! manager on the root window, initialize state, scan, then alternate
//! `poll_for_event` draining with a `nix::poll`-backed deadline wait. This
//! build has no status bar and no `StateInvalidated`/`FullRestart`
//! distinction (fensterchef reloads configuration in place rather than
//! tearing down and rebuilding dynamic state), so the loop is the
//! teacher's `loop_without_status` generalized to one reconciliation pass
//! (`fensterchef_core::sync::synchronize`) per cycle instead of a redraw.

use std::os::raw::c_int;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fensterchef_core::display::{Display, DisplayEvent};
use fensterchef_core::manager::{events, WindowManager};
use nix::poll::{poll, PollFd, PollFlags};
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt as _, EventMask};
use x11rb::rust_connection::RustConnection;

use crate::cli::Options;
use crate::error::{Error, Result};
use crate::x11_display::X11Display;

/// `SIGALRM` sets this; the main loop checks and clears it once per
/// iteration (spec.md §5 "Signals": the notification timer is advisory,
/// best-effort and only ever nudges the loop to re-check expirations).
static ALARM_RAISED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_alarm(_signum: i32) {
    ALARM_RAISED.store(true, Ordering::SeqCst);
}

fn install_alarm_handler() -> Result<()> {
    // SAFETY: `handle_alarm` only touches an atomic, which is
    // async-signal-safe.
    unsafe {
        nix::sys::signal::sigaction(
            nix::sys::signal::Signal::SIGALRM,
            &nix::sys::signal::SigAction::new(
                nix::sys::signal::SigHandler::Handler(handle_alarm),
                nix::sys::signal::SaFlags::SA_RESTART,
                nix::sys::signal::SigSet::empty(),
            ),
        )
    }?;
    Ok(())
}

/// Claims `SubstructureRedirectMask` on the root window; a `BadAccess`
/// reply means another window manager already holds it (spec.md §5
/// "Startup").
fn become_window_manager(conn: &RustConnection, root: u32) -> Result<()> {
    let aux = ChangeWindowAttributesAux::new().event_mask(
        EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY,
    );
    match conn.change_window_attributes(root, &aux).and_then(|c| c.check()) {
        Ok(()) => Ok(()),
        Err(x11rb::errors::ReplyError::X11Error(err))
            if err.error_kind == x11rb::protocol::ErrorKind::Access =>
        {
            Err(Error::WmAlreadyRunning)
        }
        Err(err) => Err(err.into()),
    }
}

/// Scans pre-existing top-level windows at startup (spec.md §5
/// "Startup"): every already-mapped child of the root is fed through the
/// same `MapRequest` path a freshly-mapped window would take.
fn scan_existing_windows(wm: &mut WindowManager, display: &mut dyn Display) {
    for window in display.query_tree() {
        if display.is_mapped(window) {
            events::dispatch(wm, display, DisplayEvent::MapRequest { window });
        }
    }
}

pub fn run(options: &Options) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(None)?;
    let setup = conn.setup();
    let screen = &setup.roots[screen_num];
    let root = screen.root;

    become_window_manager(&conn, root)?;
    conn.flush()?;

    let _ = conn.randr_select_input(
        root,
        x11rb::protocol::randr::NotifyMask::SCREEN_CHANGE,
    );
    conn.flush()?;

    install_alarm_handler()?;

    let mut display = X11Display::new(&conn, root, screen.root_depth, screen.root_visual);
    let mut wm = WindowManager::new(&mut display, root, Box::new(crate::shell::SystemShell));

    wm.config_path = options.config.clone().or_else(crate::config_path::discover);
    wm.reload_configuration(&mut display);

    events::dispatch(&mut wm, &mut display, DisplayEvent::ScreenChange);
    scan_existing_windows(&mut wm, &mut display);
    fensterchef_core::sync::synchronize(&mut wm, &mut display);

    if let Some(command) = &options.command {
        run_one_shot_command(&mut wm, &mut display, command);
        fensterchef_core::sync::synchronize(&mut wm, &mut display);
        return Ok(());
    }

    schedule_alarm(&wm);

    const DEADLINE: Duration = Duration::from_millis(1000);
    loop {
        conn.flush()?;
        while let Some(event) = display.next_event() {
            events::dispatch(&mut wm, &mut display, event);
        }
        if ALARM_RAISED.swap(false, Ordering::SeqCst) {
            wm.tick(&mut display, now_secs());
            schedule_alarm(&wm);
        }
        fensterchef_core::sync::synchronize(&mut wm, &mut display);
        if wm.should_quit {
            return Ok(());
        }
        wait_for_event(&conn, DEADLINE)?;
        wm.tick(&mut display, now_secs());
    }
}

fn run_one_shot_command(wm: &mut WindowManager, display: &mut dyn Display, command: &str) {
    let base_dir = std::env::temp_dir();
    let mut aliases = std::mem::take(&mut wm.aliases);
    let mut groups = std::mem::take(&mut wm.groups);
    let outcome =
        fensterchef_core::config::parser::parse_config("<command>", command, base_dir, &mut aliases, &mut groups);
    for err in &outcome.errors {
        log::error!("{err}");
    }
    wm.aliases = aliases;
    wm.groups = groups;
    fensterchef_core::config::interpreter::execute(wm, display, &outcome.actions);
}

/// Re-arms `SIGALRM` for the earlier of the notification's expiry and one
/// second from now, so the loop wakes promptly when the notification
/// window needs to be hidden but otherwise idles.
fn schedule_alarm(wm: &WindowManager) {
    let remaining = wm.notification.is_shown().then_some(wm.config.notification_duration_secs).unwrap_or(1).max(1);
    let _ = nix::unistd::alarm::set(remaining as u32);
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn wait_for_event(conn: &RustConnection, deadline: Duration) -> Result<bool> {
    let fd = conn.stream().as_raw_fd();
    let mut poll_fds = [PollFd::new(fd, PollFlags::POLLIN)];
    let start = std::time::Instant::now();
    loop {
        let Some(remaining) = deadline.checked_sub(start.elapsed()) else {
            return Ok(false);
        };
        let timeout_millis = c_int::try_from(remaining.as_millis()).unwrap_or(c_int::MAX);
        match poll(&mut poll_fds, timeout_millis) {
            Ok(_) => {
                if poll_fds[0].revents().unwrap_or_else(PollFlags::empty).contains(PollFlags::POLLIN) {
                    return Ok(true);
                }
            }
            Err(nix::Error::EINTR) => {}
            Err(err) => return Err(err.into()),
        }
        if start.elapsed() >= deadline {
            return Ok(false);
        }
    }
}
