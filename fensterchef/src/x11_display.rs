//! The `x11rb`-backed implementation of `fensterchef_core::display::Display`
//! (SPEC_FULL.md §3.F).
//!
//! Grounded in `pgwm/src/x11/call_wrapper.rs`: a single wrapper type sits
//! between window-manager logic and the connection, every server-facing
//! operation goes through one of its methods, and atoms are interned once
//! and cached by name. This module is the trait-implementing analogue,
//! generalized so `fensterchef-core` itself never names `x11rb`.

use std::collections::HashMap;

use fensterchef_core::display::{
    AtomId, Display, DisplayEvent, OutputInfo, WindowAttributes, WindowGeometry, WindowHandle,
};
use fensterchef_core::geometry::Rectangle;
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{
    self, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent, ConfigureWindowAux,
    ConnectionExt as _, CreateWindowAux, EventMask, GrabMode, InputFocus, MapState, PropMode,
    StackMode, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::{CURRENT_TIME, NONE};

pub struct X11Display<'c> {
    conn: &'c RustConnection,
    root: WindowHandle,
    screen_depth: u8,
    visual: u32,
    atoms_by_name: HashMap<String, AtomId>,
}

impl<'c> X11Display<'c> {
    #[must_use]
    pub fn new(conn: &'c RustConnection, root: WindowHandle, screen_depth: u8, visual: u32) -> Self {
        X11Display { conn, root, screen_depth, visual, atoms_by_name: HashMap::new() }
    }

    fn convert_event(&mut self, event: Event) -> Option<DisplayEvent> {
        match event {
            Event::KeyPress(e) => Some(DisplayEvent::KeyPress {
                window: e.event,
                keycode: e.detail,
                modifiers: u32::from(u16::from(e.state)),
            }),
            Event::KeyRelease(e) => Some(DisplayEvent::KeyRelease {
                window: e.event,
                keycode: e.detail,
                modifiers: u32::from(u16::from(e.state)),
            }),
            Event::ButtonPress(e) => Some(DisplayEvent::ButtonPress {
                window: e.event,
                button: e.detail,
                modifiers: u32::from(u16::from(e.state)),
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            Event::ButtonRelease(e) => Some(DisplayEvent::ButtonRelease {
                window: e.event,
                button: e.detail,
                modifiers: u32::from(u16::from(e.state)),
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            Event::MotionNotify(e) => {
                Some(DisplayEvent::Motion { root_x: i32::from(e.root_x), root_y: i32::from(e.root_y) })
            }
            Event::MapRequest(e) => Some(DisplayEvent::MapRequest { window: e.window }),
            Event::ConfigureRequest(e) => Some(DisplayEvent::ConfigureRequest {
                window: e.window,
                rect: Rectangle::new(i32::from(e.x), i32::from(e.y), u32::from(e.width), u32::from(e.height)),
                border_width: u32::from(e.border_width),
            }),
            Event::UnmapNotify(e) => Some(DisplayEvent::UnmapNotify { window: e.window }),
            Event::DestroyNotify(e) => Some(DisplayEvent::DestroyNotify { window: e.window }),
            Event::PropertyNotify(e) => Some(DisplayEvent::PropertyNotify { window: e.window, atom: e.atom }),
            Event::ClientMessage(e) => {
                Some(DisplayEvent::ClientMessage { window: e.window, message_type: e.type_, data: e.data.as_data32() })
            }
            Event::MappingNotify(_) => Some(DisplayEvent::XkbMapNotify),
            Event::RandrScreenChangeNotify(_) => Some(DisplayEvent::ScreenChange),
            _ => None,
        }
    }
}

impl Display for X11Display<'_> {
    fn query_outputs(&mut self) -> Vec<OutputInfo> {
        let reply = match self.conn.randr_get_monitors(self.root, true).and_then(|c| c.reply()) {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("RandR get_monitors failed, falling back to a single monitor: {err}");
                let geom = self.conn.get_geometry(self.root).and_then(|c| c.reply());
                return match geom {
                    Ok(g) => vec![OutputInfo {
                        name: "default".to_string(),
                        rect: Rectangle::new(0, 0, u32::from(g.width), u32::from(g.height)),
                        primary: true,
                    }],
                    Err(err) => {
                        log::error!("get_geometry also failed: {err}");
                        Vec::new()
                    }
                };
            }
        };
        reply
            .monitors
            .into_iter()
            .map(|m| {
                let name = self
                    .conn
                    .get_atom_name(m.name)
                    .and_then(|c| c.reply())
                    .map(|r| String::from_utf8_lossy(&r.name).into_owned())
                    .unwrap_or_else(|_| format!("output-{}", m.name));
                OutputInfo {
                    name,
                    rect: Rectangle::new(i32::from(m.x), i32::from(m.y), u32::from(m.width), u32::from(m.height)),
                    primary: m.primary,
                }
            })
            .collect()
    }

    fn query_attributes(&mut self, window: WindowHandle) -> WindowAttributes {
        match self.conn.get_window_attributes(window).and_then(|c| c.reply()) {
            Ok(reply) => WindowAttributes {
                event_mask: u32::from(reply.your_event_mask),
                border_pixel: 0,
                override_redirect: reply.override_redirect,
                input_output: reply.class == WindowClass::INPUT_OUTPUT,
            },
            Err(err) => {
                log::debug!("get_window_attributes({window}) failed: {err}");
                WindowAttributes { event_mask: 0, border_pixel: 0, override_redirect: false, input_output: true }
            }
        }
    }

    fn is_mapped(&mut self, window: WindowHandle) -> bool {
        self.conn
            .get_window_attributes(window)
            .and_then(|c| c.reply())
            .map(|r| r.map_state == MapState::VIEWABLE)
            .unwrap_or(false)
    }

    fn create_window(&mut self, geometry: WindowGeometry, attributes: WindowAttributes) -> WindowHandle {
        let Ok(id) = self.conn.generate_id() else {
            log::error!("failed to allocate a window id");
            return 0;
        };
        let aux = CreateWindowAux::new()
            .event_mask(attributes.event_mask)
            .border_pixel(attributes.border_pixel)
            .override_redirect(if attributes.override_redirect { 1 } else { 0 });
        let class = if attributes.input_output { WindowClass::INPUT_OUTPUT } else { WindowClass::INPUT_ONLY };
        if let Err(err) = self.conn.create_window(
            self.screen_depth,
            id,
            self.root,
            geometry.rect.x as i16,
            geometry.rect.y as i16,
            geometry.rect.w as u16,
            geometry.rect.h as u16,
            geometry.border_width as u16,
            class,
            self.visual,
            &aux,
        ) {
            log::error!("create_window failed: {err}");
        }
        id
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        let _ = self.conn.destroy_window(window);
    }

    fn map_window(&mut self, window: WindowHandle) {
        let _ = self.conn.map_window(window);
    }

    fn unmap_window(&mut self, window: WindowHandle) {
        let _ = self.conn.unmap_window(window);
    }

    fn configure_window(&mut self, window: WindowHandle, geometry: WindowGeometry) {
        let aux = ConfigureWindowAux::new()
            .x(geometry.rect.x)
            .y(geometry.rect.y)
            .width(geometry.rect.w)
            .height(geometry.rect.h)
            .border_width(geometry.border_width);
        if let Err(err) = self.conn.configure_window(window, &aux) {
            log::debug!("configure_window({window}) failed: {err}");
        }
    }

    fn change_attributes(&mut self, window: WindowHandle, attributes: WindowAttributes) {
        let aux = ChangeWindowAttributesAux::new()
            .event_mask(attributes.event_mask)
            .border_pixel(attributes.border_pixel)
            .override_redirect(if attributes.override_redirect { 1 } else { 0 });
        if let Err(err) = self.conn.change_window_attributes(window, &aux) {
            log::debug!("change_window_attributes({window}) failed: {err}");
        }
    }

    fn set_cursor(&mut self, _window: WindowHandle, cursor_name: &str) {
        // Cursor themes are out of scope (spec.md §1); the facade still
        // exposes the hook so action handlers (`cursor moving`, ...) have
        // somewhere to call, but this build leaves the root cursor as
        // whatever the server default is.
        log::trace!("set_cursor requested ({cursor_name}) -- cursor themes are out of scope");
    }

    fn grab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32) {
        let _ = self.conn.grab_key(
            true,
            window,
            modifiers as u16,
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        );
    }

    fn ungrab_key(&mut self, window: WindowHandle, keycode: u8, modifiers: u32) {
        let _ = self.conn.ungrab_key(keycode, window, modifiers as u16);
    }

    fn grab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32) {
        let _ = self.conn.grab_button(
            true,
            window,
            u32::from(
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION,
            ) as u16,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            0u32,
            0u32,
            button,
            modifiers as u16,
        );
    }

    fn ungrab_button(&mut self, window: WindowHandle, button: u8, modifiers: u32) {
        let _ = self.conn.ungrab_button(button, window, modifiers as u16);
    }

    fn set_input_focus(&mut self, window: WindowHandle) {
        let _ = self.conn.set_input_focus(InputFocus::PARENT, window, CURRENT_TIME);
    }

    fn raise_window(&mut self, window: WindowHandle) {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        let _ = self.conn.configure_window(window, &aux);
    }

    fn restack(&mut self, order_bottom_to_top: &[WindowHandle]) {
        let mut prev: Option<WindowHandle> = None;
        for &window in order_bottom_to_top {
            let aux = match prev {
                Some(sibling) => ConfigureWindowAux::new().sibling(sibling).stack_mode(StackMode::ABOVE),
                None => ConfigureWindowAux::new().stack_mode(StackMode::BELOW),
            };
            if let Err(err) = self.conn.configure_window(window, &aux) {
                log::debug!("restack configure_window({window}) failed: {err}");
            }
            prev = Some(window);
        }
    }

    fn query_tree(&mut self) -> Vec<WindowHandle> {
        self.conn
            .query_tree(self.root)
            .and_then(|c| c.reply())
            .map(|r| r.children)
            .unwrap_or_default()
    }

    fn keysym_to_keycode(&mut self, keysym: u32) -> Option<u8> {
        let setup = self.conn.setup();
        let lo = setup.min_keycode;
        let hi = setup.max_keycode;
        let count = hi.saturating_sub(lo).saturating_add(1);
        let mapping = self.conn.get_keyboard_mapping(lo, count).ok()?.reply().ok()?;
        let per = mapping.keysyms_per_keycode as usize;
        if per == 0 {
            return None;
        }
        for (row, chunk) in mapping.keysyms.chunks(per).enumerate() {
            if chunk.contains(&keysym) {
                return Some(lo.wrapping_add(row as u8));
            }
        }
        None
    }

    fn intern_atom(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.atoms_by_name.get(name) {
            return id;
        }
        let id = match self.conn.intern_atom(false, name.as_bytes()).and_then(|c| c.reply()) {
            Ok(reply) => reply.atom,
            Err(err) => {
                log::error!("intern_atom({name}) failed: {err}");
                NONE
            }
        };
        self.atoms_by_name.insert(name.to_string(), id);
        id
    }

    fn get_property(&mut self, window: WindowHandle, atom: AtomId) -> Option<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, atom, xproto::AtomEnum::ANY, 0, u32::MAX / 4)
            .ok()?
            .reply()
            .ok()?;
        if reply.type_ == NONE {
            return None;
        }
        Some(reply.value)
    }

    fn set_property(&mut self, window: WindowHandle, atom: AtomId, data: &[u8]) {
        let result = if data.len() % 4 == 0 {
            let words: Vec<u32> =
                data.chunks_exact(4).map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect();
            self.conn.change_property32(PropMode::REPLACE, window, atom, xproto::AtomEnum::CARDINAL, &words)
        } else {
            self.conn.change_property8(PropMode::REPLACE, window, atom, xproto::AtomEnum::STRING, data)
        };
        if let Err(err) = result {
            log::debug!("set_property({window}, {atom}) failed: {err}");
        }
    }

    fn delete_property(&mut self, window: WindowHandle, atom: AtomId) {
        let _ = self.conn.delete_property(window, atom);
    }

    fn send_client_message(&mut self, window: WindowHandle, message_type: AtomId, data: [u32; 5]) {
        let event = ClientMessageEvent::new(32, window, message_type, ClientMessageData::from(data));
        if let Err(err) = self.conn.send_event(false, window, EventMask::NO_EVENT, event) {
            log::debug!("send_client_message({window}) failed: {err}");
        }
    }

    fn next_event(&mut self) -> Option<DisplayEvent> {
        loop {
            let event = match self.conn.poll_for_event() {
                Ok(Some(event)) => event,
                Ok(None) => return None,
                Err(err) => {
                    log::error!("poll_for_event failed: {err}");
                    return None;
                }
            };
            if let Some(converted) = self.convert_event(event) {
                return Some(converted);
            }
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.conn.flush() {
            log::error!("flush failed: {err}");
        }
    }
}
