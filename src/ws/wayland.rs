//! Wayland backend
//!
//! Binds `wl_compositor`, `wl_output` and `wl_shell` (version 1), waits for
//! the output's mode, then creates a toplevel `wl_shell_surface` wrapped in a
//! `wl_egl_window` for EGL.

use std::ffi::c_void;
use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use khronos_egl as egl;
use log::{debug, error, info, warn};
use wayland_client::backend::WaylandError;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::{self, WlOutput};
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_shell::WlShell;
use wayland_client::protocol::wl_shell_surface::{self, WlShellSurface};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{delegate_noop, Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum};
use wayland_egl::WlEglSurface;

use super::{NativeWindow, WindowSystem};

/// Globals and output size collected from the registry
#[derive(Debug, Default)]
struct WaylandState {
    compositor: Option<WlCompositor>,
    shell: Option<WlShell>,
    output: Option<WlOutput>,
    mode: Option<(i32, i32)>,
    mode_is_current: bool,
}

impl WaylandState {
    fn is_ready(&self) -> bool {
        self.compositor.is_some()
            && self.shell.is_some()
            && self.output.is_some()
            && matches!(self.mode, Some((w, h)) if w > 0 && h > 0)
    }

    fn record_mode(&mut self, current: bool, width: i32, height: i32) {
        if current {
            self.mode = Some((width, height));
            self.mode_is_current = true;
        } else if self.mode.is_none() {
            self.mode = Some((width, height));
        }
    }
}

impl Dispatch<WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name, interface, ..
        } = event
        {
            match interface.as_str() {
                "wl_compositor" => {
                    state.compositor = Some(registry.bind(name, 1, qh, ()));
                }
                "wl_output" if state.output.is_none() => {
                    state.output = Some(registry.bind(name, 1, qh, ()));
                }
                "wl_shell" => {
                    state.shell = Some(registry.bind(name, 1, qh, ()));
                }
                _ => return,
            }
            debug!("Wayland: bound {} (name {})", interface, name);
        }
    }
}

impl Dispatch<WlOutput, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &WlOutput,
        event: wl_output::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Mode {
            flags,
            width,
            height,
            ..
        } = event
        {
            let current = matches!(flags, WEnum::Value(f) if f.contains(wl_output::Mode::Current));
            debug!("Wayland: output mode {}x{} (current: {})", width, height, current);
            state.record_mode(current, width, height);
        }
    }
}

impl Dispatch<WlShellSurface, ()> for WaylandState {
    fn event(
        _: &mut Self,
        shell_surface: &WlShellSurface,
        event: wl_shell_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_shell_surface::Event::Ping { serial } = event {
            shell_surface.pong(serial);
        }
    }
}

delegate_noop!(WaylandState: WlCompositor);
delegate_noop!(WaylandState: WlShell);
delegate_noop!(WaylandState: ignore WlSurface);

/// Live connection plus the objects built on it.
///
/// Dropping tears down in reverse order: EGL window, shell surface, surface,
/// then the connection.
struct WaylandSession {
    conn: Connection,
    queue: EventQueue<WaylandState>,
    state: WaylandState,
    surface: Option<WlSurface>,
    shell_surface: Option<WlShellSurface>,
    egl_window: Option<WlEglSurface>,
}

impl WaylandSession {
    fn connect() -> Result<Self> {
        let conn = Connection::connect_to_env().context("Unable to open Wayland display")?;
        let queue = conn.new_event_queue();
        conn.display().get_registry(&queue.handle(), ());
        info!("Connected to Wayland display");

        Ok(Self {
            conn,
            queue,
            state: WaylandState::default(),
            surface: None,
            shell_surface: None,
            egl_window: None,
        })
    }

    /// Dispatch until compositor, shell, output and the output size are known
    fn wait_ready(&mut self, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        while !self.state.is_ready() {
            match deadline {
                None => {
                    self.queue
                        .blocking_dispatch(&mut self.state)
                        .context("Wayland dispatch failed")?;
                }
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        bail!(
                            "Wayland compositor not ready after {:?} (compositor: {}, shell: {}, output: {}, mode: {:?})",
                            timeout.unwrap_or_default(),
                            self.state.compositor.is_some(),
                            self.state.shell.is_some(),
                            self.state.output.is_some(),
                            self.state.mode
                        );
                    }
                    self.read_and_dispatch(remaining)?;
                }
            }
        }
        Ok(())
    }

    /// Flush, read whatever arrives within `timeout`, dispatch queued events
    fn read_and_dispatch(&mut self, timeout: Duration) -> Result<()> {
        flushed(self.queue.flush())?;

        if let Some(guard) = self.queue.prepare_read() {
            let mut pfd = libc::pollfd {
                fd: guard.connection_fd().as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
            let ret = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err).context("poll on Wayland socket failed");
                }
            } else if ret > 0 {
                match guard.read() {
                    Ok(_) => {}
                    Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e).context("Wayland read failed"),
                }
            }
        }

        self.queue
            .dispatch_pending(&mut self.state)
            .context("Wayland dispatch failed")?;
        Ok(())
    }

    fn create_window(&mut self, width: i32, height: i32) -> Result<*const c_void> {
        let qh = self.queue.handle();
        let (compositor, shell) = match (&self.state.compositor, &self.state.shell) {
            (Some(c), Some(s)) => (c, s),
            _ => bail!("Wayland globals missing"),
        };

        let surface = compositor.create_surface(&qh, ());
        let shell_surface = shell.get_shell_surface(&surface, &qh, ());
        shell_surface.set_toplevel();
        self.surface = Some(surface.clone());
        self.shell_surface = Some(shell_surface);

        let egl_window = WlEglSurface::new(surface.id(), width, height).map_err(|e| {
            error!("wl_egl_window_create failed: {}", e);
            anyhow!("wl_egl_window_create failed: {}", e)
        })?;
        let ptr = egl_window.ptr();
        self.egl_window = Some(egl_window);

        flushed(self.queue.flush())?;
        Ok(ptr)
    }

    fn display_ptr(&self) -> *mut c_void {
        self.conn.backend().display_ptr() as *mut c_void
    }
}

/// A full socket buffer leaves requests queued for the next flush
fn flushed(result: Result<(), WaylandError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
            debug!("Wayland socket full, flush deferred");
            Ok(())
        }
        Err(e) => Err(e).context("Wayland flush failed"),
    }
}

impl Drop for WaylandSession {
    fn drop(&mut self) {
        self.egl_window = None;
        self.shell_surface = None;
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
        let _ = self.conn.flush();
        debug!("Wayland session closed");
    }
}

pub struct WaylandWindowSystem {
    readiness_timeout: Option<Duration>,
    session: Option<WaylandSession>,
}

impl WaylandWindowSystem {
    /// `readiness_timeout` of `None` waits for the compositor indefinitely
    pub fn new(readiness_timeout: Option<Duration>) -> Self {
        Self {
            readiness_timeout,
            session: None,
        }
    }
}

impl WindowSystem for WaylandWindowSystem {
    fn name(&self) -> &'static str {
        "wayland"
    }

    fn create(&mut self, width: u32, height: u32, depth: u32) -> Result<NativeWindow> {
        if self.session.is_some() {
            warn!("Wayland window already created, recreating");
            self.destroy();
        }

        // Session drop rolls back anything built before a failure
        let mut session = WaylandSession::connect()?;
        session.wait_ready(self.readiness_timeout)?;

        let (out_w, out_h) = session.state.mode.unwrap_or_default();
        let width = if width == 0 { out_w } else { width as i32 };
        let height = if height == 0 { out_h } else { height as i32 };
        info!(
            "Wayland output {}x{} ({} mode), window {}x{}",
            out_w,
            out_h,
            if session.state.mode_is_current { "current" } else { "first" },
            width,
            height
        );

        let window = session.create_window(width, height)?;
        let display = session.display_ptr();
        self.session = Some(session);

        Ok(NativeWindow {
            display,
            window: window as egl::NativeWindowType,
            width: width as u32,
            height: height as u32,
            depth,
        })
    }

    fn destroy(&mut self) {
        self.session = None;
    }

    fn step(&mut self) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.read_and_dispatch(Duration::ZERO),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_mode_wins() {
        let mut state = WaylandState::default();
        state.record_mode(false, 640, 480);
        state.record_mode(false, 800, 600);
        assert_eq!(state.mode, Some((640, 480)));
        state.record_mode(true, 1920, 1080);
        state.record_mode(false, 1024, 768);
        assert_eq!(state.mode, Some((1920, 1080)));
        assert!(state.mode_is_current);
    }

    #[test]
    fn test_not_ready_without_globals() {
        let mut state = WaylandState::default();
        state.record_mode(true, 1280, 720);
        assert!(!state.is_ready());
    }

    #[test]
    fn test_full_socket_is_not_a_flush_failure() {
        let full = WaylandError::Io(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(flushed(Err(full)).is_ok());
        assert!(flushed(Ok(())).is_ok());

        let gone = WaylandError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        let err = flushed(Err(gone)).unwrap_err();
        assert!(format!("{:#}", err).contains("Wayland flush failed"));
    }

    #[test]
    fn test_destroy_without_session_is_noop() {
        let mut ws = WaylandWindowSystem::new(Some(Duration::from_millis(10)));
        ws.destroy();
        ws.destroy();
        assert!(ws.step().is_ok());
    }
}
