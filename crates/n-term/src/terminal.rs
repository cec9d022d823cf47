// SPDX-License-Identifier: MIT
//
// TTY backend: raw mode, alternate screen, mouse reporting, and restore.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty,
// poll, read, sigaction and the raw fd write in the panic hook are POSIX
// calls with no safe wrapper in std. Each unsafe block is one call.
#![allow(unsafe_code)]
//
// `TtyBackend::open` saves the original termios, switches stdin to raw
// mode, enters the alternate screen with the cursor hidden and enables SGR
// click reporting. `close` undoes all of it once. If the process panics
// while the terminal is raw, a hook writes the restore sequence straight to
// fd 1 and puts termios back before the default handler prints.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use tracing::debug;

use crate::ansi;
use crate::backend::{Backend, Size};

/// How long `read` waits for input before reporting idle.
const POLL_TIMEOUT_MS: i32 = 50;

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)` on stdout.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size::new(ws.ws_col, ws.ws_row))
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── SIGWINCH ───────────────────────────────────────────────────────────────

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);
static SIGWINCH_INSTALLED: Once = Once::new();

#[cfg(unix)]
fn install_sigwinch_handler() {
    SIGWINCH_INSTALLED.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    });
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Mouse off, colors reset, cursor shown, alternate screen left last.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?1006l\x1b[?1002l\x1b[?1000l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence to fd 1 without taking the stdout lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── TtyBackend ─────────────────────────────────────────────────────────────

/// [`Backend`] over the process's controlling terminal.
///
/// ```no_run
/// use n_term::backend::Backend;
/// use n_term::terminal::TtyBackend;
///
/// let tty = TtyBackend::open()?;
/// let size = tty.window_size()?;
/// tty.write_at(0, 0, format!("{}x{}", size.cols, size.rows).as_bytes())?;
/// tty.close()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct TtyBackend {
    #[cfg(unix)]
    original_termios: Mutex<Option<libc::termios>>,
    closed: AtomicBool,
}

impl TtyBackend {
    /// Take over the terminal.
    ///
    /// Raw mode is skipped when stdin is not a TTY.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be set or the setup sequence
    /// cannot be written.
    pub fn open() -> io::Result<Self> {
        install_panic_hook();
        install_sigwinch_handler();

        let backend = Self {
            #[cfg(unix)]
            original_termios: Mutex::new(None),
            closed: AtomicBool::new(false),
        };
        backend.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::cursor_hide(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        ansi::enable_mouse(&mut lock, ansi::MouseMode::Click)?;
        lock.flush()?;

        debug!(tty = is_tty(), "terminal opened");
        Ok(backend)
    }

    /// Whether [`close`](Backend::close) already ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn emit(&self, f: impl FnOnce(&mut io::StdoutLock<'_>) -> io::Result<()>) -> io::Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        f(&mut lock)?;
        lock.flush()
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&self) -> io::Result<()> {
        if !is_tty() {
            return Ok(());
        }

        let fd = libc::STDIN_FILENO;
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            if let Ok(mut saved) = self.original_termios.lock() {
                *saved = Some(termios);
            }
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_self)]
    fn enable_raw_mode(&self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&self) -> io::Result<()> {
        let original = self.original_termios.lock().ok().and_then(|mut saved| saved.take());
        if let Some(original) = original {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_self)]
    fn disable_raw_mode(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Backend for TtyBackend {
    fn window_size(&self) -> io::Result<Size> {
        get_size().ok_or_else(|| io::Error::other("terminal size unavailable"))
    }

    fn clear(&self) -> io::Result<()> {
        self.emit(|w| ansi::clear_screen(w))
    }

    fn set_cursor(&self, x: u16, y: u16) -> io::Result<()> {
        self.emit(|w| ansi::cursor_to(w, x, y))
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        self.emit(|w| w.write_all(bytes))
    }

    #[cfg(unix)]
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() || buf.is_empty() {
            return Ok(0);
        }

        let fd = libc::STDIN_FILENO;
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
        };
        // Timeout, or EINTR from SIGWINCH.
        if ready <= 0 {
            return Ok(0);
        }

        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n == 0 {
            // EOF: poll reports readable forever, so wait out the window.
            std::thread::sleep(std::time::Duration::from_millis(POLL_TIMEOUT_MS.unsigned_abs().into()));
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(n as usize)
    }

    #[cfg(not(unix))]
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        use std::io::Read;
        if self.is_closed() {
            return Ok(0);
        }
        io::stdin().lock().read(buf)
    }

    fn take_resize(&self) -> bool {
        SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed)
    }

    fn close(&self) -> io::Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::disable_mouse(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        debug!("terminal restored");
        self.disable_raw_mode()
    }
}

impl Drop for TtyBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
