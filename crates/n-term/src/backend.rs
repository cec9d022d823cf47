// SPDX-License-Identifier: MIT
//
// The terminal seam.
//
// The engine never talks to a file descriptor directly. It holds an
// `Arc<dyn Backend>` and drives it from three threads at once: the input
// watcher reads, the render worker writes, and `exit` closes. Every method
// therefore takes `&self` and implementations bring their own interior
// synchronization.
//
// `HeadlessBackend` is the in-memory implementation used by tests: scripted
// input chunks in, a byte log of everything written out.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Backend ────────────────────────────────────────────────────────────────

/// Raw terminal I/O shared between the engine's workers.
pub trait Backend: Send + Sync {
    /// Current size of the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn window_size(&self) -> io::Result<Size>;

    /// Clear the whole screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn clear(&self) -> io::Result<()>;

    /// Move the cursor to the 0-indexed cell `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set_cursor(&self, x: u16, y: u16) -> io::Result<()>;

    /// Write `bytes` starting at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_at(&self, x: u16, y: u16, bytes: &[u8]) -> io::Result<()> {
        let mut buf = Vec::with_capacity(bytes.len() + 12);
        ansi::cursor_to(&mut buf, x, y)?;
        buf.extend_from_slice(bytes);
        self.write(&buf)
    }

    /// Write `bytes` at the current cursor position.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Read available input into `buf`, waiting at most one poll window.
    ///
    /// `Ok(0)` means the window passed with nothing to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Whether the window was resized since the last call.
    fn take_resize(&self) -> bool;

    /// Restore the terminal. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if restoring terminal state fails.
    fn close(&self) -> io::Result<()>;
}

// ─── HeadlessBackend ────────────────────────────────────────────────────────

/// How long an idle headless read waits, standing in for a poll window.
const HEADLESS_IDLE: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct HeadlessState {
    size: Size,
    input: VecDeque<Vec<u8>>,
    output: Vec<u8>,
    writes: usize,
    clears: usize,
    resized: bool,
    closed: bool,
}

/// In-memory backend: scripted input, recorded output.
#[derive(Debug)]
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
}

impl HeadlessBackend {
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                size,
                input: VecDeque::new(),
                output: Vec::new(),
                writes: 0,
                clears: 0,
                resized: false,
                closed: false,
            }),
        }
    }

    /// Queue a chunk to be returned by a later `read`.
    pub fn push_input(&self, bytes: &[u8]) {
        self.state.lock().input.push_back(bytes.to_vec());
    }

    /// Change the reported size and raise the resize flag.
    pub fn resize(&self, size: Size) {
        let mut state = self.state.lock();
        state.size = size;
        state.resized = true;
    }

    /// Everything written so far.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.state.lock().output.clone()
    }

    /// Everything written so far, leaving the log empty.
    #[must_use]
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().output)
    }

    /// Number of `write`/`write_at` calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether scripted input is still waiting to be read.
    #[must_use]
    pub fn has_input(&self) -> bool {
        !self.state.lock().input.is_empty()
    }
}

impl Backend for HeadlessBackend {
    fn window_size(&self) -> io::Result<Size> {
        Ok(self.state.lock().size)
    }

    fn clear(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.clears += 1;
        ansi::clear_screen(&mut state.output)
    }

    fn set_cursor(&self, x: u16, y: u16) -> io::Result<()> {
        ansi::cursor_to(&mut self.state.lock().output, x, y)
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        state.writes += 1;
        state.output.extend_from_slice(bytes);
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = {
            let mut state = self.state.lock();
            if state.closed { None } else { state.input.pop_front() }
        };

        let Some(mut chunk) = chunk else {
            thread::sleep(HEADLESS_IDLE);
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.state.lock().input.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn take_resize(&self) -> bool {
        std::mem::take(&mut self.state.lock().resized)
    }

    fn close(&self) -> io::Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headless() -> HeadlessBackend {
        HeadlessBackend::new(Size::new(30, 10))
    }

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_area() {
        assert_eq!(Size::new(80, 24).area(), 1920);
        assert_eq!(Size::new(0, 24).area(), 0);
    }

    // ── Output ────────────────────────────────────────────────────────

    #[test]
    fn writes_are_logged_and_counted() {
        let b = headless();
        b.write(b"ab").unwrap();
        b.write(b"c").unwrap();
        assert_eq!(b.output(), b"abc");
        assert_eq!(b.write_count(), 2);
    }

    #[test]
    fn write_at_positions_first() {
        let b = headless();
        b.write_at(2, 1, b"x").unwrap();
        assert_eq!(b.output(), b"\x1b[2;3Hx");
    }

    #[test]
    fn clear_is_counted() {
        let b = headless();
        b.clear().unwrap();
        assert_eq!(b.clear_count(), 1);
        assert_eq!(b.take_output(), b"\x1b[2J\x1b[H");
        assert!(b.output().is_empty());
    }

    // ── Input ─────────────────────────────────────────────────────────

    #[test]
    fn read_returns_scripted_chunks_in_order() {
        let b = headless();
        b.push_input(b"q");
        b.push_input(b"\x1b[A");
        let mut buf = [0u8; 16];
        assert_eq!(b.read(&mut buf).unwrap(), 1);
        assert_eq!(&buf[..1], b"q");
        assert_eq!(b.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"\x1b[A");
        assert_eq!(b.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn read_splits_chunks_larger_than_buffer() {
        let b = headless();
        b.push_input(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(b.read(&mut buf).unwrap(), 4);
        assert!(b.has_input());
        assert_eq!(b.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn closed_backend_reads_nothing() {
        let b = headless();
        b.push_input(b"q");
        b.close().unwrap();
        b.close().unwrap();
        assert!(b.is_closed());
        let mut buf = [0u8; 4];
        assert_eq!(b.read(&mut buf).unwrap(), 0);
    }

    // ── Resize ────────────────────────────────────────────────────────

    #[test]
    fn resize_flag_is_taken_once() {
        let b = headless();
        assert!(!b.take_resize());
        b.resize(Size::new(50, 20));
        assert_eq!(b.window_size().unwrap(), Size::new(50, 20));
        assert!(b.take_resize());
        assert!(!b.take_resize());
    }
}
