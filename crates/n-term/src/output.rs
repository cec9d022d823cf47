// SPDX-License-Identifier: MIT
//
// Output buffering and stateful glyph rendering.
//
//   OutputBuffer: collects a whole flush worth of bytes so a render tick
//   reaches the backend as one write.
//
//   CellWriter: remembers the cursor position and the last colors it
//   emitted, and only writes the escapes that change something. A run of
//   same-colored glyphs on one row becomes a single cursor move followed by
//   plain characters.

use std::io::{self, Write};

use crate::ansi;
use crate::color::CellColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer accumulated in memory and handed over in one piece.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `ch` as UTF-8.
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Take the accumulated bytes out, leaving the buffer empty.
    #[must_use]
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.buf, Vec::with_capacity(DEFAULT_CAPACITY))
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Glyph renderer that skips escapes the terminal state already satisfies.
///
/// - **Cursor**: skipped when the glyph sits at `(last_x + 1, last_y)`.
/// - **Colors**: skipped when unchanged since the last emit.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_fg: Option<CellColor>,
    last_bg: Option<CellColor>,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
        }
    }

    /// Forget all tracked state. Call after a clear or reset.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Render one glyph at `(x, y)`.
    pub fn render(&mut self, out: &mut OutputBuffer, x: u16, y: u16, ch: char, fg: CellColor, bg: CellColor) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        if self.last_fg != Some(fg) {
            ansi::fg(out, fg).ok();
            self.last_fg = Some(fg);
        }
        if self.last_bg != Some(bg) {
            ansi::bg(out, bg).ok();
            self.last_bg = Some(bg);
        }

        out.write_char(ch);
        self.last_x = xi;
        self.last_y = yi;
    }

    /// End a flush with an SGR reset so nothing leaks into later output.
    pub fn finish(&mut self, out: &mut OutputBuffer) {
        if self.last_fg.is_some() || self.last_bg.is_some() {
            ansi::reset(out).ok();
        }
        self.last_fg = None;
        self.last_bg = None;
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
