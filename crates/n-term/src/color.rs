// SPDX-License-Identifier: MIT
//
// Cell colors.
//
// Markup speaks in xterm palette indices, where 0 means "whatever the
// terminal's default is". `CellColor` is the compact form the frame buffer
// stores and the ANSI writer encodes.

/// Compact color for terminal cell storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// ANSI 256-color palette index.
    Ansi256(u8),

    /// Terminal default color.
    #[default]
    Default,
}

impl CellColor {
    /// Map a markup color value to a cell color.
    ///
    /// `0` and anything outside `1..=255` select the terminal default.
    #[must_use]
    pub fn from_palette(value: i32) -> Self {
        match u8::try_from(value) {
            Ok(0) | Err(_) => Self::Default,
            Ok(idx) => Self::Ansi256(idx),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
