// SPDX-License-Identifier: MIT
//
// Input events.
//
// Decoded terminal input: keystrokes, mouse reports and window resizes.
// Keys that arrive as a single byte stay bytes (`Key::Byte`) so callers can
// match on `b'q'` or `b'\r'` directly. Everything with a name goes through
// `SpecialKey`.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const CTRL  = 0b010;
        const ALT   = 0b100;
    }
}

/// A parsed terminal input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Keyboard(KeyboardEvent),
    Mouse(MouseEvent),
    /// The terminal window changed size.
    Resize { width: u16, height: u16 },
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A single-byte key: ASCII printable, `\r`, `\t`, or the letter of a
    /// Ctrl chord.
    Byte(u8),
    /// A non-ASCII character decoded from UTF-8.
    Char(char),
    Special(SpecialKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Backspace,
    Escape,
    BackTab,
    /// F1 through F12.
    F(u8),
}

impl From<SpecialKey> for Key {
    fn from(key: SpecialKey) -> Self {
        Self::Special(key)
    }
}

impl From<u8> for Key {
    fn from(byte: u8) -> Self {
        Self::Byte(byte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Whether this is `key` with at least the modifiers in `mods` held.
    #[must_use]
    pub fn is(&self, key: impl Into<Key>, mods: Modifiers) -> bool {
        self.key == key.into() && self.modifiers.contains(mods)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// No button: release or bare motion.
    None,
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// 0-indexed column.
    pub x: u16,
    /// 0-indexed row.
    pub y: u16,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
