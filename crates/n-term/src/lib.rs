// SPDX-License-Identifier: MIT
//
// n-term: terminal layer for n-tui.
//
// Everything that touches the terminal lives here: the `Backend` seam the
// engine writes through (a raw-mode TTY implementation and an in-memory one
// for tests), the escape-sequence decoder that turns input bytes into typed
// events, and the stateful glyph writer that keeps flushes short by skipping
// escapes the terminal state already satisfies.
//
// Direct ANSI and termios, no TUI framework underneath.

pub mod ansi;
pub mod backend;
pub mod color;
pub mod decoder;
pub mod event;
pub mod output;
pub mod terminal;

pub use backend::{Backend, HeadlessBackend, Size};
pub use color::CellColor;
pub use decoder::{Decoder, EscapeDecoder};
pub use event::{Event, Key, KeyboardEvent, Modifiers, MouseButton, MouseEvent, SpecialKey};
pub use output::{CellWriter, OutputBuffer};
pub use terminal::TtyBackend;
