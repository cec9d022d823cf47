// SPDX-License-Identifier: MIT
//
// Escape-sequence decoder.
//
// Turns raw terminal bytes into `Event`s. Covered encodings:
//
// - single bytes: printable ASCII, Enter, Tab, Backspace, Ctrl chords
// - Alt chords (ESC followed by a key)
// - legacy CSI keys with xterm modifier parameters (`CSI 1;5A`, `CSI 3;2~`)
// - SS3 arrows and F1–F4
// - SGR mouse reports (`CSI < b;x;y M` / `m`)
// - UTF-8 multi-byte characters
//
// Sequences may be split across reads, so the decoder keeps the unconsumed
// tail between calls. A lone ESC is held until `flush`, which the input
// watcher calls once a read window passes with no new bytes.

use tracing::trace;

use crate::event::{Event, Key, KeyboardEvent, Modifiers, MouseButton, MouseEvent, SpecialKey};

/// Stateful bytes-to-events translation.
pub trait Decoder: Send {
    /// Feed `bytes` and return every event that is now complete.
    fn decode(&mut self, bytes: &[u8]) -> Vec<Event>;

    /// Whether bytes are held waiting for the rest of a sequence.
    fn has_pending(&self) -> bool;

    /// Give up waiting and emit held bytes as literal keys.
    fn flush(&mut self) -> Vec<Event>;
}

/// The default [`Decoder`] for xterm-compatible terminals.
#[derive(Debug, Default)]
pub struct EscapeDecoder {
    buf: Vec<u8>,
}

impl EscapeDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }
}

impl Decoder for EscapeDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match try_parse(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => {
                    trace!(bytes = ?self.buf.get(pos..pos + n), "unrecognized input skipped");
                    pos += n;
                }
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        events
    }

    fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    fn flush(&mut self) -> Vec<Event> {
        let events = self
            .buf
            .iter()
            .filter_map(|&byte| match byte {
                0x1B => Some(special(SpecialKey::Escape, Modifiers::empty())),
                b => match single_byte(b) {
                    Parsed::Event(event, _) => Some(event),
                    _ => None,
                },
            })
            .collect();
        self.buf.clear();
        events
    }
}

// ─── Stateless parsing ──────────────────────────────────────────────────────

enum Parsed {
    /// An event and the number of bytes it used.
    Event(Event, usize),
    /// Need more bytes.
    Incomplete,
    /// Unrecognized input, drop this many bytes.
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        0xC0..=0xFF => parse_utf8(buf),
        b => single_byte(b),
    }
}

fn single_byte(b: u8) -> Parsed {
    let event = match b {
        0x0A | 0x0D => byte_key(b'\r', Modifiers::empty()),
        0x09 => byte_key(b'\t', Modifiers::empty()),
        0x08 | 0x7F => special(SpecialKey::Backspace, Modifiers::empty()),
        0x00 => byte_key(b' ', Modifiers::CTRL),
        0x01..=0x1A => byte_key(b + b'a' - 1, Modifiers::CTRL),
        0x1C..=0x1F => byte_key(b + 0x40, Modifiers::CTRL),
        0x20..=0x7E => byte_key(b, Modifiers::empty()),
        _ => return Parsed::Skip(1),
    };
    Parsed::Event(event, 1)
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        0x1B => Parsed::Event(special(SpecialKey::Escape, Modifiers::ALT), 2),
        b @ 0x20..=0x7E => Parsed::Event(byte_key(b, Modifiers::ALT), 2),
        b @ 0x01..=0x1A if b != 0x09 && b != 0x0D => {
            Parsed::Event(byte_key(b + b'a' - 1, Modifiers::ALT | Modifiers::CTRL), 2)
        }
        _ => Parsed::Event(special(SpecialKey::Escape, Modifiers::empty()), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }
    if buf[2] == b'<' {
        return parse_sgr_mouse(buf);
    }

    // Parameter bytes 0x30..=0x3F, intermediates 0x20..=0x2F, then a final
    // byte in 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params = parse_params(&buf[2..end]);
    let consumed = end + 1;
    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    let key = if final_byte == b'~' {
        match params.first().copied().unwrap_or(0) {
            1 | 7 => SpecialKey::Home,
            2 => SpecialKey::Insert,
            3 => SpecialKey::Delete,
            4 | 8 => SpecialKey::End,
            5 => SpecialKey::PageUp,
            6 => SpecialKey::PageDown,
            15 => SpecialKey::F(5),
            17 => SpecialKey::F(6),
            18 => SpecialKey::F(7),
            19 => SpecialKey::F(8),
            20 => SpecialKey::F(9),
            21 => SpecialKey::F(10),
            23 => SpecialKey::F(11),
            24 => SpecialKey::F(12),
            _ => return Parsed::Skip(consumed),
        }
    } else {
        match final_byte {
            b'A' => SpecialKey::Up,
            b'B' => SpecialKey::Down,
            b'C' => SpecialKey::Right,
            b'D' => SpecialKey::Left,
            b'H' => SpecialKey::Home,
            b'F' => SpecialKey::End,
            b'P' => SpecialKey::F(1),
            b'Q' => SpecialKey::F(2),
            b'R' => SpecialKey::F(3),
            b'S' => SpecialKey::F(4),
            b'Z' => return Parsed::Event(special(SpecialKey::BackTab, Modifiers::SHIFT), consumed),
            _ => return Parsed::Skip(consumed),
        }
    };

    Parsed::Event(special(key, modifiers), consumed)
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }
    let key = match buf[2] {
        b'A' => SpecialKey::Up,
        b'B' => SpecialKey::Down,
        b'C' => SpecialKey::Right,
        b'D' => SpecialKey::Left,
        b'H' => SpecialKey::Home,
        b'F' => SpecialKey::End,
        b'P' => SpecialKey::F(1),
        b'Q' => SpecialKey::F(2),
        b'R' => SpecialKey::F(3),
        b'S' => SpecialKey::F(4),
        _ => return Parsed::Skip(3),
    };
    Parsed::Event(special(key, Modifiers::empty()), 3)
}

// ── SGR mouse ───────────────────────────────────────────────────────────────

fn parse_sgr_mouse(buf: &[u8]) -> Parsed {
    let start = 3;
    let mut end = start;
    while end < buf.len() {
        match buf[end] {
            b'M' | b'm' => break,
            b if b.is_ascii_digit() || b == b';' => end += 1,
            _ => return Parsed::Skip(end + 1),
        }
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let is_release = buf[end] == b'm';
    let params = parse_params(&buf[start..end]);
    let [cb, raw_x, raw_y] = match params.as_slice() {
        &[cb, x, y] => [cb, x, y],
        _ => return Parsed::Skip(end + 1),
    };

    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let base = cb & 3;
    let button = if cb & 64 != 0 {
        if base == 0 { MouseButton::WheelUp } else { MouseButton::WheelDown }
    } else if is_release {
        MouseButton::None
    } else {
        match base {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        }
    };

    Parsed::Event(
        Event::Mouse(MouseEvent {
            x: raw_x.saturating_sub(1),
            y: raw_y.saturating_sub(1),
            button,
            modifiers,
        }),
        end + 1,
    )
}

// ── UTF-8 ──────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Parsed::Skip(1),
    };
    if buf.len() < expected {
        return Parsed::Incomplete;
    }
    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            Parsed::Event(
                Event::Keyboard(KeyboardEvent::new(Key::Char(ch), Modifiers::empty())),
                expected,
            )
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn byte_key(b: u8, modifiers: Modifiers) -> Event {
    Event::Keyboard(KeyboardEvent::new(Key::Byte(b), modifiers))
}

const fn special(key: SpecialKey, modifiers: Modifiers) -> Event {
    Event::Keyboard(KeyboardEvent::new(Key::Special(key), modifiers))
}

/// Semicolon-separated decimal parameters. Missing numbers read as 0.
fn parse_params(raw: &[u8]) -> Vec<u16> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == b';')
        .map(|part| {
            part.iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, &b| acc.saturating_mul(10).saturating_add(u16::from(b - b'0')))
        })
        .collect()
}

/// xterm modifier parameter: `1 + bitmask` with shift=1, alt=2, ctrl=4.
const fn decode_modifiers(param: u16) -> Modifiers {
    let bits = param.saturating_sub(1);
    let mut out = Modifiers::empty();
    if bits & 1 != 0 {
        out = out.union(Modifiers::SHIFT);
    }
    if bits & 2 != 0 {
        out = out.union(Modifiers::ALT);
    }
    if bits & 4 != 0 {
        out = out.union(Modifiers::CTRL);
    }
    out
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(data: &[u8]) -> Vec<Event> {
        EscapeDecoder::new().decode(data)
    }

    fn decode_one(data: &[u8]) -> Event {
        let events = decode(data);
        assert_eq!(events.len(), 1, "expected 1 event, got {events:?}");
        events[0]
    }

    fn key(b: u8) -> Event {
        byte_key(b, Modifiers::empty())
    }

    // ── Single bytes ────────────────────────────────────────────────────

    #[test]
    fn printable_bytes() {
        assert_eq!(decode(b"qi"), [key(b'q'), key(b'i')]);
    }

    #[test]
    fn carriage_return_is_byte_cr() {
        assert_eq!(decode_one(b"\r"), key(b'\r'));
        assert_eq!(decode_one(b"\n"), key(b'\r'));
    }

    #[test]
    fn ctrl_c_is_letter_with_ctrl() {
        assert_eq!(decode_one(b"\x03"), byte_key(b'c', Modifiers::CTRL));
    }

    #[test]
    fn ctrl_backslash() {
        assert_eq!(decode_one(b"\x1c"), byte_key(b'\\', Modifiers::CTRL));
    }

    #[test]
    fn backspace_variants() {
        let bs = special(SpecialKey::Backspace, Modifiers::empty());
        assert_eq!(decode(b"\x7f\x08"), [bs, bs]);
    }

    #[test]
    fn utf8_character() {
        assert_eq!(
            decode_one("é".as_bytes()),
            Event::Keyboard(KeyboardEvent::new(Key::Char('é'), Modifiers::empty()))
        );
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "€".as_bytes();
        let mut dec = EscapeDecoder::new();
        assert!(dec.decode(&bytes[..1]).is_empty());
        assert!(dec.has_pending());
        assert_eq!(dec.decode(&bytes[1..]).len(), 1);
        assert!(!dec.has_pending());
    }

    // ── Escape and Alt ──────────────────────────────────────────────────

    #[test]
    fn lone_escape_waits_for_flush() {
        let mut dec = EscapeDecoder::new();
        assert!(dec.decode(b"\x1b").is_empty());
        assert!(dec.has_pending());
        assert_eq!(dec.flush(), [special(SpecialKey::Escape, Modifiers::empty())]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn alt_letter() {
        assert_eq!(decode_one(b"\x1bx"), byte_key(b'x', Modifiers::ALT));
    }

    #[test]
    fn alt_ctrl_letter() {
        assert_eq!(
            decode_one(b"\x1b\x01"),
            byte_key(b'a', Modifiers::ALT | Modifiers::CTRL)
        );
    }

    // ── CSI ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        let none = Modifiers::empty();
        assert_eq!(
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            [
                special(SpecialKey::Up, none),
                special(SpecialKey::Down, none),
                special(SpecialKey::Right, none),
                special(SpecialKey::Left, none),
            ]
        );
    }

    #[test]
    fn arrow_modifier_parameters() {
        assert_eq!(decode_one(b"\x1b[1;2A"), special(SpecialKey::Up, Modifiers::SHIFT));
        assert_eq!(decode_one(b"\x1b[1;3B"), special(SpecialKey::Down, Modifiers::ALT));
        assert_eq!(decode_one(b"\x1b[1;5C"), special(SpecialKey::Right, Modifiers::CTRL));
        assert_eq!(decode_one(b"\x1b[1;8D"), special(SpecialKey::Left, Modifiers::all()));
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(decode_one(b"\x1b[3~"), special(SpecialKey::Delete, Modifiers::empty()));
        assert_eq!(decode_one(b"\x1b[5;5~"), special(SpecialKey::PageUp, Modifiers::CTRL));
        assert_eq!(decode_one(b"\x1b[24~"), special(SpecialKey::F(12), Modifiers::empty()));
    }

    #[test]
    fn back_tab() {
        assert_eq!(decode_one(b"\x1b[Z"), special(SpecialKey::BackTab, Modifiers::SHIFT));
    }

    #[test]
    fn csi_split_across_reads() {
        let mut dec = EscapeDecoder::new();
        assert!(dec.decode(b"\x1b[1;").is_empty());
        assert_eq!(dec.decode(b"5A"), [special(SpecialKey::Up, Modifiers::CTRL)]);
    }

    #[test]
    fn unknown_csi_is_skipped() {
        assert_eq!(decode(b"\x1b[99~q"), [key(b'q')]);
    }

    #[test]
    fn ss3_function_keys() {
        assert_eq!(decode_one(b"\x1bOP"), special(SpecialKey::F(1), Modifiers::empty()));
        assert_eq!(decode_one(b"\x1bOA"), special(SpecialKey::Up, Modifiers::empty()));
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn sgr_mouse_press_is_zero_indexed() {
        assert_eq!(
            decode_one(b"\x1b[<0;10;5M"),
            Event::Mouse(MouseEvent {
                x: 9,
                y: 4,
                button: MouseButton::Left,
                modifiers: Modifiers::empty(),
            })
        );
    }

    #[test]
    fn sgr_mouse_release_has_no_button() {
        let Event::Mouse(ev) = decode_one(b"\x1b[<2;1;1m") else {
            panic!("expected mouse event");
        };
        assert_eq!(ev.button, MouseButton::None);
    }

    #[test]
    fn sgr_mouse_modifiers_and_wheel() {
        let Event::Mouse(ev) = decode_one(b"\x1b[<81;3;3M") else {
            panic!("expected mouse event");
        };
        assert_eq!(ev.button, MouseButton::WheelDown);
        assert_eq!(ev.modifiers, Modifiers::CTRL);
    }

    #[test]
    fn sgr_mouse_incomplete() {
        let mut dec = EscapeDecoder::new();
        assert!(dec.decode(b"\x1b[<0;10").is_empty());
        assert!(dec.has_pending());
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    #[test]
    fn params_parse() {
        assert_eq!(parse_params(b"1;5"), [1, 5]);
        assert_eq!(parse_params(b";3"), [0, 3]);
        assert!(parse_params(b"").is_empty());
    }

    #[test]
    fn modifier_decoding() {
        assert_eq!(decode_modifiers(0), Modifiers::empty());
        assert_eq!(decode_modifiers(1), Modifiers::empty());
        assert_eq!(decode_modifiers(4), Modifiers::SHIFT | Modifiers::ALT);
        assert_eq!(decode_modifiers(7), Modifiers::ALT | Modifiers::CTRL);
    }
}
