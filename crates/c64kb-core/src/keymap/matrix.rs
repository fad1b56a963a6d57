//! C64 keyboard matrix codes and the static lookup tables that produce them.
//!
//! The C64 scans its keyboard through CIA #1: the KERNAL drives one column
//! line low on port A (`$DC00`) and reads the row lines back on port B
//! (`$DC01`).  A key is "down" when its row bit reads back as 0 while its
//! column bit is driven low.
//!
//! The peripheral emulating the C64 needs exactly those two bytes to fake a
//! key press, plus one flag telling it whether the left Shift key should be
//! held down at the same time:
//!
//! ```text
//! [column mask][row mask][shift flag]
//!      FD         FB         00        -> 'A' (column 1, row 2, unshifted)
//! ```
//!
//! Both masks are active-low: every bit is 1 except the selected line.
//!
//! Reference: C64 Programmer's Reference Guide, keyboard matrix table.

use super::host_key::HostKey;

/// A pre-computed matrix bit pattern for one C64 key, optionally shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixCode {
    /// Active-low column select written to CIA #1 port A.
    pub column: u8,
    /// Active-low row pattern read from CIA #1 port B.
    pub row: u8,
    /// Whether the C64 Shift key is held together with this key.
    pub shifted: bool,
}

impl MatrixCode {
    /// Creates an unshifted matrix code.
    pub const fn plain(column: u8, row: u8) -> Self {
        Self {
            column,
            row,
            shifted: false,
        }
    }

    /// Creates a matrix code with the C64 Shift key held.
    pub const fn shifted(column: u8, row: u8) -> Self {
        Self {
            column,
            row,
            shifted: true,
        }
    }

    /// Returns the 3-byte wire form `[column, row, shift]`.
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.column, self.row, if self.shifted { 0x01 } else { 0x00 }]
    }
}

// ── Named keys ────────────────────────────────────────────────────────────────

/// INST/DEL without shift.
pub const DELETE: MatrixCode = MatrixCode::plain(0xFE, 0xFE);
/// INST/DEL with shift.
pub const INSERT: MatrixCode = MatrixCode::shifted(0xFE, 0xFE);
pub const RETURN: MatrixCode = MatrixCode::plain(0xFE, 0xFD);
/// CLR/HOME without shift.
pub const HOME: MatrixCode = MatrixCode::plain(0xBF, 0xF7);
/// CLR/HOME with shift (clear screen).
pub const CLEAR: MatrixCode = MatrixCode::shifted(0xBF, 0xF7);
pub const SPACE: MatrixCode = MatrixCode::plain(0x7F, 0xEF);
pub const RUN_STOP: MatrixCode = MatrixCode::plain(0x7F, 0x7F);
pub const COMMODORE: MatrixCode = MatrixCode::plain(0x7F, 0xDF);

/// CRSR ⇔ unshifted moves right, shifted moves left.
pub const CURSOR_RIGHT: MatrixCode = MatrixCode::plain(0xFE, 0xFB);
pub const CURSOR_LEFT: MatrixCode = MatrixCode::shifted(0xFE, 0xFB);
/// CRSR ⇕ unshifted moves down, shifted moves up.
pub const CURSOR_DOWN: MatrixCode = MatrixCode::plain(0xFE, 0x7F);
pub const CURSOR_UP: MatrixCode = MatrixCode::shifted(0xFE, 0x7F);

/// Matrix codes for the host keys that are never reinterpreted by a mode:
/// the editing keys and the navigation/whitespace/escape keys.
pub fn fixed_key(key: HostKey) -> Option<MatrixCode> {
    match key {
        HostKey::Backspace => Some(DELETE),
        HostKey::Insert => Some(INSERT),
        HostKey::Enter => Some(RETURN),
        HostKey::Home => Some(HOME),
        HostKey::End => Some(CLEAR),
        HostKey::Space => Some(SPACE),
        HostKey::Escape => Some(RUN_STOP),
        _ => None,
    }
}

/// The C64 has four physical function keys; the shifted half gives F2/F4/F6/F8.
pub const FUNCTION_KEYS: [(HostKey, MatrixCode); 8] = [
    (HostKey::F1, MatrixCode::plain(0xFE, 0xEF)),
    (HostKey::F2, MatrixCode::shifted(0xFE, 0xEF)),
    (HostKey::F3, MatrixCode::plain(0xFE, 0xDF)),
    (HostKey::F4, MatrixCode::shifted(0xFE, 0xDF)),
    (HostKey::F5, MatrixCode::plain(0xFE, 0xBF)),
    (HostKey::F6, MatrixCode::shifted(0xFE, 0xBF)),
    (HostKey::F7, MatrixCode::plain(0xFE, 0xF7)),
    (HostKey::F8, MatrixCode::shifted(0xFE, 0xF7)),
];

/// Returns the C64 function key code for host F1–F8.
pub fn function_key(key: HostKey) -> Option<MatrixCode> {
    FUNCTION_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, code)| *code)
}

// ── Printable characters ──────────────────────────────────────────────────────

/// Character table for a Swiss-German host layout.
///
/// Keys the host layout cannot produce directly are borrowed from nearby
/// umlaut keys: `ä` types `@`, `ö` types `#`, `ü` types `[`, `¨` types `]`.
pub const CHAR_TABLE: &[(char, MatrixCode)] = &[
    // column 1
    ('3', MatrixCode::plain(0xFD, 0xFE)),
    ('w', MatrixCode::plain(0xFD, 0xFD)),
    ('a', MatrixCode::plain(0xFD, 0xFB)),
    ('4', MatrixCode::plain(0xFD, 0xF7)),
    ('z', MatrixCode::plain(0xFD, 0xEF)),
    ('s', MatrixCode::plain(0xFD, 0xDF)),
    ('e', MatrixCode::plain(0xFD, 0xBF)),
    // column 2
    ('5', MatrixCode::plain(0xFB, 0xFE)),
    ('r', MatrixCode::plain(0xFB, 0xFD)),
    ('d', MatrixCode::plain(0xFB, 0xFB)),
    ('6', MatrixCode::plain(0xFB, 0xF7)),
    ('c', MatrixCode::plain(0xFB, 0xEF)),
    ('f', MatrixCode::plain(0xFB, 0xDF)),
    ('t', MatrixCode::plain(0xFB, 0xBF)),
    ('x', MatrixCode::plain(0xFB, 0x7F)),
    // column 3
    ('7', MatrixCode::plain(0xF7, 0xFE)),
    ('y', MatrixCode::plain(0xF7, 0xFD)),
    ('g', MatrixCode::plain(0xF7, 0xFB)),
    ('8', MatrixCode::plain(0xF7, 0xF7)),
    ('b', MatrixCode::plain(0xF7, 0xEF)),
    ('h', MatrixCode::plain(0xF7, 0xDF)),
    ('u', MatrixCode::plain(0xF7, 0xBF)),
    ('v', MatrixCode::plain(0xF7, 0x7F)),
    // column 4
    ('9', MatrixCode::plain(0xEF, 0xFE)),
    ('i', MatrixCode::plain(0xEF, 0xFD)),
    ('j', MatrixCode::plain(0xEF, 0xFB)),
    ('0', MatrixCode::plain(0xEF, 0xF7)),
    ('m', MatrixCode::plain(0xEF, 0xEF)),
    ('k', MatrixCode::plain(0xEF, 0xDF)),
    ('o', MatrixCode::plain(0xEF, 0xBF)),
    ('n', MatrixCode::plain(0xEF, 0x7F)),
    // column 5
    ('+', MatrixCode::plain(0xDF, 0xFE)),
    ('p', MatrixCode::plain(0xDF, 0xFD)),
    ('l', MatrixCode::plain(0xDF, 0xFB)),
    ('-', MatrixCode::plain(0xDF, 0xF7)),
    ('.', MatrixCode::plain(0xDF, 0xEF)),
    (':', MatrixCode::plain(0xDF, 0xDF)),
    ('ä', MatrixCode::plain(0xDF, 0xBF)), // @
    (',', MatrixCode::plain(0xDF, 0x7F)),
    // column 6
    ('£', MatrixCode::plain(0xBF, 0xFE)),
    ('*', MatrixCode::plain(0xBF, 0xFD)),
    (';', MatrixCode::plain(0xBF, 0xFB)),
    ('=', MatrixCode::plain(0xBF, 0xDF)),
    ('^', MatrixCode::plain(0xBF, 0xBF)),
    ('/', MatrixCode::plain(0xBF, 0x7F)),
    // column 7
    ('1', MatrixCode::plain(0x7F, 0xFE)),
    ('§', MatrixCode::plain(0x7F, 0xFD)), // ←
    ('2', MatrixCode::plain(0x7F, 0xF7)),
    ('q', MatrixCode::plain(0x7F, 0xBF)),
    // shifted
    ('!', MatrixCode::shifted(0x7F, 0xFE)),
    ('"', MatrixCode::shifted(0x7F, 0xF7)),
    ('ö', MatrixCode::shifted(0xFD, 0xFE)), // #
    ('$', MatrixCode::shifted(0xFD, 0xF7)),
    ('%', MatrixCode::shifted(0xFB, 0xFE)),
    ('&', MatrixCode::shifted(0xFB, 0xF7)),
    ('\'', MatrixCode::shifted(0xF7, 0xFE)),
    ('(', MatrixCode::shifted(0xF7, 0xF7)),
    (')', MatrixCode::shifted(0xEF, 0xFE)),
    ('ü', MatrixCode::shifted(0xDF, 0xDF)), // [
    ('¨', MatrixCode::shifted(0xBF, 0xFB)), // ]
    ('<', MatrixCode::shifted(0xDF, 0x7F)),
    ('>', MatrixCode::shifted(0xDF, 0xEF)),
    ('?', MatrixCode::shifted(0xBF, 0x7F)),
];

/// Looks up the matrix code for a printable host character.
pub fn char_code(c: char) -> Option<MatrixCode> {
    CHAR_TABLE
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, code)| *code)
}
