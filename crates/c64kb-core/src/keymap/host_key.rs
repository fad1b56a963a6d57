//! Normalized host key identity.
//!
//! This is the key representation the mapping tables are keyed by.  The
//! capture layer (terminal, window system, test harness) converts whatever
//! it receives into a [`HostKey`] before anything else looks at it.
//!
//! # Where is the Shift modifier? (for beginners)
//!
//! There is no separate shift flag.  The host keyboard layout has already
//! decided which character a key press produces, so pressing Shift+1 on a
//! Swiss-German layout arrives as `HostKey::Char('+')` and plain 1 arrives as
//! `HostKey::Char('1')`.  The C64 table then says which of those characters
//! needs the C64's own shift line held down.  A side effect is that the table
//! only matches layouts that produce the same characters as the one it was
//! written for; other layouts get partial coverage.

/// A single key press as seen by the mapping tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKey {
    // Editing cluster
    Backspace,
    Insert,
    Enter,
    Escape,
    Space,
    Home,
    End,

    // Cursor keys
    Left,
    Right,
    Up,
    Down,

    /// Either Control key.  Doubles as the Commodore key / fire button.
    Ctrl,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    /// A printable character, exactly as the host layout produced it.
    Char(char),
}

impl HostKey {
    /// Returns the function key with the given 1-based number.
    ///
    /// Returns `None` for numbers outside `1..=12`.
    pub fn function(number: u8) -> Option<Self> {
        let key = match number {
            1 => HostKey::F1,
            2 => HostKey::F2,
            3 => HostKey::F3,
            4 => HostKey::F4,
            5 => HostKey::F5,
            6 => HostKey::F6,
            7 => HostKey::F7,
            8 => HostKey::F8,
            9 => HostKey::F9,
            10 => HostKey::F10,
            11 => HostKey::F11,
            12 => HostKey::F12,
            _ => return None,
        };
        Some(key)
    }

    /// Returns the printable character carried by this key, if any.
    ///
    /// [`HostKey::Space`] counts as printable so prompts can echo it.
    pub fn printable(self) -> Option<char> {
        match self {
            HostKey::Char(c) => Some(c),
            HostKey::Space => Some(' '),
            _ => None,
        }
    }
}

impl From<char> for HostKey {
    /// Wraps a character, folding the ones with a dedicated named key.
    fn from(c: char) -> Self {
        match c {
            ' ' => HostKey::Space,
            '\r' | '\n' => HostKey::Enter,
            '\u{8}' | '\u{7f}' => HostKey::Backspace,
            '\u{1b}' => HostKey::Escape,
            other => HostKey::Char(other),
        }
    }
}
