//! Translation of host key presses into C64 peripheral commands.
//!
//! The mapping is data: per-key tables in [`matrix`] plus a fixed resolution
//! order in [`resolve`].  The same key and the same [`ModeState`] always
//! resolve to the same action.

pub mod host_key;
pub mod matrix;

pub use host_key::HostKey;
pub use matrix::MatrixCode;

use crate::domain::mode::{KeyboardJoystick, ModeState};
use crate::protocol::command::{Command, Direction, HostOpcode, JoystickMapping, JoystickSignal};

/// What a key press asks the dispatcher to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Encode and send this command, nothing else.
    Send(Command),
    /// Flip host command mode.  Sends nothing.
    ToggleHostMode,
    /// Send [`HostOpcode::SetKeyboardJoystickMode`] and advance the level.
    CycleKeyboardJoystick,
    /// Send [`HostOpcode::SetJoystickMode`] and advance the mode.
    CycleRealJoystick,
    /// Ask the operator for an address and a byte count, then dump memory.
    PromptShowMemory,
    /// Ask the operator for a file name, then upload the program.
    PromptSendProgram,
}

impl KeyAction {
    fn send(command: Command) -> Option<Self> {
        Some(KeyAction::Send(command))
    }
}

/// Resolves a key press under the given mode.
///
/// Rules are tried in order and the first match wins:
///
/// 1. Editing keys (Backspace, Insert, Enter).
/// 2. F1–F8 as C64 function keys, unless host command mode is on.
/// 3. Cursor keys and Ctrl, as CRSR/Commodore or as joystick signals.
/// 4. Home, End, Space, Escape.
/// 5. Mode keys: F12, F5, F9.
/// 6. Host commands on F1–F4, F6, F7 while host command mode is on.
/// 7. Printable characters from [`matrix::CHAR_TABLE`], in every mode.
///
/// Returns `None` for keys with no mapping; callers ignore those.
///
/// Because rule 2 claims F5 whenever host command mode is off, the keyboard
/// joystick can only be cycled from host command mode.
///
/// # Examples
///
/// ```rust
/// use c64kb_core::domain::mode::ModeState;
/// use c64kb_core::keymap::{resolve, HostKey, KeyAction, MatrixCode};
/// use c64kb_core::protocol::Command;
///
/// let mode = ModeState::new();
/// assert_eq!(
///     resolve(HostKey::Char('a'), &mode),
///     Some(KeyAction::Send(Command::Matrix(MatrixCode::plain(0xFD, 0xFB))))
/// );
/// assert_eq!(resolve(HostKey::F11, &mode), None);
/// ```
pub fn resolve(key: HostKey, mode: &ModeState) -> Option<KeyAction> {
    if matches!(key, HostKey::Backspace | HostKey::Insert | HostKey::Enter) {
        return matrix::fixed_key(key).map(Command::Matrix).and_then(KeyAction::send);
    }

    if !mode.host_command_mode() {
        if let Some(code) = matrix::function_key(key) {
            return KeyAction::send(Command::Matrix(code));
        }
    }

    if let Some(direction) = direction_of(key) {
        return KeyAction::send(directional(direction, mode.keyboard_joystick()));
    }

    if let Some(code) = matrix::fixed_key(key) {
        return KeyAction::send(Command::Matrix(code));
    }

    match key {
        HostKey::F12 => return Some(KeyAction::ToggleHostMode),
        HostKey::F5 => return Some(KeyAction::CycleKeyboardJoystick),
        HostKey::F9 => return Some(KeyAction::CycleRealJoystick),
        _ => {}
    }

    if mode.host_command_mode() {
        let action = match key {
            HostKey::F1 => Some(KeyAction::Send(Command::Control(HostOpcode::ShowRegisters))),
            HostKey::F2 => Some(KeyAction::Send(Command::Control(HostOpcode::Load))),
            HostKey::F3 => Some(KeyAction::PromptShowMemory),
            HostKey::F4 => Some(KeyAction::PromptSendProgram),
            HostKey::F6 => Some(KeyAction::Send(Command::Control(HostOpcode::Reset))),
            HostKey::F7 => Some(KeyAction::Send(Command::Control(HostOpcode::ToggleDrawMode))),
            _ => None,
        };
        if action.is_some() {
            return action;
        }
    }

    match key {
        HostKey::Char(c) => matrix::char_code(c).map(Command::Matrix).map(KeyAction::Send),
        _ => None,
    }
}

/// Cursor keys and Ctrl double as joystick directions and fire.
fn direction_of(key: HostKey) -> Option<Direction> {
    match key {
        HostKey::Up => Some(Direction::Up),
        HostKey::Down => Some(Direction::Down),
        HostKey::Left => Some(Direction::Left),
        HostKey::Right => Some(Direction::Right),
        HostKey::Ctrl => Some(Direction::Fire),
        _ => None,
    }
}

fn directional(direction: Direction, level: KeyboardJoystick) -> Command {
    let mapping = match level {
        KeyboardJoystick::Off => {
            let code = match direction {
                Direction::Up => matrix::CURSOR_UP,
                Direction::Down => matrix::CURSOR_DOWN,
                Direction::Left => matrix::CURSOR_LEFT,
                Direction::Right => matrix::CURSOR_RIGHT,
                Direction::Fire => matrix::COMMODORE,
            };
            return Command::Matrix(code);
        }
        KeyboardJoystick::Mapping1 => JoystickMapping::First,
        KeyboardJoystick::Mapping2 => JoystickMapping::Second,
    };
    Command::Joystick(JoystickSignal::new(direction, mapping))
}
