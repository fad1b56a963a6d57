//! Operator mode state for the key bridge.
//!
//! Three independent settings decide how a key press is interpreted:
//!
//! - **Host command mode** (toggled by F12): F1–F7 stop acting as C64 function
//!   keys and instead issue management commands to the peripheral.
//! - **Keyboard joystick** (cycled by F5): the cursor keys and Ctrl emulate
//!   a joystick in port 1 or port 2 instead of typing CRSR/Commodore.
//! - **Real joystick** (cycled by F9): tracked for display only; the
//!   peripheral owns the actual setting.
//!
//! The state is a plain value owned by whoever processes key events.  Nothing
//! here is shared or persisted, and it always starts with everything off.

use std::fmt;

/// Keyboard-joystick emulation level, cycled Off → Mapping1 → Mapping2 → Off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyboardJoystick {
    /// Cursor keys type CRSR, Ctrl is the Commodore key.
    #[default]
    Off,
    /// Cursor keys and Ctrl drive the first joystick mapping.
    Mapping1,
    /// Cursor keys and Ctrl drive the second joystick mapping.
    Mapping2,
}

impl KeyboardJoystick {
    /// Returns the level that follows this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            KeyboardJoystick::Off => KeyboardJoystick::Mapping1,
            KeyboardJoystick::Mapping1 => KeyboardJoystick::Mapping2,
            KeyboardJoystick::Mapping2 => KeyboardJoystick::Off,
        }
    }

    /// Numeric level as shown to the operator (0, 1, 2).
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Physical joystick mode, cycled Off → Mode1 → Mode2 → Off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RealJoystick {
    #[default]
    Off,
    Mode1,
    Mode2,
}

impl RealJoystick {
    /// Returns the mode that follows this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            RealJoystick::Off => RealJoystick::Mode1,
            RealJoystick::Mode1 => RealJoystick::Mode2,
            RealJoystick::Mode2 => RealJoystick::Off,
        }
    }

    /// Numeric level as shown to the operator (0, 1, 2).
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// The combined operator mode.
///
/// Fields are private so the only way to change them is through the three
/// transition methods, each of which corresponds to one toggle key.
///
/// # Examples
///
/// ```rust
/// use c64kb_core::domain::mode::{KeyboardJoystick, ModeState};
///
/// let mut mode = ModeState::new();
/// assert!(!mode.host_command_mode());
///
/// assert_eq!(mode.cycle_keyboard_joystick(), KeyboardJoystick::Mapping1);
/// assert_eq!(mode.keyboard_joystick(), KeyboardJoystick::Mapping1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    host_command_mode: bool,
    keyboard_joystick: KeyboardJoystick,
    real_joystick: RealJoystick,
}

impl ModeState {
    /// Creates the initial state: host command mode off, both joysticks off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_command_mode(&self) -> bool {
        self.host_command_mode
    }

    pub fn keyboard_joystick(&self) -> KeyboardJoystick {
        self.keyboard_joystick
    }

    pub fn real_joystick(&self) -> RealJoystick {
        self.real_joystick
    }

    /// Flips host command mode and returns the new value.
    pub fn toggle_host_command_mode(&mut self) -> bool {
        self.host_command_mode = !self.host_command_mode;
        self.host_command_mode
    }

    /// Advances the keyboard-joystick level and returns the new level.
    pub fn cycle_keyboard_joystick(&mut self) -> KeyboardJoystick {
        self.keyboard_joystick = self.keyboard_joystick.next();
        self.keyboard_joystick
    }

    /// Advances the real-joystick mode and returns the new mode.
    pub fn cycle_real_joystick(&mut self) -> RealJoystick {
        self.real_joystick = self.real_joystick.next();
        self.real_joystick
    }
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hostmode = {}, kbjoystick = {}, joystick = {}",
            self.host_command_mode,
            self.keyboard_joystick.level(),
            self.real_joystick.level()
        )
    }
}
