//! Command types sent to the C64 peripheral.
//!
//! Every exchange with the peripheral is one short frame written to a single
//! GATT characteristic.  There is no header, no length prefix and no version
//! byte; the peripheral tells frames apart by their first three bytes:
//!
//! ```text
//! [col][row][00|01]        keyboard matrix press (shift flag in byte 2)
//! [mask][01][20|40]        keyboard-joystick signal
//! [op][00][80] ...         host control command, optional parameters follow
//! [FF]                     end of a program transfer
//! ```

use std::fmt;

use crate::keymap::matrix::MatrixCode;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Bytes 1 and 2 of every control frame.
pub const CONTROL_MARKER: [u8; 2] = [0x00, 0x80];

/// Largest payload carried by one transfer chunk.
///
/// Leaves room for the 3-byte chunk prefix and the 3-byte header in the
/// peripheral's receive buffer.
pub const MAX_CHUNK_PAYLOAD: usize = 248;

/// Largest byte count a memory dump request may ask for.
pub const MAX_DUMP_LENGTH: u8 = 250;

/// Single-byte frame that ends a program transfer.
pub const FINALIZE_BYTE: u8 = 0xFF;

/// Byte 1 of every keyboard-joystick frame.
pub const JOYSTICK_MARKER: u8 = 0x01;

// ── Host control opcodes ──────────────────────────────────────────────────────

/// Opcodes understood by the peripheral's host command handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HostOpcode {
    SetJoystickMode = 0x01,
    SetKeyboardJoystickMode = 0x02,
    /// Load a program from the peripheral's SD card.
    Load = 0x0B,
    /// Header of the first program transfer chunk.
    ReceiveData = 0x0C,
    /// Print CPU and chip registers on the peripheral's console.
    ShowRegisters = 0x0D,
    ShowMemory = 0x0E,
    Reset = 0x14,
    /// Switch between line-by-line and interlaced VIC drawing.
    ToggleDrawMode = 0x15,
}

impl HostOpcode {
    /// Returns the human-readable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            HostOpcode::SetJoystickMode => "set joystick mode",
            HostOpcode::SetKeyboardJoystickMode => "set keyboard joystick mode",
            HostOpcode::Load => "load from storage",
            HostOpcode::ReceiveData => "receive data",
            HostOpcode::ShowRegisters => "show registers",
            HostOpcode::ShowMemory => "show memory",
            HostOpcode::Reset => "reset",
            HostOpcode::ToggleDrawMode => "toggle draw mode",
        }
    }
}

impl TryFrom<u8> for HostOpcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(HostOpcode::SetJoystickMode),
            0x02 => Ok(HostOpcode::SetKeyboardJoystickMode),
            0x0B => Ok(HostOpcode::Load),
            0x0C => Ok(HostOpcode::ReceiveData),
            0x0D => Ok(HostOpcode::ShowRegisters),
            0x0E => Ok(HostOpcode::ShowMemory),
            0x14 => Ok(HostOpcode::Reset),
            0x15 => Ok(HostOpcode::ToggleDrawMode),
            _ => Err(()),
        }
    }
}

impl fmt::Display for HostOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Keyboard joystick ─────────────────────────────────────────────────────────

/// Which joystick mapping a keyboard-joystick frame targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoystickMapping {
    First,
    Second,
}

impl JoystickMapping {
    /// Byte 2 of the frame.
    pub fn selector(self) -> u8 {
        match self {
            JoystickMapping::First => 0x20,
            JoystickMapping::Second => 0x40,
        }
    }

    /// Bits that are always set in the direction mask for this mapping.
    ///
    /// The second mapping clears bit 7, so its masks read `0x7E`, `0x6F` and
    /// so on instead of `0xFE`, `0xEF`.
    fn base_mask(self) -> u8 {
        match self {
            JoystickMapping::First => 0xFF,
            JoystickMapping::Second => 0x7F,
        }
    }
}

/// A joystick direction or the fire button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Direction {
    /// Active-low bit position in the CIA joystick register.
    fn bit(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::Fire => 4,
        }
    }
}

/// One keyboard-joystick frame: a direction mask plus the mapping selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoystickSignal {
    pub mask: u8,
    pub mapping: JoystickMapping,
}

impl JoystickSignal {
    /// Builds the signal for pressing `direction` under `mapping`.
    pub fn new(direction: Direction, mapping: JoystickMapping) -> Self {
        Self {
            mask: mapping.base_mask() & !(1 << direction.bit()),
            mapping,
        }
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// An abstract command, ready to be encoded by [`crate::protocol::codec::encode`].
///
/// Commands are produced per key press (or per transfer step), encoded once,
/// and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press one key on the C64 keyboard matrix.
    Matrix(MatrixCode),
    /// Keyboard-joystick movement or fire.
    Joystick(JoystickSignal),
    /// Parameterless host control command.
    Control(HostOpcode),
    /// Ask the peripheral to print `length` bytes starting at `address`.
    ShowMemory { address: u16, length: u8 },
    /// One segment of a program upload.
    ///
    /// `with_header` is set on the first chunk of a transfer only.
    TransferChunk {
        with_header: bool,
        address: u16,
        payload: Vec<u8>,
    },
    /// Ends a program upload.
    Finalize,
}

impl Command {
    /// Builds a memory dump request, clamping `length` to [`MAX_DUMP_LENGTH`].
    pub fn show_memory(address: u16, length: u32) -> Self {
        let length = length.min(u32::from(MAX_DUMP_LENGTH)) as u8;
        Command::ShowMemory { address, length }
    }
}
