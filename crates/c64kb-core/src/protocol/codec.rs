//! Binary codec for peripheral frames.
//!
//! Encoding is total: every [`Command`] has exactly one byte representation.
//!
//! ```text
//! Matrix        [col][row][shift]
//! Joystick      [mask][01][20|40]
//! Control       [op][00][80]
//! ShowMemory    [0E][00][80][len][addrLo][addrHi]
//! TransferChunk ([0C][00][80])? [len][addrLo][addrHi][payload...]
//! Finalize      [FF]
//! ```
//!
//! Addresses are little-endian, matching the 6502.
//!
//! There is no decode path on the peripheral side of this crate.  The
//! [`classify_frame`] helper exists for diagnostics (dry-run logging) and
//! only recognises the shapes produced by [`encode`].

use thiserror::Error;

use crate::protocol::command::{
    Command, HostOpcode, JoystickMapping, CONTROL_MARKER, FINALIZE_BYTE, JOYSTICK_MARKER,
};

/// Errors produced when inspecting a raw frame.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is shorter than its shape requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The frame carries the control marker but the opcode is not defined.
    #[error("unknown host opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// The frame matches none of the known shapes.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes a [`Command`] into the exact bytes written to the characteristic.
///
/// # Examples
///
/// ```rust
/// use c64kb_core::keymap::matrix::MatrixCode;
/// use c64kb_core::protocol::{encode, Command, HostOpcode};
///
/// let a = Command::Matrix(MatrixCode::plain(0xFD, 0xFB));
/// assert_eq!(encode(&a), vec![0xFD, 0xFB, 0x00]);
///
/// let reset = Command::Control(HostOpcode::Reset);
/// assert_eq!(encode(&reset), vec![0x14, 0x00, 0x80]);
/// ```
pub fn encode(command: &Command) -> Vec<u8> {
    match command {
        Command::Matrix(code) => code.to_bytes().to_vec(),

        Command::Joystick(signal) => {
            vec![signal.mask, JOYSTICK_MARKER, signal.mapping.selector()]
        }

        Command::Control(op) => control_prefix(*op).to_vec(),

        Command::ShowMemory { address, length } => {
            let mut buf = Vec::with_capacity(6);
            buf.extend_from_slice(&control_prefix(HostOpcode::ShowMemory));
            buf.push(*length);
            buf.extend_from_slice(&address.to_le_bytes());
            buf
        }

        Command::TransferChunk {
            with_header,
            address,
            payload,
        } => {
            let header_len = if *with_header { 3 } else { 0 };
            let mut buf = Vec::with_capacity(header_len + 3 + payload.len());
            if *with_header {
                buf.extend_from_slice(&control_prefix(HostOpcode::ReceiveData));
            }
            // The chunk planner never produces more than MAX_CHUNK_PAYLOAD bytes.
            buf.push(payload.len() as u8);
            buf.extend_from_slice(&address.to_le_bytes());
            buf.extend_from_slice(payload);
            buf
        }

        Command::Finalize => vec![FINALIZE_BYTE],
    }
}

fn control_prefix(op: HostOpcode) -> [u8; 3] {
    [op as u8, CONTROL_MARKER[0], CONTROL_MARKER[1]]
}

/// Formats a frame as space-separated uppercase hex, e.g. `FD FB 00`.
pub fn frame_to_hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Classification ────────────────────────────────────────────────────────────

/// Coarse description of a frame, used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Matrix { column: u8, row: u8, shifted: bool },
    Joystick { mask: u8, mapping: JoystickMapping },
    Control(HostOpcode),
    ShowMemory { address: u16, length: u8 },
    /// A transfer chunk; `first` is set when the receive header is present.
    TransferChunk { first: bool, address: u16, length: u8 },
    Finalize,
}

/// Classifies a frame produced by [`encode`].
///
/// Transfer chunks without a header are ambiguous with matrix frames, so
/// anything longer than three bytes that is not a control frame is treated as
/// a continuation chunk.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is empty, truncated, or carries an
/// undefined opcode.
pub fn classify_frame(frame: &[u8]) -> Result<FrameKind, ProtocolError> {
    match frame {
        [] => Err(ProtocolError::InsufficientData {
            needed: 1,
            available: 0,
        }),
        [FINALIZE_BYTE] => Ok(FrameKind::Finalize),
        [op, 0x00, 0x80, rest @ ..] => classify_control(*op, rest),
        [mask, JOYSTICK_MARKER, selector] => {
            let mapping = match selector {
                0x20 => JoystickMapping::First,
                0x40 => JoystickMapping::Second,
                other => {
                    return Err(ProtocolError::MalformedFrame(format!(
                        "joystick selector 0x{other:02X}"
                    )))
                }
            };
            Ok(FrameKind::Joystick {
                mask: *mask,
                mapping,
            })
        }
        [column, row, shift @ (0x00 | 0x01)] => Ok(FrameKind::Matrix {
            column: *column,
            row: *row,
            shifted: *shift == 0x01,
        }),
        [length, lo, hi, payload @ ..] if !payload.is_empty() => {
            check_chunk_length(*length, payload.len())?;
            Ok(FrameKind::TransferChunk {
                first: false,
                address: u16::from_le_bytes([*lo, *hi]),
                length: *length,
            })
        }
        other => Err(ProtocolError::MalformedFrame(frame_to_hex(other))),
    }
}

fn classify_control(op: u8, params: &[u8]) -> Result<FrameKind, ProtocolError> {
    let opcode = HostOpcode::try_from(op).map_err(|()| ProtocolError::UnknownOpcode(op))?;
    match opcode {
        HostOpcode::ShowMemory => match params {
            [length, lo, hi] => Ok(FrameKind::ShowMemory {
                address: u16::from_le_bytes([*lo, *hi]),
                length: *length,
            }),
            _ => Err(ProtocolError::InsufficientData {
                needed: 6,
                available: 3 + params.len(),
            }),
        },
        HostOpcode::ReceiveData => match params {
            [length, lo, hi, payload @ ..] => {
                check_chunk_length(*length, payload.len())?;
                Ok(FrameKind::TransferChunk {
                    first: true,
                    address: u16::from_le_bytes([*lo, *hi]),
                    length: *length,
                })
            }
            _ => Err(ProtocolError::InsufficientData {
                needed: 6,
                available: 3 + params.len(),
            }),
        },
        _ if params.is_empty() => Ok(FrameKind::Control(opcode)),
        _ => Err(ProtocolError::MalformedFrame(format!(
            "{opcode} takes no parameters, got {}",
            params.len()
        ))),
    }
}

fn check_chunk_length(declared: u8, actual: usize) -> Result<(), ProtocolError> {
    if usize::from(declared) == actual {
        Ok(())
    } else {
        Err(ProtocolError::MalformedFrame(format!(
            "chunk length byte says {declared}, payload has {actual}"
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
