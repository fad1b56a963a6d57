//! # c64kb-core
//!
//! Shared library for the C64 keyboard bridge containing the peripheral frame
//! codec, the C64 keyboard matrix tables, the operator mode state machine and
//! program transfer planning.
//!
//! It has zero dependencies on OS APIs, terminal libraries, or Bluetooth
//! stacks.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge lets you type on a PC keyboard and have the keys appear on a
//! C64 emulator running on a microcontroller.  The microcontroller exposes a
//! single Bluetooth LE characteristic; every key press becomes one short
//! binary frame written to it, followed by a read of the acknowledgment.
//!
//! This crate (`c64kb-core`) is the pure foundation.  It defines:
//!
//! - **`keymap`** – Which C64 keyboard matrix line (or joystick bit, or host
//!   command) a host key press stands for.  The entry point is
//!   [`keymap::resolve`].
//!
//! - **`domain`** – The operator's mode: host command mode, keyboard joystick
//!   level and real joystick mode.  It decides how [`keymap::resolve`] reads a
//!   key.
//!
//! - **`protocol`** – The frame layout.  Commands are encoded into 1 to 254
//!   bytes, and program images are cut into address-tagged chunks that fit the
//!   link.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `c64kb_core::ModeState` instead of `c64kb_core::domain::mode::ModeState`.
pub use domain::mode::{KeyboardJoystick, ModeState, RealJoystick};
pub use keymap::{resolve, HostKey, KeyAction, MatrixCode};
pub use protocol::codec::{encode, frame_to_hex, ProtocolError};
pub use protocol::command::{Command, HostOpcode};
pub use protocol::transfer::{TransferError, TransferJob};
