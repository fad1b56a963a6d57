//! c64kb-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # Layers (for beginners)
//!
//! - **`application`** – Use cases that turn key presses into frames.  Talks
//!   to the outside world only through traits.
//! - **`infrastructure`** – The implementations of those traits: terminal
//!   capture, Bluetooth LE, the file system and the console.

pub mod application;
pub mod infrastructure;
