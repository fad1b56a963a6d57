//! Infrastructure layer for the host application.
//!
//! Contains OS-facing adapters: terminal key capture, the Bluetooth (or
//! dry-run) transport, file-system storage and the operator console.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `c64kb_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod input_capture;
pub mod storage;
pub mod transport;
