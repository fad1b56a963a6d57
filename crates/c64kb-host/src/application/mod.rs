//! Application layer use cases for the host bridge.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules, here `c64kb-core`) and the infrastructure (terminal, Bluetooth,
//! file system).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** core types to fulfil an operator goal (e.g., "type this
//!   key on the C64" or "upload this program").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no OS calls, no Bluetooth I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`dispatch`**     – Takes key presses one at a time and decides what to
//!   send.  Runs on every keystroke.
//!
//! - **`send_program`** – Drives a chunked program upload to completion.
//!
//! - **`memory_dump`**  – Parses the operator's answers for a memory dump.
//!
//! - **`link`**         – The [`link::FrameTransport`] port and the shared
//!   encode/round-trip helper.

pub mod dispatch;
pub mod link;
pub mod memory_dump;
pub mod send_program;
