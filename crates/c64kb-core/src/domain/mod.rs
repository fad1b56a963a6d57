//! Domain state for the key bridge.
//!
//! This module contains pure state with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code has no imports from OS APIs,
//! Bluetooth stacks, or terminal libraries, so it can be compiled and tested on
//! any machine without hardware attached.
//!
//! For this bridge the domain is small: the operator's current mode, which
//! decides how the next key press is interpreted.

/// Operator mode state machine.
///
/// See [`mode::ModeState`] for the main type.
pub mod mode;
