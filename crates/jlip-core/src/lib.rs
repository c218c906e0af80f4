//! jlip-core: Core traits, types, and error definitions for JLIP device control.
//!
//! JLIP (JVC Link Interface Protocol) is a serial command protocol for JVC
//! consumer AV equipment. This crate holds the pieces that every layer of
//! the stack agrees on, without pulling in a serial driver or the protocol
//! engine itself.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`CommandStatus`] -- the 3-bit status every response carries
//! - [`VtrMode`] -- the tape transport state reported by a VCR
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use transport::Transport;
pub use types::*;
