//! JLIP protocol engine for JVC VCRs.
//!
//! This crate implements the JLIP (JVC Link Interface Protocol) command set
//! used by JVC HR-series decks. It provides:
//!
//! - **Frame codec** ([`frame`]) -- 11-byte frame encoding, the 7-bit
//!   checksum, and validation of received frames.
//! - **Command builders** ([`commands`]) -- opcode payloads for every
//!   transport, tuner, power and query command.
//! - **Response decoders** ([`response`]) -- typed views over response
//!   frames (generic, VTR mode, tuner mode, power state, device name).
//! - **Rate limiting** ([`limiter`]) -- the 2/s and 10/s admission gates
//!   every command passes through.
//! - **JlipLink** ([`link`]) -- one bus: IO task, limiters, status policy.
//! - **JlipVcr** ([`vcr`]) -- the command facade for one deck, plus the
//!   [`wait`] primitives that drive it to a target transport state.
//! - **Presence probe** ([`probe`]) -- find a responsive, unclaimed JLIP id.
//! - **VcrBuilder** ([`builder`]) -- fluent construction over a serial port
//!   or any [`Transport`](jlip_core::Transport).
//!
//! # Example
//!
//! ```
//! use jlip_vcr::commands::cmd_stop;
//! use jlip_vcr::frame::{decode_and_validate, encode};
//! use jlip_vcr::response::CommandResponse;
//! use jlip_core::CommandStatus;
//!
//! // Stop, addressed to JLIP id 1
//! let frame = encode(1, &cmd_stop()).unwrap();
//! assert_eq!(frame[10], 0x55);
//!
//! // An ACCEPTED response with no return data
//! let reply = [0xFF, 0xFF, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7E];
//! let reply = decode_and_validate(&reply).unwrap();
//! let response = CommandResponse::decode(&reply).unwrap();
//! assert_eq!(response.status(), CommandStatus::Accepted);
//! ```

pub mod builder;
pub mod commands;
pub mod frame;
mod io;
pub mod limiter;
pub mod link;
pub mod probe;
pub mod response;
pub mod vcr;
pub mod wait;

pub use builder::VcrBuilder;
pub use limiter::{Limiters, RateLimiter, Speed};
pub use link::JlipLink;
pub use response::{
    CommandResponse, DeviceNameResponse, PowerStateResponse, RawResponse, Response,
    TapeCounter, TunerModeResponse, VtrModeResponse,
};
pub use vcr::{JlipVcr, VcrCommand};
pub use wait::WaitPolicy;
