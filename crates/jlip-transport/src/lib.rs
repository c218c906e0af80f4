//! Transport implementations for JLIP devices.
//!
//! This crate provides the concrete [`Transport`](jlip_core::Transport) used
//! against real hardware:
//!
//! - [`SerialTransport`]: RS-232 adapters and USB virtual COM ports wired to
//!   a deck's JLIP jack
//!
//! # Example
//!
//! ```no_run
//! use jlip_transport::SerialTransport;
//! use jlip_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> jlip_core::Result<()> {
//! let mut transport = SerialTransport::open_jlip("/dev/ttyUSB0").await?;
//!
//! // Power query to JLIP id 1 (already framed and checksummed)
//! transport
//!     .send(&[0xFF, 0xFF, 0x01, 0x3E, 0x4E, 0x20, 0x00, 0x00, 0x00, 0x00, 0x55])
//!     .await?;
//!
//! let mut buf = [0u8; 11];
//! let n = transport.receive(&mut buf, Duration::from_secs(2)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{
    JLIP_BAUD_RATE, JLIP_DATA_BITS, JLIP_FLOW_CONTROL, JLIP_PARITY, JLIP_STOP_BITS, SerialConfig,
    SerialTransport,
};
