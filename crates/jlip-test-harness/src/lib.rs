//! jlip-test-harness: Mock transport for testing the JLIP protocol engine.
//!
//! [`MockTransport`] replays scripted request/response pairs so command
//! framing, response decoding and the wait loops can be tested
//! deterministically without a deck on the bench. A [`MockHandle`] stays
//! with the test after the transport itself has been handed to the engine.

pub mod mock_serial;

pub use mock_serial::{MockHandle, MockTransport};
