//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. Each `send()` is matched against the next
//! expectation, and the paired response is served by the following
//! `receive()` calls.
//!
//! # Example
//!
//! ```
//! use jlip_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! let handle = mock.handle();
//! // Pre-load: when the engine sends this frame, answer with that frame.
//! mock.expect(
//!     &[0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x55],
//!     &[0xFF, 0xFF, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7E],
//! );
//! assert_eq!(handle.remaining_expectations(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use jlip_core::error::{Error, Result};
use jlip_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return when the matching request is received.
    response: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    sent_log: Vec<Vec<u8>>,
}

/// Shared view of a [`MockTransport`]'s traffic.
///
/// Cloned out of the transport before it is boxed and moved into the
/// engine's I/O task.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All frames sent through the transport, one element per `send()`.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Number of `send()` calls so far.
    pub fn sent_count(&self) -> usize {
        self.lock().sent_log.len()
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().expectations.len()
    }
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. If the sent data does not match the
/// next expectation, or the queue is exhausted, `send()` fails with
/// [`Error::Protocol`]. An empty scripted response makes the next
/// `receive()` wait out its timeout and fail with [`Error::Timeout`], which
/// is how an absent device looks on the wire.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    /// The response data pending for the next `receive()` call.
    pending_response: Option<Vec<u8>>,
    /// How many bytes of the pending response have been read so far.
    response_cursor: usize,
    /// Largest chunk returned by a single `receive()`.
    chunk_size: usize,
    connected: bool,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState::default())),
            pending_response: None,
            response_cursor: 0,
            chunk_size: usize::MAX,
            connected: true,
        }
    }

    /// Add an expected request/response pair.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.lock().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Expect `request` and never answer it.
    pub fn expect_silence(&mut self, request: &[u8]) {
        self.expect(request, &[]);
    }

    /// Deliver responses in chunks of at most `n` bytes, the way a slow
    /// serial adapter hands them over.
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    /// A handle that keeps observing this transport after it has been moved.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// All frames sent through this transport so far.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// A line with nothing on it: the whole timeout passes, then `Timeout`.
async fn silent(timeout: Duration) -> Result<usize> {
    tokio::time::sleep(timeout).await;
    Err(Error::Timeout)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let next = {
            let mut state = self.lock();
            state.sent_log.push(data.to_vec());
            state.expectations.pop_front()
        };

        match next {
            Some(expectation) => {
                if data != expectation.request.as_slice() {
                    return Err(Error::Protocol(format!(
                        "unexpected send data: expected {:02X?}, got {:02X?}",
                        expectation.request, data
                    )));
                }
                self.pending_response = Some(expectation.response);
                self.response_cursor = 0;
                Ok(())
            }
            None => Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let Some(response) = self.pending_response.as_ref() else {
            return silent(timeout).await;
        };

        let remaining = &response[self.response_cursor..];
        if remaining.is_empty() {
            self.pending_response = None;
            self.response_cursor = 0;
            return silent(timeout).await;
        }

        let n = remaining.len().min(buf.len()).min(self.chunk_size);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.response_cursor += n;
        if self.response_cursor >= response.len() {
            self.pending_response = None;
            self.response_cursor = 0;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending_response = None;
        self.response_cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
