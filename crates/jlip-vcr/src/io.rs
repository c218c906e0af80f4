//! IO task that owns the serial transport.
//!
//! JLIP is half-duplex: a new frame must not be written while a response is
//! still pending. A single spawned task owns the [`Transport`] and runs one
//! exchange at a time, in the order requests arrive on its channel. Callers
//! talk to it through [`LinkIo`].
//!
//! An exchange is: write the frame, wait the settle delay, then read until
//! one full frame has arrived or the read timeout expires. Once started, an
//! exchange always runs to completion; cancellation is only observed between
//! exchanges. A queued request whose caller has gone away is dropped before
//! it reaches the wire.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use jlip_core::error::{Error, Result};
use jlip_core::transport::Transport;

use crate::frame::{self, FRAME_LEN};

/// Channel overhead allowed on top of the device-facing timeouts before a
/// caller gives up on the IO task.
const REPLY_MARGIN: Duration = Duration::from_millis(500);

/// Configuration for the IO task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IoConfig {
    /// Pause between writing a frame and starting to read the response.
    pub settle_delay: Duration,
    /// Total time allowed for the full response frame to arrive.
    pub read_timeout: Duration,
}

/// A request sent to the IO task.
pub(crate) enum Request {
    /// Write `frame` and read back one response frame.
    Exchange {
        frame: [u8; FRAME_LEN],
        /// Fired when the frame is about to be written.
        started: oneshot::Sender<()>,
        reply: oneshot::Sender<Result<[u8; FRAME_LEN]>>,
    },
    /// Graceful shutdown; returns the transport to the caller.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

/// Handle to the IO task.
pub(crate) struct LinkIo {
    pub cmd_tx: mpsc::Sender<Request>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
    config: IoConfig,
}

impl LinkIo {
    /// Run one exchange and return the validated response frame.
    pub async fn exchange(&self, frame: [u8; FRAME_LEN]) -> Result<[u8; FRAME_LEN]> {
        let (started_tx, started_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Exchange {
                frame,
                started: started_tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        // Time spent queued behind other exchanges is not charged: each of
        // those is bounded by its own read timeout.
        started_rx.await.map_err(|_| Error::NotConnected)?;

        // The IO task enforces the real timeouts; this only guards against a
        // wedged transport.
        let budget = self.config.settle_delay + self.config.read_timeout + REPLY_MARGIN;
        match tokio::time::timeout(budget, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Shut down the IO task and recover the transport.
    ///
    /// Requests already queued ahead of the shutdown are completed first.
    pub async fn shutdown(&mut self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Request::Shutdown { reply: reply_tx })
            .await;
        let transport = reply_rx.await.map_err(|_| Error::NotConnected)?;
        let _ = (&mut self.task).await;
        Ok(transport)
    }
}

/// Spawn the IO task. Returns the handle for submitting exchanges.
pub(crate) fn spawn_io_task(transport: Box<dyn Transport>, config: IoConfig) -> LinkIo {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Request>(32);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(io_loop(transport, config, cmd_rx, cancel.clone()));

    LinkIo {
        cmd_tx,
        cancel,
        task,
        config,
    }
}

/// The main IO loop. Runs as a spawned Tokio task.
///
/// Cancellation is checked before each request is taken off the channel, so
/// an exchange that has already started is never interrupted.
async fn io_loop(
    mut transport: Box<dyn Transport>,
    config: IoConfig,
    mut cmd_rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("IO task cancelled");
                break;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Request::Exchange { frame, started, reply }) => {
                        if reply.is_closed() {
                            debug!(data = ?frame, "caller gone, dropping queued frame");
                            continue;
                        }
                        let _ = started.send(());
                        let result = execute_exchange(&mut *transport, &frame, &config).await;
                        let _ = reply.send(result);
                    }
                    Some(Request::Shutdown { reply }) => {
                        debug!("IO task shutdown requested");
                        let _ = reply.send(transport);
                        return;
                    }
                    None => {
                        debug!("all command senders dropped, exiting IO task");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = transport.close().await {
        tracing::warn!(error = %e, "failed to close transport");
    }
}

/// Write one frame, settle, and read back one validated response frame.
async fn execute_exchange(
    transport: &mut dyn Transport,
    frame: &[u8; FRAME_LEN],
    config: &IoConfig,
) -> Result<[u8; FRAME_LEN]> {
    transport.send(frame).await?;
    tokio::time::sleep(config.settle_delay).await;

    let mut buf = [0u8; FRAME_LEN];
    read_frame(transport, &mut buf, config.read_timeout).await?;
    frame::decode_and_validate(&buf).inspect_err(|e| {
        tracing::warn!(error = %e, data = ?buf, "discarding corrupt response frame");
    })
}

/// Fill `buf` with exactly one frame, accumulating partial reads.
///
/// Fails with [`Error::Timeout`] if nothing at all arrives before the
/// deadline and with [`Error::ShortRead`] if only part of a frame does.
async fn read_frame(
    transport: &mut dyn Transport,
    buf: &mut [u8; FRAME_LEN],
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut filled = 0;

    while filled < FRAME_LEN {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match transport.receive(&mut buf[filled..], remaining).await {
            Ok(n) => filled += n,
            Err(Error::Timeout) => break,
            Err(e) => return Err(e),
        }
    }

    match filled {
        FRAME_LEN => Ok(()),
        0 => Err(Error::Timeout),
        received => {
            debug!(received, data = ?&buf[..received], "short response frame");
            Err(Error::ShortRead {
                expected: FRAME_LEN,
                received,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use jlip_test_harness::MockTransport;

    fn test_config() -> IoConfig {
        IoConfig {
            settle_delay: Duration::from_millis(100),
            read_timeout: Duration::from_secs(2),
        }
    }

    fn stop_frame() -> [u8; FRAME_LEN] {
        encode(1, &[0x08, 0x44, 0x60]).unwrap()
    }

    fn accepted_frame() -> [u8; FRAME_LEN] {
        encode(1, &[0x03]).unwrap()
    }

    #[tokio::test]
    async fn link_io_exchange_not_connected() {
        let (cmd_tx, _) = mpsc::channel::<Request>(1);
        let io = LinkIo {
            cmd_tx,
            cancel: CancellationToken::new(),
            task: tokio::spawn(async {}),
            config: test_config(),
        };
        let result = io.exchange(stop_frame()).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_basic_exchange() {
        let mut mock = MockTransport::new();
        mock.expect(&stop_frame(), &accepted_frame());

        let io = spawn_io_task(Box::new(mock), test_config());
        let response = io.exchange(stop_frame()).await.unwrap();
        assert_eq!(response, accepted_frame());
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_waits_settle_delay() {
        let mut mock = MockTransport::new();
        mock.expect(&stop_frame(), &accepted_frame());

        let io = spawn_io_task(Box::new(mock), test_config());
        let start = Instant::now();
        io.exchange(stop_frame()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_reassembles_chunked_response() {
        let mut mock = MockTransport::new().with_chunk_size(4);
        mock.expect(&stop_frame(), &accepted_frame());

        let io = spawn_io_task(Box::new(mock), test_config());
        let response = io.exchange(stop_frame()).await.unwrap();
        assert_eq!(response, accepted_frame());
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_silence_is_timeout() {
        let mut mock = MockTransport::new();
        mock.expect_silence(&stop_frame());

        let io = spawn_io_task(Box::new(mock), test_config());
        let result = io.exchange(stop_frame()).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_partial_frame_is_short_read() {
        let mut mock = MockTransport::new();
        mock.expect(&stop_frame(), &accepted_frame()[..6]);

        let io = spawn_io_task(Box::new(mock), test_config());
        let result = io.exchange(stop_frame()).await;
        assert!(matches!(
            result,
            Err(Error::ShortRead {
                expected: FRAME_LEN,
                received: 6
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_corrupt_response_is_checksum_mismatch() {
        let mut corrupt = accepted_frame();
        corrupt[5] ^= 0x01;
        let mut mock = MockTransport::new();
        mock.expect(&stop_frame(), &corrupt);

        let io = spawn_io_task(Box::new(mock), test_config());
        let result = io.exchange(stop_frame()).await;
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_transport_error_propagates() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x00], &[]);

        let io = spawn_io_task(Box::new(mock), test_config());
        let result = io.exchange(stop_frame()).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_queue_wait_is_not_charged_to_caller() {
        let play = encode(1, &[0x08, 0x43, 0x75]).unwrap();
        let mut mock = MockTransport::new();
        mock.expect_silence(&stop_frame());
        mock.expect_silence(&stop_frame());
        mock.expect(&play, &accepted_frame());

        let io = spawn_io_task(Box::new(mock), test_config());
        let start = Instant::now();
        let (first, second, third) = tokio::join!(
            io.exchange(stop_frame()),
            io.exchange(stop_frame()),
            io.exchange(play),
        );

        assert!(matches!(first, Err(Error::Timeout)));
        assert!(matches!(second, Err(Error::Timeout)));
        // Queued behind two full read timeouts, yet still answered.
        assert_eq!(third.unwrap(), accepted_frame());
        assert!(start.elapsed() >= Duration::from_millis(4300));
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_skips_abandoned_requests() {
        let play = encode(1, &[0x08, 0x43, 0x75]).unwrap();
        let nop = encode(1, &[0x7C, 0x4E, 0x20]).unwrap();
        let mut mock = MockTransport::new();
        mock.expect_silence(&stop_frame());
        mock.expect(&play, &accepted_frame());
        let handle = mock.handle();

        let io = spawn_io_task(Box::new(mock), test_config());
        let (first, abandoned) = tokio::join!(
            io.exchange(stop_frame()),
            tokio::time::timeout(Duration::from_millis(500), io.exchange(nop)),
        );
        assert!(matches!(first, Err(Error::Timeout)));
        assert!(abandoned.is_err());

        assert_eq!(io.exchange(play).await.unwrap(), accepted_frame());
        assert_eq!(handle.sent_data(), vec![stop_frame().to_vec(), play.to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_shutdown_recovers_transport() {
        let mut mock = MockTransport::new();
        mock.expect(&stop_frame(), &accepted_frame());
        let handle = mock.handle();

        let mut io = spawn_io_task(Box::new(mock), test_config());
        io.exchange(stop_frame()).await.unwrap();

        let transport = io.shutdown().await.unwrap();
        assert!(transport.is_connected());
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn io_task_cancel_closes_transport() {
        let mock = MockTransport::new();
        let handle = mock.handle();

        let io = spawn_io_task(Box::new(mock), test_config());
        io.cancel.cancel();
        io.task.await.unwrap();

        assert_eq!(handle.sent_count(), 0);
        let result = io.cmd_tx.send(Request::Shutdown {
            reply: oneshot::channel().0,
        });
        assert!(result.await.is_err());
    }
}
