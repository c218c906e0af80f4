//! One serial bus carrying JLIP traffic.
//!
//! A [`JlipLink`] owns the IO task for one transport and the pair of rate
//! limiters every exchange is charged against. Several devices can hang off
//! the same bus, so the target JLIP id is chosen per call.

use std::time::Duration;

use tracing::debug;

use jlip_core::{Error, Result, Transport};

use crate::frame::encode;
use crate::io::{IoConfig, LinkIo, spawn_io_task};
use crate::limiter::{Limiters, Speed};
use crate::response::RawResponse;

/// Default pause between writing a command and reading its response.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default time allowed for a full response frame to arrive.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected JLIP bus.
///
/// Constructed via [`VcrBuilder`](crate::builder::VcrBuilder). Exchanges
/// submitted from several tasks are serialized by the IO task in arrival
/// order.
pub struct JlipLink {
    io: LinkIo,
    limiters: Limiters,
    raise_on_error_response: bool,
}

impl Drop for JlipLink {
    fn drop(&mut self) {
        // The IO task exits at its next select iteration. An exchange already
        // on the wire runs to completion first.
        self.io.cancel.cancel();
    }
}

impl JlipLink {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        limiters: Limiters,
        settle_delay: Duration,
        read_timeout: Duration,
        raise_on_error_response: bool,
    ) -> Self {
        let io = spawn_io_task(
            transport,
            IoConfig {
                settle_delay,
                read_timeout,
            },
        );
        JlipLink {
            io,
            limiters,
            raise_on_error_response,
        }
    }

    /// Whether [`send`](Self::send) fails on non-accepted statuses.
    pub fn raise_on_error_response(&self) -> bool {
        self.raise_on_error_response
    }

    /// Change the status policy applied by [`send`](Self::send).
    pub fn set_raise_on_error_response(&mut self, raise: bool) {
        self.raise_on_error_response = raise;
    }

    /// The limiters this link charges its exchanges against.
    pub fn limiters(&self) -> &Limiters {
        &self.limiters
    }

    /// Send one command and return the device's response, whatever its
    /// status.
    ///
    /// The payload is encoded before a rate limiter slot is taken, so an
    /// oversized payload fails with [`Error::InvalidArgument`] without
    /// delay. Wire integrity failures ([`Error::ChecksumMismatch`],
    /// [`Error::ShortRead`], [`Error::Timeout`]) are always returned.
    pub async fn exchange(
        &self,
        device_id: u8,
        payload: &[u8],
        speed: Speed,
    ) -> Result<RawResponse> {
        let frame = encode(device_id, payload)?;

        self.limiters.for_speed(speed).acquire().await;

        debug!(device_id, ?speed, payload = ?payload, "sending JLIP command");
        let response = RawResponse::from_frame(self.io.exchange(frame).await?);
        debug!(
            device_id = response.jlip_id(),
            status_bits = response.status_bits(),
            data = ?response.return_data(),
            "received JLIP response"
        );
        Ok(response)
    }

    /// Send one command, applying the link's status policy.
    ///
    /// With raising enabled, a response whose status is not accepted fails
    /// with [`Error::CommandRejected`], and one with a reserved status fails
    /// with [`Error::MalformedResponse`]. With raising disabled this behaves
    /// exactly like [`exchange`](Self::exchange).
    pub async fn send(&self, device_id: u8, payload: &[u8], speed: Speed) -> Result<RawResponse> {
        let response = self.exchange(device_id, payload, speed).await?;
        if self.raise_on_error_response {
            check_status(&response)?;
        }
        Ok(response)
    }

    /// Stop the IO task and hand back the transport.
    pub async fn shutdown(mut self) -> Result<Box<dyn Transport>> {
        self.io.shutdown().await
    }
}

/// Fail unless `response` carries an accepted status.
fn check_status(response: &RawResponse) -> Result<()> {
    match response.status() {
        Some(status) if status.is_accepted() => Ok(()),
        Some(status) => {
            tracing::warn!(%status, device_id = response.jlip_id(), "command rejected");
            Err(Error::CommandRejected { status })
        }
        None => Err(Error::MalformedResponse(format!(
            "reserved command status {}",
            response.status_bits()
        ))),
    }
}
