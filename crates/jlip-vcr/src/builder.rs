//! VcrBuilder -- fluent builder for [`JlipVcr`] and [`JlipLink`].
//!
//! Separates configuration from construction so that callers can set the
//! serial port, JLIP id, status policy, timing and shared limiters before
//! the port is opened.
//!
//! # Example
//!
//! ```no_run
//! use jlip_vcr::VcrBuilder;
//!
//! # async fn example() -> jlip_core::Result<()> {
//! let vcr = VcrBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .jlip_id(1)
//!     .build()
//!     .await?;
//! let mode = vcr.get_vtr_mode(false).await?;
//! println!("{mode}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use jlip_core::error::{Error, Result};
use jlip_core::transport::Transport;
use jlip_transport::{SerialConfig, SerialTransport};

use crate::frame::validate_jlip_id;
use crate::limiter::Limiters;
use crate::link::{DEFAULT_READ_TIMEOUT, DEFAULT_SETTLE_DELAY, JlipLink};
use crate::vcr::JlipVcr;

/// Fluent builder for [`JlipVcr`].
///
/// Defaults: JLIP id 1, raising on error responses, 100 ms settle delay,
/// 2 s read timeout, fresh 2/s and 10/s limiters, and the JLIP serial line
/// settings at 9600 baud.
pub struct VcrBuilder {
    serial_port: Option<String>,
    serial_config: SerialConfig,
    jlip_id: u8,
    raise_on_error_response: bool,
    settle_delay: Duration,
    read_timeout: Duration,
    limiters: Option<Limiters>,
}

impl VcrBuilder {
    pub fn new() -> Self {
        VcrBuilder {
            serial_port: None,
            serial_config: SerialConfig::jlip(),
            jlip_id: 1,
            raise_on_error_response: true,
            settle_delay: DEFAULT_SETTLE_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            limiters: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate. Parity, flow control and framing stay fixed.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.serial_config.baud_rate = baud;
        self
    }

    /// Address commands to this JLIP id (1-99, default 1).
    pub fn jlip_id(mut self, id: u8) -> Self {
        self.jlip_id = id;
        self
    }

    /// Fail calls whose response status is not accepted (default: true).
    pub fn raise_on_error_response(mut self, raise: bool) -> Self {
        self.raise_on_error_response = raise;
        self
    }

    /// Pause between writing a command and reading its response
    /// (default: 100 ms).
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Time allowed for a full response frame (default: 2 s).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Charge exchanges against existing limiters, so that several links on
    /// one physical bus share its budget.
    pub fn limiters(mut self, limiters: Limiters) -> Self {
        self.limiters = Some(limiters);
        self
    }

    /// Build a [`JlipVcr`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `jlip-test-harness`). Fails with [`Error::InvalidArgument`] if the
    /// configured JLIP id is outside 1-99.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<JlipVcr> {
        validate_jlip_id(self.jlip_id)?;
        let jlip_id = self.jlip_id;
        let link = self.build_link_with_transport(transport).await?;
        Ok(JlipVcr::new(link, jlip_id))
    }

    /// Build a [`JlipVcr`] on the configured serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<JlipVcr> {
        validate_jlip_id(self.jlip_id)?;
        let transport = self.open_serial().await?;
        self.build_with_transport(transport).await
    }

    /// Build a bare [`JlipLink`] with a caller-provided transport.
    ///
    /// The JLIP id setting is ignored; a link addresses ids per call.
    pub async fn build_link_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<JlipLink> {
        Ok(JlipLink::new(
            transport,
            self.limiters.unwrap_or_default(),
            self.settle_delay,
            self.read_timeout,
            self.raise_on_error_response,
        ))
    }

    /// Build a bare [`JlipLink`] on the configured serial port.
    pub async fn build_link(self) -> Result<JlipLink> {
        let transport = self.open_serial().await?;
        self.build_link_with_transport(transport).await
    }

    async fn open_serial(&self) -> Result<Box<dyn Transport>> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("serial_port is required for build()".into()))?;
        let transport = SerialTransport::open_with_config(port, self.serial_config).await?;
        Ok(Box::new(transport))
    }
}

impl Default for VcrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use jlip_test_harness::MockTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn builder_defaults() {
        let vcr = VcrBuilder::new()
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(vcr.jlip_id(), 1);
        assert!(vcr.raise_on_error_response());
        assert_eq!(
            vcr.limiters().normal.interval(),
            Duration::from_millis(500)
        );
    }

    #[tokio::test]
    async fn builder_rejects_out_of_range_id() {
        for id in [0, 100] {
            let result = VcrBuilder::new()
                .jlip_id(id)
                .build_with_transport(Box::new(MockTransport::new()))
                .await;
            assert!(matches!(result, Err(Error::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = VcrBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn builder_fluent_chain() {
        let mut mock = MockTransport::new();
        mock.expect(
            &encode(42, &[0x08, 0x44, 0x60]).unwrap(),
            &encode(42, &[0x05]).unwrap(),
        );

        let vcr = VcrBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(19_200)
            .jlip_id(42)
            .raise_on_error_response(false)
            .settle_delay(Duration::from_millis(50))
            .read_timeout(Duration::from_millis(500))
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        assert_eq!(vcr.jlip_id(), 42);
        assert!(!vcr.stop().await.unwrap().status().is_accepted());
    }

    #[tokio::test]
    async fn shared_limiters_are_reused() {
        let limiters = Limiters::default();
        let a = VcrBuilder::new()
            .limiters(limiters.clone())
            .build_link_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();
        let b = VcrBuilder::new()
            .jlip_id(2)
            .limiters(limiters.clone())
            .build_link_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&a.limiters().normal, &b.limiters().normal));
        assert!(Arc::ptr_eq(&a.limiters().fast, &limiters.fast));
    }
}
