//! Serial port transport for JLIP devices.
//!
//! JLIP runs over an RS-232 style link with settings fixed by the protocol:
//! odd parity, RTS/CTS hardware flow control, 8 data bits and 1 stop bit.
//! Decks report a supported baud rate when asked, but they do not honor it;
//! the link always runs at the rate the deck was built for (9600 baud on the
//! HR series).
//!
//! # Example
//!
//! ```no_run
//! use jlip_transport::{SerialConfig, SerialTransport};
//!
//! # async fn example() -> jlip_core::Result<()> {
//! let transport = SerialTransport::open_with_config("/dev/ttyUSB0", SerialConfig::jlip()).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use jlip_core::error::{Error, Result};
use jlip_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Baud rate JLIP decks actually communicate at.
pub const JLIP_BAUD_RATE: u32 = 9600;

/// Parity JLIP decks use.
pub const JLIP_PARITY: tokio_serial::Parity = tokio_serial::Parity::Odd;

/// Flow control JLIP decks use (RTS/CTS).
pub const JLIP_FLOW_CONTROL: tokio_serial::FlowControl = tokio_serial::FlowControl::Hardware;

/// Data bits per character.
pub const JLIP_DATA_BITS: tokio_serial::DataBits = tokio_serial::DataBits::Eight;

/// Stop bits per character.
pub const JLIP_STOP_BITS: tokio_serial::StopBits = tokio_serial::StopBits::One;

/// Serial port configuration.
///
/// Only the baud rate is adjustable. Parity, flow control and framing are
/// fixed by the protocol and always use the `JLIP_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
}

impl SerialConfig {
    /// The line settings required by JLIP.
    pub fn jlip() -> Self {
        Self {
            baud_rate: JLIP_BAUD_RATE,
        }
    }

    /// JLIP line settings at a non-standard baud rate.
    pub fn jlip_with_baud(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::jlip()
    }
}

/// Serial port transport for JLIP devices.
///
/// One `SerialTransport` owns one port for its whole lifetime. Several
/// decks can share the port, each answering on its own JLIP id.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the fixed JLIP line settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    pub async fn open_jlip(port: &str) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::jlip()).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?JLIP_DATA_BITS,
            stop_bits = ?JLIP_STOP_BITS,
            parity = ?JLIP_PARITY,
            flow_control = ?JLIP_FLOW_CONTROL,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(JLIP_DATA_BITS)
            .stop_bits(JLIP_STOP_BITS)
            .parity(JLIP_PARITY)
            .flow_control(JLIP_FLOW_CONTROL)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        // RTS is left alone: with hardware flow control the driver owns it.

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn map_io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected
    {
        Error::ConnectionLost
    } else {
        Error::Io(e)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            map_io_error(e)
        })?;

        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(0)) => {
                tracing::warn!(port = %self.port_name, "Serial port returned end of stream");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_default_is_jlip() {
        assert_eq!(SerialConfig::default(), SerialConfig::jlip());
        assert_eq!(SerialConfig::jlip().baud_rate, JLIP_BAUD_RATE);
    }

    #[test]
    fn test_jlip_with_baud() {
        assert_eq!(SerialConfig::jlip_with_baud(19200).baud_rate, 19200);
    }

    #[test]
    fn test_fixed_line_settings() {
        assert_eq!(JLIP_PARITY, tokio_serial::Parity::Odd);
        assert_eq!(JLIP_FLOW_CONTROL, tokio_serial::FlowControl::Hardware);
        assert_eq!(JLIP_DATA_BITS, tokio_serial::DataBits::Eight);
        assert_eq!(JLIP_STOP_BITS, tokio_serial::StopBits::One);
    }

    #[tokio::test]
    async fn test_open_missing_port_is_transport_error() {
        let result = SerialTransport::open_jlip("/dev/does-not-exist-jlip").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
