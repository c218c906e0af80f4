//! Typed views over JLIP response frames.
//!
//! Every response is an 11-byte frame whose byte 3 carries the command
//! status and whose bytes 4..10 carry six bytes of command-specific return
//! data. The caller knows which command it sent, so it picks the decoder;
//! nothing here inspects the payload to guess the response kind.
//!
//! All decoders are pure functions of the input bytes.

use std::fmt;

use jlip_core::{Band, CommandStatus, Error, FrameRate, Result, VtrMode};

use crate::frame::FRAME_LEN;

/// Number of command-specific return data bytes in a response.
pub const RETURN_DATA_LEN: usize = 6;

/// Real-channel byte value meaning "not tuned to a preset bank".
pub const BANK_NUMBER_NONE: u8 = 0x51;

/// Offset subtracted from the bank byte to get the bank number.
const BANK_OFFSET: i16 = 100;

const STATUS_INDEX: usize = 3;
const DATA_START: usize = 4;

/// Format return data as `[0x01, 0x02, ...]`.
fn fmt_return_data(data: &[u8]) -> String {
    let bytes: Vec<String> = data.iter().map(|b| format!("0x{b:02x}")).collect();
    format!("[{}]", bytes.join(", "))
}

fn malformed_len(len: usize) -> Error {
    Error::MalformedResponse(format!("expected {FRAME_LEN} response bytes, got {len}"))
}

// ---------------------------------------------------------------
// Raw response
// ---------------------------------------------------------------

/// An undecoded response frame.
///
/// Unlike the typed views, a `RawResponse` never fails on reserved status
/// values, so callers that deliberately skip error raising (bus probes) can
/// inspect whatever the device sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawResponse([u8; FRAME_LEN]);

impl RawResponse {
    /// Wrap a response buffer, failing with [`Error::MalformedResponse`]
    /// unless it is exactly one frame long.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let frame: [u8; FRAME_LEN] = buf.try_into().map_err(|_| malformed_len(buf.len()))?;
        Ok(RawResponse(frame))
    }

    pub(crate) fn from_frame(frame: [u8; FRAME_LEN]) -> Self {
        RawResponse(frame)
    }

    /// The full frame, including header and checksum.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// JLIP id of the responding device.
    pub fn jlip_id(&self) -> u8 {
        self.0[2]
    }

    /// The raw three status bits.
    pub fn status_bits(&self) -> u8 {
        self.0[STATUS_INDEX] & CommandStatus::MASK
    }

    /// The decoded status, or `None` for a reserved value.
    pub fn status(&self) -> Option<CommandStatus> {
        CommandStatus::from_bits(self.0[STATUS_INDEX])
    }

    /// The six command-specific return data bytes.
    pub fn return_data(&self) -> [u8; RETURN_DATA_LEN] {
        let mut data = [0u8; RETURN_DATA_LEN];
        data.copy_from_slice(&self.0[DATA_START..DATA_START + RETURN_DATA_LEN]);
        data
    }

    /// The checksum byte carried by the frame.
    pub fn checksum(&self) -> u8 {
        self.0[FRAME_LEN - 1]
    }
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "jlip_id={} status_bits={} return_data={}",
            self.jlip_id(),
            self.status_bits(),
            fmt_return_data(&self.return_data())
        )
    }
}

// ---------------------------------------------------------------
// Generic response
// ---------------------------------------------------------------

/// A response with a known status and uninterpreted return data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResponse {
    raw: RawResponse,
    status: CommandStatus,
}

impl CommandResponse {
    /// Decode the status of a response frame.
    ///
    /// Fails with [`Error::MalformedResponse`] if `buf` is not one frame
    /// long or carries a reserved status.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let raw = RawResponse::from_bytes(buf)?;
        let status = raw.status().ok_or_else(|| {
            Error::MalformedResponse(format!("reserved command status {}", raw.status_bits()))
        })?;
        Ok(CommandResponse { raw, status })
    }

    /// The undecoded frame.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Command status reported by the device.
    pub fn status(&self) -> CommandStatus {
        self.status
    }

    /// JLIP id of the responding device.
    pub fn jlip_id(&self) -> u8 {
        self.raw.jlip_id()
    }

    /// The checksum byte carried by the frame.
    pub fn checksum(&self) -> u8 {
        self.raw.checksum()
    }

    /// The six command-specific return data bytes.
    pub fn return_data(&self) -> [u8; RETURN_DATA_LEN] {
        self.raw.return_data()
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} checksum=0x{:02x} return_data={}",
            self.status,
            self.checksum(),
            fmt_return_data(&self.return_data())
        )
    }
}

// ---------------------------------------------------------------
// VTR mode
// ---------------------------------------------------------------

/// Tape counter as reported by the deck.
///
/// Fields are copied verbatim: hours, minutes and seconds run 0-99 and the
/// frame field runs up to the frame rate, each independently. No carrying
/// between fields is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapeCounter {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
}

impl fmt::Display for TapeCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hour, self.minute, self.second, self.frame
        )
    }
}

/// Decoded answer to the VTR mode query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtrModeResponse {
    pub response: CommandResponse,
    /// Current tape transport mode.
    pub vtr_mode: VtrMode,
    /// Whether a cassette is loaded.
    pub tape_inserted: bool,
    /// Whether the loaded cassette can be recorded on (tab intact).
    pub recordable: bool,
    /// Frame rate the counter runs at.
    pub frame_rate: FrameRate,
    /// Whether drop-frame counting is enabled.
    pub drop_frame: bool,
    /// Tape counter.
    pub counter: TapeCounter,
}

impl VtrModeResponse {
    const NO_TAPE_BIT: u8 = 1 << 4;
    const WRITE_PROTECT_BIT: u8 = 1 << 5;
    const DROP_FRAME_BIT: u8 = 1 << 0;
    const PAL_BIT: u8 = 1 << 2;

    /// Decode a VTR mode response frame.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let response = CommandResponse::decode(buf)?;
        let data = response.return_data();

        let vtr_mode = VtrMode::from_bits(data[0]).ok_or_else(|| {
            Error::MalformedResponse(format!("unknown VTR mode nibble {:#03x}", data[0] & 0x0F))
        })?;
        let frame_rate = if data[1] & Self::PAL_BIT != 0 {
            FrameRate::Pal
        } else {
            FrameRate::Ntsc
        };

        Ok(VtrModeResponse {
            response,
            vtr_mode,
            tape_inserted: data[0] & Self::NO_TAPE_BIT == 0,
            recordable: data[0] & Self::WRITE_PROTECT_BIT == 0,
            frame_rate,
            drop_frame: data[1] & Self::DROP_FRAME_BIT != 0,
            counter: TapeCounter {
                hour: data[2],
                minute: data[3],
                second: data[4],
                frame: data[5],
            },
        })
    }

    /// Whether the tape is NTSC (30 fps).
    pub fn is_ntsc(&self) -> bool {
        self.frame_rate == FrameRate::Ntsc
    }

    /// Whether the tape is PAL (25 fps).
    pub fn is_pal(&self) -> bool {
        self.frame_rate == FrameRate::Pal
    }
}

impl fmt::Display for VtrModeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vtr_mode={} counter={} framerate={} drop_frame={} tape_inserted={} recordable={}",
            self.response,
            self.vtr_mode,
            self.counter,
            self.frame_rate,
            self.drop_frame,
            self.tape_inserted,
            self.recordable
        )
    }
}

// ---------------------------------------------------------------
// Tuner mode
// ---------------------------------------------------------------

/// A tuner preset addressed by bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetChannel {
    /// Bank number (bank byte minus 100).
    pub bank: i16,
    /// Channel within the bank.
    pub channel: u8,
}

/// Decoded answer to the tuner mode query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunerModeResponse {
    pub response: CommandResponse,
    pub band: Band,
    /// Direct two-digit channel number, or [`BANK_NUMBER_NONE`].
    pub real_channel: u8,
    /// Bank and channel, absent when `real_channel` is the no-bank sentinel.
    pub preset: Option<PresetChannel>,
    /// Bank and channel bytes read as one decimal number.
    pub channel_number_non_bank: u16,
}

impl TunerModeResponse {
    /// Decode a tuner mode response frame.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let response = CommandResponse::decode(buf)?;
        let data = response.return_data();

        let band = Band::from_byte(data[0]).ok_or_else(|| {
            Error::MalformedResponse(format!("unknown band byte 0x{:02x}", data[0]))
        })?;
        let real_channel = data[1];
        let preset = (real_channel != BANK_NUMBER_NONE).then(|| PresetChannel {
            bank: i16::from(data[2]) - BANK_OFFSET,
            channel: data[3],
        });

        Ok(TunerModeResponse {
            response,
            band,
            real_channel,
            preset,
            channel_number_non_bank: u16::from(data[2]) * 100 + u16::from(data[3]),
        })
    }

    /// Bank number, if tuned by bank.
    pub fn bank_number(&self) -> Option<i16> {
        self.preset.map(|p| p.bank)
    }

    /// Channel within the bank, if tuned by bank.
    pub fn channel_number_by_bank(&self) -> Option<u8> {
        self.preset.map(|p| p.channel)
    }
}

impl fmt::Display for TunerModeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} band={} real_channel={}", self.response, self.band, self.real_channel)?;
        match self.preset {
            Some(p) => write!(f, " bank={} channel_by_bank={}", p.bank, p.channel)?,
            None => write!(f, " bank=none")?,
        }
        write!(f, " channel_non_bank={}", self.channel_number_non_bank)
    }
}

// ---------------------------------------------------------------
// Power state
// ---------------------------------------------------------------

/// Decoded answer to the power state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerStateResponse {
    pub response: CommandResponse,
    pub is_on: bool,
}

impl PowerStateResponse {
    /// Decode a power state response frame.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let response = CommandResponse::decode(buf)?;
        Ok(PowerStateResponse {
            response,
            is_on: response.return_data()[0] & 0x01 != 0,
        })
    }
}

impl fmt::Display for PowerStateResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is_on={}", self.response, self.is_on)
    }
}

// ---------------------------------------------------------------
// Device name
// ---------------------------------------------------------------

/// Decoded answer to the device name query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNameResponse {
    pub response: CommandResponse,
    /// Return data read as ASCII, with trailing NUL padding removed.
    pub name: String,
}

impl DeviceNameResponse {
    /// Decode a device name response frame.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let response = CommandResponse::decode(buf)?;
        let name: String = response
            .return_data()
            .iter()
            .map(|&b| char::from(b))
            .collect();
        Ok(DeviceNameResponse {
            response,
            name: name.trim_end_matches('\0').to_string(),
        })
    }
}

impl fmt::Display for DeviceNameResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} name=\"{}\"", self.response, self.name)
    }
}

// ---------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------

/// Any decoded response, tagged by the command that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Generic(CommandResponse),
    VtrMode(VtrModeResponse),
    TunerMode(TunerModeResponse),
    PowerState(PowerStateResponse),
    DeviceName(DeviceNameResponse),
}

impl Response {
    /// The status and raw frame common to every variant.
    pub fn command_response(&self) -> &CommandResponse {
        match self {
            Response::Generic(r) => r,
            Response::VtrMode(r) => &r.response,
            Response::TunerMode(r) => &r.response,
            Response::PowerState(r) => &r.response,
            Response::DeviceName(r) => &r.response,
        }
    }

    /// Command status reported by the device.
    pub fn status(&self) -> CommandStatus {
        self.command_response().status()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Generic(r) => r.fmt(f),
            Response::VtrMode(r) => r.fmt(f),
            Response::TunerMode(r) => r.fmt(f),
            Response::PowerState(r) => r.fmt(f),
            Response::DeviceName(r) => r.fmt(f),
        }
    }
}

impl From<CommandResponse> for Response {
    fn from(r: CommandResponse) -> Self {
        Response::Generic(r)
    }
}

impl From<VtrModeResponse> for Response {
    fn from(r: VtrModeResponse) -> Self {
        Response::VtrMode(r)
    }
}

impl From<TunerModeResponse> for Response {
    fn from(r: TunerModeResponse) -> Self {
        Response::TunerMode(r)
    }
}

impl From<PowerStateResponse> for Response {
    fn from(r: PowerStateResponse) -> Self {
        Response::PowerState(r)
    }
}

impl From<DeviceNameResponse> for Response {
    fn from(r: DeviceNameResponse) -> Self {
        Response::DeviceName(r)
    }
}
