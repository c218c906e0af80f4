//! JlipVcr -- command facade for one JVC VCR on a JLIP bus.
//!
//! Every method sends one fixed opcode sequence through the
//! [`JlipLink`] and decodes the answer with the decoder matching the
//! command. Queries return their typed view; everything else returns a
//! [`CommandResponse`].

use std::fmt;
use std::str::FromStr;

use jlip_core::{Band, Error, Result, Transport};

use crate::commands;
use crate::limiter::{Limiters, Speed};
use crate::link::JlipLink;
use crate::response::{
    CommandResponse, DeviceNameResponse, PowerStateResponse, RawResponse, Response,
    TunerModeResponse, VtrModeResponse,
};

/// A JVC VCR addressed by its JLIP id.
///
/// Constructed via [`VcrBuilder`](crate::builder::VcrBuilder).
pub struct JlipVcr {
    link: JlipLink,
    jlip_id: u8,
}

impl JlipVcr {
    pub(crate) fn new(link: JlipLink, jlip_id: u8) -> Self {
        JlipVcr { link, jlip_id }
    }

    /// The JLIP id commands are addressed to.
    pub fn jlip_id(&self) -> u8 {
        self.jlip_id
    }

    /// Whether non-accepted statuses fail the call.
    pub fn raise_on_error_response(&self) -> bool {
        self.link.raise_on_error_response()
    }

    /// The limiters shared with the underlying link.
    pub fn limiters(&self) -> &Limiters {
        self.link.limiters()
    }

    /// The underlying bus.
    pub fn link(&self) -> &JlipLink {
        &self.link
    }

    /// Stop the IO task and hand back the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        self.link.shutdown().await
    }

    /// Send an arbitrary payload through the normal limiter.
    pub async fn send_command(&self, payload: &[u8]) -> Result<RawResponse> {
        self.link.send(self.jlip_id, payload, Speed::Normal).await
    }

    /// Send an arbitrary payload through the fast limiter.
    pub async fn send_command_fast(&self, payload: &[u8]) -> Result<RawResponse> {
        self.link.send(self.jlip_id, payload, Speed::Fast).await
    }

    async fn command(&self, payload: Vec<u8>) -> Result<CommandResponse> {
        let raw = self.send_command(&payload).await?;
        CommandResponse::decode(raw.as_bytes())
    }

    // ---------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------

    pub async fn eject(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_eject()).await
    }

    pub async fn stop(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_stop()).await
    }

    pub async fn play(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_play()).await
    }

    pub async fn pause(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_pause()).await
    }

    pub async fn rewind(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_rewind()).await
    }

    pub async fn fast_forward(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_fast_forward()).await
    }

    pub async fn record(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_record()).await
    }

    pub async fn pause_recording(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_pause_recording()).await
    }

    pub async fn fast_play_forward(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_fast_play_forward()).await
    }

    pub async fn fast_play_backward(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_fast_play_backward()).await
    }

    pub async fn slow_play_forward(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_slow_play_forward()).await
    }

    pub async fn slow_play_backward(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_slow_play_backward()).await
    }

    pub async fn frame_step(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_frame_step()).await
    }

    pub async fn frame_step_back(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_frame_step_back()).await
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Query the transport mode and tape counter.
    ///
    /// Pass `fast = true` when polling frequently; the query is then
    /// charged against the 10/s limiter instead of the 2/s one.
    pub async fn get_vtr_mode(&self, fast: bool) -> Result<VtrModeResponse> {
        let payload = commands::cmd_get_vtr_mode();
        let raw = if fast {
            self.send_command_fast(&payload).await?
        } else {
            self.send_command(&payload).await?
        };
        VtrModeResponse::decode(raw.as_bytes())
    }

    pub async fn get_tuner_mode(&self) -> Result<TunerModeResponse> {
        let raw = self.send_command(&commands::cmd_get_tuner_mode()).await?;
        TunerModeResponse::decode(raw.as_bytes())
    }

    pub async fn get_power_state(&self) -> Result<PowerStateResponse> {
        let raw = self.send_command(&commands::cmd_get_power_state()).await?;
        PowerStateResponse::decode(raw.as_bytes())
    }

    pub async fn get_device_name(&self) -> Result<DeviceNameResponse> {
        let raw = self.send_command(&commands::cmd_get_device_name()).await?;
        DeviceNameResponse::decode(raw.as_bytes())
    }

    pub async fn get_device_code(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_get_device_code()).await
    }

    pub async fn get_machine_code(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_get_machine_code()).await
    }

    /// The reported rate is informational only; the link speed is fixed.
    pub async fn get_baud_rate_supported(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_get_baud_rate_supported()).await
    }

    pub async fn get_input(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_get_input()).await
    }

    pub async fn get_play_speed(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_get_play_speed()).await
    }

    pub async fn nop(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_nop()).await
    }

    // ---------------------------------------------------------------
    // Power and settings
    // ---------------------------------------------------------------

    pub async fn turn_on(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_turn_on()).await
    }

    pub async fn turn_off(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_turn_off()).await
    }

    pub async fn reset_counter(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_reset_counter()).await
    }

    pub async fn set_record_mode(&self, mode: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_set_record_mode(mode)).await
    }

    pub async fn set_record_speed(&self, speed: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_set_record_speed(speed)).await
    }

    pub async fn set_input(&self, n: u8, nn: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_set_input(n, nn)).await
    }

    /// Reassign the deck's JLIP id.
    ///
    /// Fails with [`Error::InvalidArgument`] for ids outside 1-99 without
    /// touching the wire. This handle keeps addressing the old id; build a
    /// new one to talk to the deck afterwards.
    pub async fn set_jlip_id(&self, id: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_set_jlip_id(id)?).await
    }

    // ---------------------------------------------------------------
    // Tuner
    // ---------------------------------------------------------------

    /// Tune preset `channel` (1-99).
    pub async fn set_channel(&self, channel: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_set_channel(channel)?).await
    }

    pub async fn select_band(&self, band: Band) -> Result<CommandResponse> {
        self.command(commands::cmd_select_band(band)).await
    }

    pub async fn select_preset_channel(&self, n: u8, nn: u8, nnn: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_select_preset_channel(n, nn, nnn))
            .await
    }

    pub async fn select_real_channel(&self, n: u8, nn: u8, nnn: u8) -> Result<CommandResponse> {
        self.command(commands::cmd_select_real_channel(n, nn, nnn))
            .await
    }

    pub async fn preset_channel_up(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_preset_channel_up()).await
    }

    pub async fn preset_channel_down(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_preset_channel_down()).await
    }

    pub async fn real_channel_up(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_real_channel_up()).await
    }

    pub async fn real_channel_down(&self) -> Result<CommandResponse> {
        self.command(commands::cmd_real_channel_down()).await
    }

    // ---------------------------------------------------------------
    // Named dispatch
    // ---------------------------------------------------------------

    /// Run a parameterless command chosen at runtime.
    pub async fn execute(&self, command: VcrCommand) -> Result<Response> {
        use VcrCommand::*;

        let response: Response = match command {
            Eject => self.eject().await?.into(),
            EjectWait => self.eject_and_wait().await?.into(),
            FastForward => self.fast_forward().await?.into(),
            FastPlayBackward => self.fast_play_backward().await?.into(),
            FastPlayForward => self.fast_play_forward().await?.into(),
            FrameStep => self.frame_step().await?.into(),
            FrameStepBack => self.frame_step_back().await?.into(),
            GetBaudRateSupported => self.get_baud_rate_supported().await?.into(),
            GetDeviceCode => self.get_device_code().await?.into(),
            GetDeviceName => self.get_device_name().await?.into(),
            GetInput => self.get_input().await?.into(),
            GetMachineCode => self.get_machine_code().await?.into(),
            GetPlaySpeed => self.get_play_speed().await?.into(),
            GetPowerState => self.get_power_state().await?.into(),
            GetTunerMode => self.get_tuner_mode().await?.into(),
            GetVtrMode => self.get_vtr_mode(false).await?.into(),
            Nop => self.nop().await?.into(),
            Pause => self.pause().await?.into(),
            PauseRecording => self.pause_recording().await?.into(),
            Play => self.play().await?.into(),
            PresetChannelDown => self.preset_channel_down().await?.into(),
            PresetChannelUp => self.preset_channel_up().await?.into(),
            RealChannelDown => self.real_channel_down().await?.into(),
            RealChannelUp => self.real_channel_up().await?.into(),
            Record => self.record().await?.into(),
            ResetCounter => self.reset_counter().await?.into(),
            Rewind => self.rewind().await?.into(),
            RewindWait => self.rewind_and_wait().await?.into(),
            SlowPlayBackward => self.slow_play_backward().await?.into(),
            SlowPlayForward => self.slow_play_forward().await?.into(),
            Stop => self.stop().await?.into(),
            TurnOff => self.turn_off().await?.into(),
            TurnOn => self.turn_on().await?.into(),
        };
        Ok(response)
    }
}

impl fmt::Debug for JlipVcr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JlipVcr")
            .field("jlip_id", &self.jlip_id)
            .field("raise_on_error", &self.raise_on_error_response())
            .finish()
    }
}

/// A parameterless VCR command, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcrCommand {
    Eject,
    EjectWait,
    FastForward,
    FastPlayBackward,
    FastPlayForward,
    FrameStep,
    FrameStepBack,
    GetBaudRateSupported,
    GetDeviceCode,
    GetDeviceName,
    GetInput,
    GetMachineCode,
    GetPlaySpeed,
    GetPowerState,
    GetTunerMode,
    GetVtrMode,
    Nop,
    Pause,
    PauseRecording,
    Play,
    PresetChannelDown,
    PresetChannelUp,
    RealChannelDown,
    RealChannelUp,
    Record,
    ResetCounter,
    Rewind,
    RewindWait,
    SlowPlayBackward,
    SlowPlayForward,
    Stop,
    TurnOff,
    TurnOn,
}

impl VcrCommand {
    /// Every command, in name order.
    pub const ALL: [VcrCommand; 33] = [
        VcrCommand::Eject,
        VcrCommand::EjectWait,
        VcrCommand::FastForward,
        VcrCommand::FastPlayBackward,
        VcrCommand::FastPlayForward,
        VcrCommand::FrameStep,
        VcrCommand::FrameStepBack,
        VcrCommand::GetBaudRateSupported,
        VcrCommand::GetDeviceCode,
        VcrCommand::GetDeviceName,
        VcrCommand::GetInput,
        VcrCommand::GetMachineCode,
        VcrCommand::GetPlaySpeed,
        VcrCommand::GetPowerState,
        VcrCommand::GetTunerMode,
        VcrCommand::GetVtrMode,
        VcrCommand::Nop,
        VcrCommand::Pause,
        VcrCommand::PauseRecording,
        VcrCommand::Play,
        VcrCommand::PresetChannelDown,
        VcrCommand::PresetChannelUp,
        VcrCommand::RealChannelDown,
        VcrCommand::RealChannelUp,
        VcrCommand::Record,
        VcrCommand::ResetCounter,
        VcrCommand::Rewind,
        VcrCommand::RewindWait,
        VcrCommand::SlowPlayBackward,
        VcrCommand::SlowPlayForward,
        VcrCommand::Stop,
        VcrCommand::TurnOff,
        VcrCommand::TurnOn,
    ];

    /// The snake_case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            VcrCommand::Eject => "eject",
            VcrCommand::EjectWait => "eject_wait",
            VcrCommand::FastForward => "fast_forward",
            VcrCommand::FastPlayBackward => "fast_play_backward",
            VcrCommand::FastPlayForward => "fast_play_forward",
            VcrCommand::FrameStep => "frame_step",
            VcrCommand::FrameStepBack => "frame_step_back",
            VcrCommand::GetBaudRateSupported => "get_baud_rate_supported",
            VcrCommand::GetDeviceCode => "get_device_code",
            VcrCommand::GetDeviceName => "get_device_name",
            VcrCommand::GetInput => "get_input",
            VcrCommand::GetMachineCode => "get_machine_code",
            VcrCommand::GetPlaySpeed => "get_play_speed",
            VcrCommand::GetPowerState => "get_power_state",
            VcrCommand::GetTunerMode => "get_tuner_mode",
            VcrCommand::GetVtrMode => "get_vtr_mode",
            VcrCommand::Nop => "nop",
            VcrCommand::Pause => "pause",
            VcrCommand::PauseRecording => "pause_recording",
            VcrCommand::Play => "play",
            VcrCommand::PresetChannelDown => "preset_channel_down",
            VcrCommand::PresetChannelUp => "preset_channel_up",
            VcrCommand::RealChannelDown => "real_channel_down",
            VcrCommand::RealChannelUp => "real_channel_up",
            VcrCommand::Record => "record",
            VcrCommand::ResetCounter => "reset_counter",
            VcrCommand::Rewind => "rewind",
            VcrCommand::RewindWait => "rewind_wait",
            VcrCommand::SlowPlayBackward => "slow_play_backward",
            VcrCommand::SlowPlayForward => "slow_play_forward",
            VcrCommand::Stop => "stop",
            VcrCommand::TurnOff => "turn_off",
            VcrCommand::TurnOn => "turn_on",
        }
    }
}

impl fmt::Display for VcrCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VcrCommand {
    type Err = Error;

    /// Accepts the snake_case name; dashes are treated as underscores.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_");
        VcrCommand::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown command: {s}")))
    }
}
