//! JLIP command payload builders.
//!
//! Each function returns the opcode and operand bytes for one command,
//! without the frame header, device id or checksum; [`crate::frame::encode`]
//! adds those. All functions are pure.
//!
//! Opcodes are three bytes wide: a category byte (`0x08` VTR transport,
//! `0x0A` tuner, `0x3E` power, `0x48` VTR settings, `0x7C` device
//! management) followed by an operation and sub-operation.

use jlip_core::{Band, Result};

use crate::frame::validate_jlip_id;

// ---------------------------------------------------------------
// Category bytes
// ---------------------------------------------------------------

/// VTR transport control.
const CAT_VTR: u8 = 0x08;

/// Tuner control.
const CAT_TUNER: u8 = 0x0A;

/// Power control.
const CAT_POWER: u8 = 0x3E;

/// VTR settings (counter, record mode, frame stepping).
const CAT_VTR_SETTINGS: u8 = 0x48;

/// Device management (id, name, codes).
const CAT_DEVICE: u8 = 0x7C;

/// Trailing marker byte on preset channel commands.
const PRESET_MARKER: u8 = 0x7E;

/// Trailing marker byte on real channel commands.
const REAL_MARKER: u8 = 0x44;

/// Trailing marker byte on the input select command.
const INPUT_MARKER: u8 = 0x7F;

/// Sub-operation byte shared by the status queries.
const QUERY: u8 = 0x20;

/// Lowest channel accepted by [`cmd_set_channel`].
pub const MIN_CHANNEL: u8 = 1;

/// Highest channel accepted by [`cmd_set_channel`].
pub const MAX_CHANNEL: u8 = 99;

// ---------------------------------------------------------------
// Transport
// ---------------------------------------------------------------

pub fn cmd_eject() -> Vec<u8> {
    vec![CAT_VTR, 0x41, 0x60]
}

pub fn cmd_stop() -> Vec<u8> {
    vec![CAT_VTR, 0x44, 0x60]
}

pub fn cmd_play() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x75]
}

pub fn cmd_pause() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x6D]
}

pub fn cmd_rewind() -> Vec<u8> {
    vec![CAT_VTR, 0x44, 0x65]
}

pub fn cmd_fast_forward() -> Vec<u8> {
    vec![CAT_VTR, 0x44, 0x75]
}

pub fn cmd_record() -> Vec<u8> {
    vec![CAT_VTR, 0x42, 0x70]
}

pub fn cmd_pause_recording() -> Vec<u8> {
    vec![CAT_VTR, 0x42, 0x6D]
}

/// Forward search (visible picture, faster than normal play).
pub fn cmd_fast_play_forward() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x21]
}

/// Reverse search.
pub fn cmd_fast_play_backward() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x25]
}

pub fn cmd_slow_play_forward() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x20]
}

pub fn cmd_slow_play_backward() -> Vec<u8> {
    vec![CAT_VTR, 0x43, 0x24]
}

/// Advance one frame. Only meaningful while paused.
pub fn cmd_frame_step() -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x46, 0x75, 0x01]
}

/// Step back one frame. Only meaningful while paused.
pub fn cmd_frame_step_back() -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x46, 0x65, 0x01]
}

// ---------------------------------------------------------------
// Queries
// ---------------------------------------------------------------

/// Query the transport mode and tape counter.
pub fn cmd_get_vtr_mode() -> Vec<u8> {
    vec![CAT_VTR, 0x4E, QUERY]
}

pub fn cmd_get_tuner_mode() -> Vec<u8> {
    vec![CAT_TUNER, 0x4E, QUERY]
}

pub fn cmd_get_power_state() -> Vec<u8> {
    vec![CAT_POWER, 0x4E, QUERY]
}

pub fn cmd_get_device_name() -> Vec<u8> {
    vec![CAT_DEVICE, 0x4C]
}

pub fn cmd_get_device_code() -> Vec<u8> {
    vec![CAT_DEVICE, 0x49]
}

pub fn cmd_get_machine_code() -> Vec<u8> {
    vec![CAT_DEVICE, 0x45]
}

/// Query the baud rate the device claims to support.
///
/// The reported value is informational; decks keep talking at their fixed
/// rate regardless.
pub fn cmd_get_baud_rate_supported() -> Vec<u8> {
    vec![CAT_DEVICE, 0x48, QUERY]
}

pub fn cmd_get_input() -> Vec<u8> {
    vec![CAT_VTR, 0x58, QUERY]
}

pub fn cmd_get_play_speed() -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x4E, QUERY]
}

/// No-operation status query. Any listening device accepts it, which makes
/// it the presence probe.
pub fn cmd_nop() -> Vec<u8> {
    vec![CAT_DEVICE, 0x4E, QUERY]
}

// ---------------------------------------------------------------
// Power and settings
// ---------------------------------------------------------------

pub fn cmd_turn_on() -> Vec<u8> {
    vec![CAT_POWER, 0x40, 0x70]
}

pub fn cmd_turn_off() -> Vec<u8> {
    vec![CAT_POWER, 0x40, 0x60]
}

pub fn cmd_reset_counter() -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x4D, QUERY]
}

/// Select the recording mode. `mode` is the device-specific mode code.
pub fn cmd_set_record_mode(mode: u8) -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x43, mode]
}

/// Select the recording tape speed. `speed` is the device-specific code.
pub fn cmd_set_record_speed(speed: u8) -> Vec<u8> {
    vec![CAT_VTR_SETTINGS, 0x42, speed]
}

/// Select an input source by group (`n`) and index within the group (`nn`).
pub fn cmd_set_input(n: u8, nn: u8) -> Vec<u8> {
    vec![CAT_VTR, 0x59, n, nn, INPUT_MARKER]
}

/// Reassign the device's JLIP id.
///
/// Fails with [`Error::InvalidArgument`](jlip_core::Error::InvalidArgument)
/// if `id` is outside 1-99.
pub fn cmd_set_jlip_id(id: u8) -> Result<Vec<u8>> {
    validate_jlip_id(id)?;
    Ok(vec![CAT_DEVICE, 0x41, id])
}

// ---------------------------------------------------------------
// Tuner
// ---------------------------------------------------------------

/// Tune a preset by its two-digit number.
///
/// Fails with [`Error::InvalidArgument`](jlip_core::Error::InvalidArgument)
/// if `channel` is outside 1-99.
pub fn cmd_set_channel(channel: u8) -> Result<Vec<u8>> {
    if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
        return Err(jlip_core::Error::InvalidArgument(format!(
            "channel {channel} outside {MIN_CHANNEL}-{MAX_CHANNEL}"
        )));
    }
    Ok(vec![CAT_TUNER, 0x44, 0x71, 0x00, channel, PRESET_MARKER])
}

pub fn cmd_select_band(band: Band) -> Vec<u8> {
    vec![CAT_TUNER, 0x40, 0x71, band.to_byte()]
}

/// Select a preset channel by its three raw operand bytes.
pub fn cmd_select_preset_channel(n: u8, nn: u8, nnn: u8) -> Vec<u8> {
    vec![CAT_TUNER, 0x44, n, nn, nnn, PRESET_MARKER]
}

/// Select a real (broadcast) channel by its three raw operand bytes.
pub fn cmd_select_real_channel(n: u8, nn: u8, nnn: u8) -> Vec<u8> {
    vec![CAT_TUNER, 0x42, n, nn, nnn, REAL_MARKER]
}

pub fn cmd_preset_channel_up() -> Vec<u8> {
    vec![CAT_TUNER, 0x44, 0x73, 0x00, 0x00, PRESET_MARKER]
}

pub fn cmd_preset_channel_down() -> Vec<u8> {
    vec![CAT_TUNER, 0x44, 0x63, 0x00, 0x00, PRESET_MARKER]
}

pub fn cmd_real_channel_up() -> Vec<u8> {
    vec![CAT_TUNER, 0x42, 0x73, 0x00, 0x00, REAL_MARKER]
}

pub fn cmd_real_channel_down() -> Vec<u8> {
    vec![CAT_TUNER, 0x42, 0x63, 0x00, 0x00, REAL_MARKER]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{PAYLOAD_LEN, encode};
    use jlip_core::Error;

    #[test]
    fn transport_opcodes() {
        assert_eq!(cmd_eject(), [0x08, 0x41, 0x60]);
        assert_eq!(cmd_stop(), [0x08, 0x44, 0x60]);
        assert_eq!(cmd_play(), [0x08, 0x43, 0x75]);
        assert_eq!(cmd_rewind(), [0x08, 0x44, 0x65]);
        assert_eq!(cmd_fast_forward(), [0x08, 0x44, 0x75]);
        assert_eq!(cmd_pause(), [0x08, 0x43, 0x6D]);
        assert_eq!(cmd_record(), [0x08, 0x42, 0x70]);
        assert_eq!(cmd_pause_recording(), [0x08, 0x42, 0x6D]);
    }

    #[test]
    fn query_opcodes() {
        assert_eq!(cmd_get_vtr_mode(), [0x08, 0x4E, 0x20]);
        assert_eq!(cmd_get_tuner_mode(), [0x0A, 0x4E, 0x20]);
        assert_eq!(cmd_get_power_state(), [0x3E, 0x4E, 0x20]);
        assert_eq!(cmd_get_device_name(), [0x7C, 0x4C]);
        assert_eq!(cmd_nop(), [0x7C, 0x4E, 0x20]);
    }

    #[test]
    fn frame_step_carries_count() {
        assert_eq!(cmd_frame_step(), [0x48, 0x46, 0x75, 0x01]);
        assert_eq!(cmd_frame_step_back(), [0x48, 0x46, 0x65, 0x01]);
    }

    #[test]
    fn set_jlip_id_bounds() {
        assert_eq!(cmd_set_jlip_id(1).unwrap(), [0x7C, 0x41, 0x01]);
        assert_eq!(cmd_set_jlip_id(99).unwrap(), [0x7C, 0x41, 99]);
        assert!(matches!(cmd_set_jlip_id(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            cmd_set_jlip_id(100),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn set_channel_places_number_in_fifth_byte() {
        assert_eq!(
            cmd_set_channel(12).unwrap(),
            [0x0A, 0x44, 0x71, 0x00, 12, 0x7E]
        );
        assert!(matches!(cmd_set_channel(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            cmd_set_channel(100),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn select_band_uses_wire_byte() {
        assert_eq!(cmd_select_band(Band::Terrestrial), [0x0A, 0x40, 0x71, 0x30]);
        assert_eq!(cmd_select_band(Band::Satellite), [0x0A, 0x40, 0x71, 0x40]);
    }

    #[test]
    fn channel_selection_markers() {
        assert_eq!(
            cmd_select_preset_channel(1, 2, 3),
            [0x0A, 0x44, 1, 2, 3, 0x7E]
        );
        assert_eq!(cmd_select_real_channel(1, 2, 3), [0x0A, 0x42, 1, 2, 3, 0x44]);
        assert_eq!(cmd_set_input(1, 2), [0x08, 0x59, 1, 2, 0x7F]);
    }

    #[test]
    fn every_payload_fits_a_frame() {
        let payloads = [
            cmd_preset_channel_up(),
            cmd_preset_channel_down(),
            cmd_real_channel_up(),
            cmd_real_channel_down(),
            cmd_select_preset_channel(0xFF, 0xFF, 0xFF),
            cmd_set_input(0xFF, 0xFF),
            cmd_set_channel(99).unwrap(),
        ];
        for payload in payloads {
            assert!(payload.len() <= PAYLOAD_LEN);
            assert!(encode(1, &payload).is_ok());
        }
    }
}
