//! Protocol enums shared by every layer of the JLIP stack.
//!
//! These are the device-asserted values that come back in response frames.
//! The engine never enforces transitions between them; it only reports what
//! the device says.

use std::fmt;

/// Status carried in the low three bits of response byte 3.
///
/// Values 0, 2, 6 and 7 are reserved and have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandStatus {
    /// The device does not implement the command.
    NotImplemented = 1,
    /// The command was accepted and has completed.
    Accepted = 3,
    /// The command was accepted but is still in progress.
    AcceptedNotComplete = 4,
    /// The command is implemented but not possible in the current state.
    NotPossible = 5,
}

impl CommandStatus {
    /// Mask applied to response byte 3 to extract the status.
    pub const MASK: u8 = 0b0000_0111;

    /// Decode a status from a raw status byte.
    ///
    /// Only the low three bits are considered. Returns `None` for the
    /// reserved values.
    pub fn from_bits(byte: u8) -> Option<Self> {
        match byte & Self::MASK {
            1 => Some(CommandStatus::NotImplemented),
            3 => Some(CommandStatus::Accepted),
            4 => Some(CommandStatus::AcceptedNotComplete),
            5 => Some(CommandStatus::NotPossible),
            _ => None,
        }
    }

    /// Returns `true` for [`Accepted`](Self::Accepted) and
    /// [`AcceptedNotComplete`](Self::AcceptedNotComplete).
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            CommandStatus::Accepted | CommandStatus::AcceptedNotComplete
        )
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandStatus::NotImplemented => "NOT_IMPLEMENTED",
            CommandStatus::Accepted => "ACCEPTED",
            CommandStatus::AcceptedNotComplete => "ACCEPTED_NOT_COMPLETE",
            CommandStatus::NotPossible => "NOT_POSSIBLE",
        };
        write!(f, "{s}")
    }
}

/// Tape transport state reported in the low nibble of the VTR mode
/// response.
///
/// `PlayForward`/`PlayBackward` use 0b110/0b101. Some protocol write-ups
/// swap these two; the values here should be checked against the output of
/// a real deck before relying on the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VtrMode {
    /// No tape in the transport, or the tape is being ejected.
    Eject = 0,
    /// Stopped.
    Stop = 0b0001,
    /// Fast forward.
    FastForward = 0b0010,
    /// Rewind.
    Rewind = 0b0011,
    /// Playing in reverse.
    PlayBackward = 0b0101,
    /// Playing forward.
    PlayForward = 0b0110,
    /// Playback paused (still frame).
    Pause = 0b0111,
    /// Recording paused.
    RecordPause = 0b1101,
    /// Recording.
    Record = 0b1110,
    /// The deck reports no mode (typically powered down).
    NoMode = 0b1111,
}

impl VtrMode {
    /// Decode a mode from the low nibble of a byte.
    ///
    /// Returns `None` for nibble values that have no assigned mode.
    pub fn from_bits(byte: u8) -> Option<Self> {
        match byte & 0x0F {
            0b0000 => Some(VtrMode::Eject),
            0b0001 => Some(VtrMode::Stop),
            0b0010 => Some(VtrMode::FastForward),
            0b0011 => Some(VtrMode::Rewind),
            0b0101 => Some(VtrMode::PlayBackward),
            0b0110 => Some(VtrMode::PlayForward),
            0b0111 => Some(VtrMode::Pause),
            0b1101 => Some(VtrMode::RecordPause),
            0b1110 => Some(VtrMode::Record),
            0b1111 => Some(VtrMode::NoMode),
            _ => None,
        }
    }
}

impl fmt::Display for VtrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VtrMode::Eject => "EJECT",
            VtrMode::Stop => "STOP",
            VtrMode::FastForward => "FF",
            VtrMode::Rewind => "REW",
            VtrMode::PlayBackward => "PLAY_BWD",
            VtrMode::PlayForward => "PLAY_FWD",
            VtrMode::Pause => "PAUSE",
            VtrMode::RecordPause => "REC_PAUSE",
            VtrMode::Record => "REC",
            VtrMode::NoMode => "NO_MODE",
        };
        write!(f, "{s}")
    }
}

/// Tuner broadcast band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Band {
    /// Terrestrial (over-the-air or cable) broadcast.
    Terrestrial = 0x30,
    /// Broadcast satellite.
    Satellite = 0x40,
}

impl Band {
    /// Decode a band from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x30 => Some(Band::Terrestrial),
            0x40 => Some(Band::Satellite),
            _ => None,
        }
    }

    /// The wire byte for this band.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Terrestrial => write!(f, "TERRESTRIAL_BROADCAST"),
            Band::Satellite => write!(f, "BROADCAST_SATELLITE"),
        }
    }
}

/// Video frame rate of the tape, as reported alongside the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRate {
    /// 25 frames per second (PAL).
    Pal,
    /// 30 frames per second (NTSC).
    Ntsc,
}

impl FrameRate {
    /// Frames per second.
    pub fn fps(self) -> u8 {
        match self {
            FrameRate::Pal => 25,
            FrameRate::Ntsc => 30,
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepted() {
        assert_eq!(
            CommandStatus::from_bits(0b0000_0011),
            Some(CommandStatus::Accepted)
        );
    }

    #[test]
    fn status_not_possible() {
        assert_eq!(
            CommandStatus::from_bits(0b0000_0101),
            Some(CommandStatus::NotPossible)
        );
    }

    #[test]
    fn status_upper_bits_masked() {
        assert_eq!(
            CommandStatus::from_bits(0b1111_1011),
            Some(CommandStatus::Accepted)
        );
        assert_eq!(
            CommandStatus::from_bits(0b0100_0100),
            Some(CommandStatus::AcceptedNotComplete)
        );
    }

    #[test]
    fn status_reserved_values() {
        for byte in [0u8, 2, 6, 7, 0xF8, 0x7E] {
            assert_eq!(CommandStatus::from_bits(byte), None, "byte {byte:#04x}");
        }
    }

    #[test]
    fn status_accepted_classification() {
        assert!(CommandStatus::Accepted.is_accepted());
        assert!(CommandStatus::AcceptedNotComplete.is_accepted());
        assert!(!CommandStatus::NotPossible.is_accepted());
        assert!(!CommandStatus::NotImplemented.is_accepted());
    }

    #[test]
    fn vtr_mode_round_trips_through_nibble() {
        let all = [
            VtrMode::Eject,
            VtrMode::Stop,
            VtrMode::FastForward,
            VtrMode::Rewind,
            VtrMode::PlayBackward,
            VtrMode::PlayForward,
            VtrMode::Pause,
            VtrMode::RecordPause,
            VtrMode::Record,
            VtrMode::NoMode,
        ];
        for mode in all {
            assert_eq!(VtrMode::from_bits(mode as u8), Some(mode));
        }
    }

    #[test]
    fn vtr_mode_ignores_high_nibble() {
        assert_eq!(VtrMode::from_bits(0b0011_0110), Some(VtrMode::PlayForward));
    }

    #[test]
    fn vtr_mode_unassigned_nibbles() {
        for nibble in [4u8, 8, 9, 10, 11, 12] {
            assert_eq!(VtrMode::from_bits(nibble), None);
        }
    }

    #[test]
    fn vtr_mode_display() {
        assert_eq!(VtrMode::Rewind.to_string(), "REW");
        assert_eq!(VtrMode::PlayForward.to_string(), "PLAY_FWD");
        assert_eq!(VtrMode::RecordPause.to_string(), "REC_PAUSE");
    }

    #[test]
    fn band_bytes() {
        assert_eq!(Band::from_byte(0x30), Some(Band::Terrestrial));
        assert_eq!(Band::from_byte(0x40), Some(Band::Satellite));
        assert_eq!(Band::from_byte(0x31), None);
        assert_eq!(Band::Satellite.to_byte(), 0x40);
    }

    #[test]
    fn frame_rate_fps() {
        assert_eq!(FrameRate::Pal.fps(), 25);
        assert_eq!(FrameRate::Ntsc.fps(), 30);
    }
}
