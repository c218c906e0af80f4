//! JLIP frame encoder/decoder.
//!
//! Every JLIP exchange is one fixed-length frame in each direction. This
//! module handles the pure byte-level side of that: payload padding,
//! checksum computation, encoding, and integrity validation of received
//! frames.
//!
//! # Frame format
//!
//! ```text
//! 0xFF 0xFF <id> <p0> <p1> <p2> <p3> <p4> <p5> <p6> <sum>
//! ```
//!
//! - Header: two `0xFF` bytes
//! - `id`: JLIP device id (1-99)
//! - `p0..p6`: opcode and operands, zero-padded on the right to 7 bytes.
//!   In a response, `p0` carries the command status and `p1..p6` the
//!   return data.
//! - `sum`: 7-bit checksum over the ten bytes before it

use jlip_core::{Error, Result};

/// Header byte repeated twice at the start of every frame.
pub const HEADER: u8 = 0xFF;

/// Number of payload bytes in a frame (opcode plus operands).
pub const PAYLOAD_LEN: usize = 7;

/// Number of bytes covered by the checksum.
pub const CHECKSUMMED_LEN: usize = 3 + PAYLOAD_LEN;

/// Total length of a frame on the wire.
pub const FRAME_LEN: usize = CHECKSUMMED_LEN + 1;

/// Lowest assignable JLIP device id.
pub const MIN_JLIP_ID: u8 = 1;

/// Highest assignable JLIP device id.
pub const MAX_JLIP_ID: u8 = 99;

/// Compute the JLIP checksum over the ten bytes it covers.
///
/// The sum is taken over the low seven bits of each byte and subtracted
/// from `0x80`; the result is truncated to seven bits.
///
/// # Example
///
/// ```
/// use jlip_vcr::frame::checksum;
///
/// let header = [0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00];
/// assert_eq!(checksum(&header), 0x55);
/// ```
pub fn checksum(bytes: &[u8; CHECKSUMMED_LEN]) -> u8 {
    sum7(bytes)
}

/// Checksum of a whole frame, ignoring its trailing checksum byte.
pub fn frame_checksum(frame: &[u8; FRAME_LEN]) -> u8 {
    sum7(&frame[..CHECKSUMMED_LEN])
}

fn sum7(bytes: &[u8]) -> u8 {
    let sum = bytes
        .iter()
        .fold(0x80u8, |acc, &b| acc.wrapping_sub(b & 0x7F));
    sum & 0x7F
}

/// Pad `items` on the right with `value` up to exactly `max_len` elements.
///
/// Fails with [`Error::InvalidArgument`] if `items` is already longer than
/// `max_len`.
pub fn pad_right<T: Copy>(value: T, items: &[T], max_len: usize) -> Result<Vec<T>> {
    if items.len() > max_len {
        return Err(Error::InvalidArgument(format!(
            "{} items do not fit in {max_len}",
            items.len()
        )));
    }
    let mut padded = Vec::with_capacity(max_len);
    padded.extend_from_slice(items);
    padded.resize(max_len, value);
    Ok(padded)
}

/// Encode a command payload into a frame ready for transmission.
///
/// The payload is zero-padded to seven bytes. Fails with
/// [`Error::InvalidArgument`] if it is longer than that.
///
/// # Example
///
/// ```
/// use jlip_vcr::frame::encode;
///
/// // Stop, addressed to JLIP id 1
/// let frame = encode(1, &[0x08, 0x44, 0x60]).unwrap();
/// assert_eq!(
///     frame,
///     [0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x55]
/// );
/// ```
pub fn encode(device_id: u8, payload: &[u8]) -> Result<[u8; FRAME_LEN]> {
    let padded = pad_right(0u8, payload, PAYLOAD_LEN)?;

    let mut frame = [0u8; FRAME_LEN];
    frame[0] = HEADER;
    frame[1] = HEADER;
    frame[2] = device_id;
    frame[3..CHECKSUMMED_LEN].copy_from_slice(&padded);
    frame[CHECKSUMMED_LEN] = frame_checksum(&frame);
    Ok(frame)
}

/// Validate a received frame and return it as a fixed-size array.
///
/// Fails with [`Error::MalformedResponse`] if `buf` is not exactly
/// [`FRAME_LEN`] bytes or does not start with the two-byte header, and with
/// [`Error::ChecksumMismatch`] if the trailing checksum byte disagrees with
/// the checksum of the first ten bytes. The checksum is checked before the
/// header.
///
/// The checksum only covers the low seven bits of each byte, so corruption
/// confined to bit 7 of a header or payload byte is not detectable.
pub fn decode_and_validate(buf: &[u8]) -> Result<[u8; FRAME_LEN]> {
    let frame: [u8; FRAME_LEN] = buf.try_into().map_err(|_| {
        Error::MalformedResponse(format!(
            "expected a {FRAME_LEN}-byte frame, got {} bytes",
            buf.len()
        ))
    })?;

    let expected = frame_checksum(&frame);
    let actual = frame[CHECKSUMMED_LEN];
    if expected != actual {
        return Err(Error::ChecksumMismatch { expected, actual });
    }

    if frame[0] != HEADER || frame[1] != HEADER {
        return Err(Error::MalformedResponse(format!(
            "bad frame header {:02X} {:02X}",
            frame[0], frame[1]
        )));
    }

    Ok(frame)
}

/// Check that `id` is an assignable JLIP device id.
pub fn validate_jlip_id(id: u8) -> Result<()> {
    if (MIN_JLIP_ID..=MAX_JLIP_ID).contains(&id) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "JLIP id {id} outside {MIN_JLIP_ID}-{MAX_JLIP_ID}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ---------------------------------------------------------------
    // Checksum
    // ---------------------------------------------------------------

    #[test]
    fn checksum_of_stop_command() {
        let frame = [0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(checksum(&frame), 0x55);
    }

    #[test]
    fn checksum_of_accepted_empty_response() {
        let frame = [0xFF, 0xFF, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(checksum(&frame), 0x7E);
    }

    #[test]
    fn checksum_ignores_high_bit() {
        let a = [0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00];
        let mut b = a;
        b[4] |= 0x80;
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn frame_checksum_ignores_checksum_byte() {
        let frame = [0xFF, 0xFF, 0x01, 0x08, 0x44, 0x60, 0x00, 0x00, 0x00, 0x00, 0x12];
        assert_eq!(frame_checksum(&frame), 0x55);
        let head: &[u8; CHECKSUMMED_LEN] = frame[..CHECKSUMMED_LEN].try_into().unwrap();
        assert_eq!(checksum(head), frame_checksum(&frame));
    }

    #[test]
    fn checksum_is_seven_bits() {
        let frame = [0x7F; 10];
        assert!(checksum(&frame) <= 0x7F);
    }

    // ---------------------------------------------------------------
    // Padding
    // ---------------------------------------------------------------

    #[test]
    fn pad_right_fills_to_length() {
        for len in 0..=PAYLOAD_LEN {
            let items = vec![0xAAu8; len];
            let padded = pad_right(0, &items, PAYLOAD_LEN).unwrap();
            assert_eq!(padded.len(), PAYLOAD_LEN);
            assert!(padded[..len].iter().all(|&b| b == 0xAA));
            assert!(padded[len..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn pad_right_rejects_overlong() {
        let items = [0u8; 8];
        assert!(matches!(
            pad_right(0, &items, PAYLOAD_LEN),
            Err(Error::InvalidArgument(_))
        ));
    }

    // ---------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_play() {
        let frame = encode(1, &[0x08, 0x43, 0x75]).unwrap();
        assert_eq!(&frame[..10], &[0xFF, 0xFF, 0x01, 0x08, 0x43, 0x75, 0, 0, 0, 0]);
        assert_eq!(frame[10], frame_checksum(&frame));
    }

    #[test]
    fn encode_full_payload() {
        let payload = [0x0A, 0x44, 0x71, 0x00, 0x12, 0x7E, 0x01];
        let frame = encode(42, &payload).unwrap();
        assert_eq!(frame[2], 42);
        assert_eq!(&frame[3..10], &payload);
    }

    #[test]
    fn encode_rejects_eight_byte_payload() {
        let result = encode(1, &[0; 8]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    #[test]
    fn validate_accepts_good_frame() {
        let frame = encode(3, &[0x03, 0x16, 0x00, 0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(decode_and_validate(&frame).unwrap(), frame);
    }

    #[test]
    fn validate_reports_expected_and_actual() {
        let mut frame = encode(1, &[0x03]).unwrap();
        let good = frame[10];
        frame[10] = good ^ 0x01;
        match decode_and_validate(&frame) {
            Err(Error::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, good);
                assert_eq!(actual, good ^ 0x01);
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_short_buffer() {
        let frame = encode(1, &[0x03]).unwrap();
        assert!(matches!(
            decode_and_validate(&frame[..10]),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn validate_rejects_long_buffer() {
        let mut buf = encode(1, &[0x03]).unwrap().to_vec();
        buf.push(0x00);
        assert!(matches!(
            decode_and_validate(&buf),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_header_with_valid_checksum() {
        let mut frame = encode(1, &[0x03]).unwrap();
        // 0x7F and 0xFF contribute the same low seven bits.
        frame[0] = 0x7F;
        assert!(matches!(
            decode_and_validate(&frame),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn jlip_id_bounds() {
        assert!(validate_jlip_id(1).is_ok());
        assert!(validate_jlip_id(99).is_ok());
        assert!(matches!(validate_jlip_id(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            validate_jlip_id(100),
            Err(Error::InvalidArgument(_))
        ));
    }

    proptest! {
        #[test]
        fn encoded_frames_always_validate(
            id in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=PAYLOAD_LEN),
        ) {
            let frame = encode(id, &payload).unwrap();
            prop_assert!(decode_and_validate(&frame).is_ok());
        }

        #[test]
        fn single_byte_corruption_is_detected(
            id in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=PAYLOAD_LEN),
            index in 0usize..FRAME_LEN,
            flip in 1u8..0x80,
        ) {
            let mut frame = encode(id, &payload).unwrap();
            frame[index] ^= flip;
            let is_checksum_mismatch = matches!(
                decode_and_validate(&frame),
                Err(Error::ChecksumMismatch { .. })
            );
            prop_assert!(is_checksum_mismatch);
        }
    }
}
