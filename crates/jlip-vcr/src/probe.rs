//! Presence probe: find a responsive JLIP id on a bus.
//!
//! Each candidate id gets the no-op query through the fast limiter with
//! status raising off. The first id that answers ACCEPTED and is not
//! already claimed by the caller wins.

use std::ops::RangeInclusive;

use tracing::debug;

use jlip_core::{CommandStatus, Result};

use crate::commands::cmd_nop;
use crate::frame::{MAX_JLIP_ID, MIN_JLIP_ID};
use crate::limiter::Speed;
use crate::link::JlipLink;

/// Every assignable JLIP id.
pub const JLIP_ID_RANGE: RangeInclusive<u8> = MIN_JLIP_ID..=MAX_JLIP_ID;

/// Scan `ids` in order and return the first responsive, unclaimed id.
///
/// Ids that time out or answer with a partial frame are skipped. Any other
/// failure (a corrupt frame, a lost port) ends the scan with that error.
/// Returns `Ok(None)` if no id qualifies.
pub async fn find_unclaimed<I, F>(link: &JlipLink, ids: I, is_claimed: F) -> Result<Option<u8>>
where
    I: IntoIterator<Item = u8>,
    F: Fn(u8) -> bool,
{
    let nop = cmd_nop();

    for id in ids {
        let response = match link.exchange(id, &nop, Speed::Fast).await {
            Ok(response) => response,
            Err(e) if e.is_no_response() => {
                debug!(jlip_id = id, error = %e, "no device");
                continue;
            }
            Err(e) => return Err(e),
        };

        if response.status() != Some(CommandStatus::Accepted) {
            debug!(jlip_id = id, status_bits = response.status_bits(), "device did not accept");
            continue;
        }
        if is_claimed(id) {
            debug!(jlip_id = id, "device already claimed");
            continue;
        }
        return Ok(Some(id));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::VcrBuilder;
    use crate::frame::encode;
    use jlip_core::Error;
    use jlip_test_harness::MockTransport;

    fn nop_frame(id: u8) -> [u8; 11] {
        encode(id, &cmd_nop()).unwrap()
    }

    fn reply(id: u8, status: u8) -> [u8; 11] {
        encode(id, &[status]).unwrap()
    }

    async fn link(mock: MockTransport) -> JlipLink {
        VcrBuilder::new()
            .build_link_with_transport(Box::new(mock))
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn skips_silent_ids() {
        let mut mock = MockTransport::new();
        mock.expect_silence(&nop_frame(1));
        mock.expect(&nop_frame(2), &reply(2, 0x03));

        let link = link(mock).await;
        let found = find_unclaimed(&link, JLIP_ID_RANGE, |_| false).await.unwrap();
        assert_eq!(found, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn skips_short_reads_and_rejections() {
        let mut mock = MockTransport::new();
        mock.expect(&nop_frame(1), &reply(1, 0x03)[..5]);
        mock.expect(&nop_frame(2), &reply(2, 0x05));
        mock.expect(&nop_frame(3), &reply(3, 0x03));

        let link = link(mock).await;
        let found = find_unclaimed(&link, 1..=3, |_| false).await.unwrap();
        assert_eq!(found, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn skips_claimed_ids() {
        let mut mock = MockTransport::new();
        mock.expect(&nop_frame(1), &reply(1, 0x03));
        mock.expect(&nop_frame(2), &reply(2, 0x03));

        let link = link(mock).await;
        let found = find_unclaimed(&link, 1..=2, |id| id == 1).await.unwrap();
        assert_eq!(found, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn none_when_nothing_answers() {
        let mut mock = MockTransport::new();
        for id in 1..=3 {
            mock.expect_silence(&nop_frame(id));
        }

        let link = link(mock).await;
        let found = find_unclaimed(&link, 1..=3, |_| false).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_frame_ends_scan() {
        let mut corrupt = reply(1, 0x03);
        corrupt[10] ^= 0x01;
        let mut mock = MockTransport::new();
        mock.expect(&nop_frame(1), &corrupt);

        let link = link(mock).await;
        let result = find_unclaimed(&link, 1..=3, |_| false).await;
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn id_range_bounds() {
        assert_eq!(*JLIP_ID_RANGE.start(), 1);
        assert_eq!(*JLIP_ID_RANGE.end(), 99);
        assert_eq!(JLIP_ID_RANGE.count(), 99);
    }
}
