//! Wait primitives: drive the tape transport and poll until it settles.
//!
//! Both primitives stop the deck, pause for the mechanism to settle, issue
//! the transport command, then poll the VTR mode with a fixed sleep between
//! polls until the target condition holds. The first poll happens right
//! after the command is accepted.
//!
//! With the default policies there is no bound: a deck that never reaches
//! the target state (unplugged, jammed) keeps the future pending forever.
//! Pass a [`WaitPolicy`] with a `timeout` to bound the loop.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use jlip_core::{Error, Result, VtrMode};

use crate::response::VtrModeResponse;
use crate::vcr::JlipVcr;

/// Timing for a wait primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Pause between the stop command and the transport command.
    pub settle: Duration,
    /// Sleep between two VTR mode polls.
    pub poll_interval: Duration,
    /// Give up with [`Error::WaitTimeout`] once this much time has passed
    /// since polling started. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Charge polls against the fast limiter.
    pub fast_poll: bool,
}

impl WaitPolicy {
    /// Rewind timing: 1 s settle, 1 s polls, unbounded.
    pub fn rewind() -> Self {
        WaitPolicy {
            settle: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            timeout: None,
            fast_poll: false,
        }
    }

    /// Eject timing: 0.5 s settle, 0.25 s polls, unbounded.
    pub fn eject() -> Self {
        WaitPolicy {
            settle: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            timeout: None,
            fast_poll: false,
        }
    }

    /// Same policy with a bound on the polling phase.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl JlipVcr {
    /// Stop, rewind, and wait until the deck leaves rewind.
    ///
    /// Returns the first VTR mode response whose mode is not
    /// [`VtrMode::Rewind`].
    pub async fn rewind_and_wait(&self) -> Result<VtrModeResponse> {
        self.rewind_and_wait_with(WaitPolicy::rewind()).await
    }

    /// [`rewind_and_wait`](Self::rewind_and_wait) with explicit timing.
    pub async fn rewind_and_wait_with(&self, policy: WaitPolicy) -> Result<VtrModeResponse> {
        self.stop().await?;
        tokio::time::sleep(policy.settle).await;
        self.rewind().await?;
        debug!(jlip_id = self.jlip_id(), "rewinding, waiting for REW to end");
        self.poll_until(&policy, |mode| mode != VtrMode::Rewind).await
    }

    /// Stop, eject, and wait until the deck reports [`VtrMode::Eject`].
    pub async fn eject_and_wait(&self) -> Result<VtrModeResponse> {
        self.eject_and_wait_with(WaitPolicy::eject()).await
    }

    /// [`eject_and_wait`](Self::eject_and_wait) with explicit timing.
    pub async fn eject_and_wait_with(&self, policy: WaitPolicy) -> Result<VtrModeResponse> {
        self.stop().await?;
        tokio::time::sleep(policy.settle).await;
        self.eject().await?;
        debug!(jlip_id = self.jlip_id(), "ejecting, waiting for EJECT");
        self.poll_until(&policy, |mode| mode == VtrMode::Eject).await
    }

    async fn poll_until<F>(&self, policy: &WaitPolicy, done: F) -> Result<VtrModeResponse>
    where
        F: Fn(VtrMode) -> bool,
    {
        let deadline = policy.timeout.map(|t| Instant::now() + t);

        loop {
            let response = self.get_vtr_mode(policy.fast_poll).await?;
            if done(response.vtr_mode) {
                debug!(mode = %response.vtr_mode, "wait complete");
                return Ok(response);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Error::WaitTimeout {
                    last_mode: response.vtr_mode,
                });
            }
            trace!(mode = %response.vtr_mode, counter = %response.counter, "still waiting");
            tokio::time::sleep(policy.poll_interval).await;
        }
    }
}
