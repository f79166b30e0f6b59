//! Remote creation and readiness polling for new volumes.
//!
//! The coordinator issues a single create call and then polls the backend
//! until the volume reports `active`. Every wait observes the caller's
//! cancellation token and deadline. A volume abandoned because of a timeout,
//! cancellation, or deadline is deleted again on a best-effort basis so the
//! backend does not accumulate orphans.

use std::future::pending;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{BlockStorage, CreateVolumeParams, RemoteVolume, VolumeStatus};
use crate::error::ControllerError;

/// Readiness polls performed before provisioning is abandoned.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;
/// Delay before each readiness poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often and how long to wait for a new volume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Creates a policy; a zero attempt budget is raised to one.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            interval,
        }
    }

    /// Number of status polls.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait before each poll.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time spent waiting when every poll is used.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL)
    }
}

/// Caller supplied cancellation and deadline for one request.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

/// Why a request stopped waiting before its work was done.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interruption {
    /// The cancellation token fired.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes `token` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Stops waiting once `deadline` passes.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stops waiting once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// The token observed by this context.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the interruption that has already happened, if any.
    #[must_use]
    pub fn interrupted(&self) -> Option<Interruption> {
        if self.cancellation.is_cancelled() {
            return Some(Interruption::Cancelled);
        }
        self.deadline
            .filter(|deadline| *deadline <= Instant::now())
            .map(|_| Interruption::DeadlineExceeded)
    }

    /// Resolves when the request is cancelled or its deadline passes.
    pub async fn interruption(&self) -> Interruption {
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Interruption::Cancelled,
            () = deadline => Interruption::DeadlineExceeded,
        }
    }
}

impl Interruption {
    /// Converts the interruption into a controller error describing `stage`.
    #[must_use]
    pub fn into_error(self, volume_id: Option<&str>, stage: &str) -> ControllerError {
        let owned_id = volume_id.map(str::to_owned);
        match self {
            Self::Cancelled => ControllerError::Cancelled {
                volume_id: owned_id,
                message: format!("request cancelled while {stage}"),
            },
            Self::DeadlineExceeded => ControllerError::DeadlineExceeded {
                volume_id: owned_id,
                message: format!("deadline exceeded while {stage}"),
            },
        }
    }
}

/// State of a volume as seen by the polling loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProvisionState {
    /// Still waiting for the backend.
    Creating,
    /// The volume is ready.
    Active,
    /// The polling budget is spent.
    TimedOut,
}

impl ProvisionState {
    /// Next state after observing `status` on poll `attempt` of `budget`.
    #[must_use]
    pub const fn after_poll(status: &VolumeStatus, attempt: u32, budget: u32) -> Self {
        if status.is_active() {
            Self::Active
        } else if attempt >= budget {
            Self::TimedOut
        } else {
            Self::Creating
        }
    }
}

/// A volume that reached the active state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Provisioned {
    /// The volume as last reported by the backend.
    pub volume: RemoteVolume,
    /// Status polls it took to observe the active state.
    pub polls: u32,
}

enum PollFailure {
    /// Backend failure; the loop stops and nothing is cleaned up.
    Fatal(ControllerError),
    /// The volume is given up on and should be deleted.
    Abandoned(ControllerError),
}

/// Creates a volume and waits for it to become active.
#[derive(Debug)]
pub struct ProvisioningCoordinator<'a, B> {
    storage: &'a B,
    policy: PollPolicy,
}

impl<'a, B: BlockStorage> ProvisioningCoordinator<'a, B> {
    /// Creates a coordinator over `storage`.
    #[must_use]
    pub const fn new(storage: &'a B, policy: PollPolicy) -> Self {
        Self { storage, policy }
    }

    /// Issues the create call and polls until the volume is active.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Backend`] when the create or a status poll
    /// fails, [`ControllerError::ProvisionTimeout`] when the budget is spent,
    /// and [`ControllerError::Cancelled`] or
    /// [`ControllerError::DeadlineExceeded`] when the caller gives up.
    pub async fn provision(
        &self,
        params: &CreateVolumeParams,
        context: &RequestContext,
    ) -> Result<Provisioned, ControllerError> {
        let created = self
            .storage
            .create(params)
            .await
            .map_err(|err| ControllerError::backend("cannot create volume", &err))?;
        info!(
            volume_id = %created.id,
            label = %params.label,
            size_gb = params.size_gb,
            region = params.region,
            "volume create accepted"
        );

        match self.await_active(&created.id, context).await {
            Ok(provisioned) => Ok(provisioned),
            Err(PollFailure::Fatal(err)) => Err(err),
            Err(PollFailure::Abandoned(err)) => Err(self.abandon(&created.id, err).await),
        }
    }

    async fn await_active(
        &self,
        volume_id: &str,
        context: &RequestContext,
    ) -> Result<Provisioned, PollFailure> {
        let budget = self.policy.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.pause(context).await.map_err(|interruption| {
                PollFailure::Abandoned(
                    interruption.into_error(
                        Some(volume_id),
                        &format!("waiting for volume {volume_id} to become active"),
                    ),
                )
            })?;

            let volume = self.fetch(volume_id).await.map_err(PollFailure::Fatal)?;
            debug!(volume_id, attempt, status = %volume.status, "polled volume status");

            match ProvisionState::after_poll(&volume.status, attempt, budget) {
                ProvisionState::Active => {
                    return Ok(Provisioned {
                        volume,
                        polls: attempt,
                    });
                }
                ProvisionState::TimedOut => {
                    return Err(PollFailure::Abandoned(ControllerError::ProvisionTimeout {
                        volume_id: volume_id.to_owned(),
                        message: format!(
                            "volume is not active after {budget} retries ({:?})",
                            self.policy.budget()
                        ),
                    }));
                }
                ProvisionState::Creating => {}
            }
        }
    }

    async fn pause(&self, context: &RequestContext) -> Result<(), Interruption> {
        tokio::select! {
            biased;
            interruption = context.interruption() => Err(interruption),
            () = sleep(self.policy.interval()) => Ok(()),
        }
    }

    async fn fetch(&self, volume_id: &str) -> Result<RemoteVolume, ControllerError> {
        self.storage
            .lookup(volume_id)
            .await
            .map_err(|err| ControllerError::backend("cannot get volume status", &err))?
            .ok_or_else(|| ControllerError::Backend {
                context: "cannot get volume status",
                message: format!("volume {volume_id} disappeared while waiting for it"),
            })
    }

    async fn abandon(&self, volume_id: &str, error: ControllerError) -> ControllerError {
        warn!(volume_id, error = %error, "abandoning volume, deleting it again");
        match self.storage.delete(volume_id).await {
            Ok(()) => {
                info!(volume_id, "abandoned volume deleted");
                error
            }
            Err(cleanup) => {
                warn!(volume_id, error = %cleanup, "failed to delete abandoned volume");
                error.with_note(&format!("cleanup also failed: {cleanup}"))
            }
        }
    }
}
