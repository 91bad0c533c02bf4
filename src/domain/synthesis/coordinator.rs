//! Per-key coalescing of synthesis work
//!
//! The first caller for a key becomes the leader and owns the synthesis
//! round. Callers arriving while the round is in flight become followers and
//! receive a copy of the leader's outcome. Once the leader releases, the key
//! has no pending state and the next caller starts a fresh round.

use super::artifact::ArtifactLocation;
use super::error::SynthesisError;
use super::key::CacheKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Result of one synthesis round, shared by every caller of that round
pub type SynthesisOutcome = Result<ArtifactLocation, SynthesisError>;

type OutcomeSlot = Option<SynthesisOutcome>;

const ABANDONED: &str = "synthesis attempt abandoned before completion";

#[derive(Default)]
struct PendingRounds {
    rounds: Mutex<HashMap<CacheKey, watch::Receiver<OutcomeSlot>>>,
}

/// Assigns leader/follower roles per cache key
#[derive(Clone)]
pub struct SynthesisCoordinator {
    pending: Arc<PendingRounds>,
    wait_timeout: Duration,
}

/// Role handed out by [`SynthesisCoordinator::acquire_or_wait`]
pub enum Role {
    Leader(LeaderGuard),
    Follower(FollowerTicket),
}

impl SynthesisCoordinator {
    /// `wait_timeout` bounds how long any caller waits for a round's outcome
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(PendingRounds::default()),
            wait_timeout,
        }
    }

    /// Become the leader for `key`, or join the round already in flight.
    ///
    /// The decision is atomic: the map lock is held only for the lookup and
    /// insert, never across an await.
    pub fn acquire_or_wait(&self, key: &CacheKey) -> Role {
        let mut rounds = self.pending.rounds.lock();

        if let Some(outcome) = rounds.get(key) {
            tracing::debug!(cache_key = %key, "Joining in-flight synthesis as follower");
            return Role::Follower(FollowerTicket {
                key: key.clone(),
                outcome: outcome.clone(),
                timeout: self.wait_timeout,
            });
        }

        let (tx, rx) = watch::channel(None);
        rounds.insert(key.clone(), rx);
        tracing::debug!(cache_key = %key, "Starting synthesis round as leader");

        Role::Leader(LeaderGuard {
            key: key.clone(),
            pending: self.pending.clone(),
            tx,
            wait_timeout: self.wait_timeout,
            released: false,
        })
    }

    /// Number of keys with a round in flight
    pub fn pending_count(&self) -> usize {
        self.pending.rounds.lock().len()
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.rounds.lock().contains_key(key)
    }
}

/// Exclusive right to run the synthesis round for one key.
///
/// Dropping the guard without calling [`LeaderGuard::release`] fails the
/// round for every follower and clears the key.
pub struct LeaderGuard {
    key: CacheKey,
    pending: Arc<PendingRounds>,
    tx: watch::Sender<OutcomeSlot>,
    wait_timeout: Duration,
    released: bool,
}

impl LeaderGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Ticket for awaiting this round's outcome, used by the caller that
    /// spawned the leader's work
    pub fn subscribe(&self) -> FollowerTicket {
        FollowerTicket {
            key: self.key.clone(),
            outcome: self.tx.subscribe(),
            timeout: self.wait_timeout,
        }
    }

    /// Publish the outcome to all waiters and end the round
    pub fn release(mut self, outcome: SynthesisOutcome) {
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: SynthesisOutcome) {
        if self.released {
            return;
        }
        self.released = true;

        // Unregister first so that a caller arriving after this point starts a
        // new round instead of observing this one's outcome.
        self.pending.rounds.lock().remove(&self.key);

        match &outcome {
            Ok(location) => tracing::debug!(
                cache_key = %self.key,
                receivers = self.tx.receiver_count(),
                path = %location.path.display(),
                "Synthesis round released"
            ),
            Err(err) => tracing::debug!(
                cache_key = %self.key,
                receivers = self.tx.receiver_count(),
                error = %err,
                "Synthesis round released with failure"
            ),
        }

        // No receivers left is fine: nobody is waiting anymore.
        let _ = self.tx.send(Some(outcome));
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(cache_key = %self.key, "Synthesis leader dropped without releasing");
            self.finish(Err(SynthesisError::SynthesisFailure(ABANDONED.to_string())));
        }
    }
}

/// Handle for awaiting the outcome of a round led by someone else
pub struct FollowerTicket {
    key: CacheKey,
    outcome: watch::Receiver<OutcomeSlot>,
    timeout: Duration,
}

impl FollowerTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait for the leader's outcome, bounded by the coordinator's timeout.
    ///
    /// Dropping this future leaves the leader's round untouched.
    pub async fn wait(mut self) -> SynthesisOutcome {
        let waited = tokio::time::timeout(self.timeout, self.outcome.wait_for(Option::is_some))
            .await
            .map(|changed| changed.map(|slot| slot.clone()));

        match waited {
            Ok(Ok(Some(outcome))) => outcome,
            Ok(Ok(None)) | Ok(Err(_)) => {
                Err(SynthesisError::SynthesisFailure(ABANDONED.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    cache_key = %self.key,
                    timeout = ?self.timeout,
                    "Timed out waiting for synthesis round"
                );
                Err(SynthesisError::SynthesisFailure(format!(
                    "timed out after {:?} waiting for synthesis",
                    self.timeout
                )))
            }
        }
    }
}
