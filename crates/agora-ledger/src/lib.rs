//! Agora Ledger - Job lifecycle and escrow accounting engine
//!
//! The ledger owns the job collection, enforces the state machine, computes
//! the Dutch-auction price, and issues escrow-movement instructions. It is
//! the sole writer of job fields and the sole caller of the reputation
//! tracker.
//!
//! # Invariants
//!
//! 1. Value conservation: at every point, a job's held escrow plus anything
//!    already paid out or refunded equals the `max_price` escrowed at
//!    posting. No operation creates or destroys value.
//! 2. Exactly one worker ever claims a given job; concurrent claims
//!    serialize on the job's own lock and the loser sees `JobNotOpen`.
//! 3. Escrow moves first, state commits second. A failed escrow call leaves
//!    the job untouched; nothing is retried automatically.
//! 4. Terminal states are final.

pub mod clock;
pub mod events;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::JobEvent;
pub use store::JobStore;

use std::sync::Arc;

use agora_escrow::EscrowEngine;
use agora_reputation::ReputationTracker;
use agora_types::{
    AgentId, AgentStatsView, AgoraError, Amount, Job, JobId, JobStatus, RegistryId, Result,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The job ledger
///
/// Created once at process start with its collaborators injected; cheap to
/// clone and share across tasks. Every mutation of a single job runs under
/// that job's exclusive lock, so two operations on the same job can never
/// both observe a state that permits an exclusive transition.
#[derive(Clone)]
pub struct JobLedger {
    store: JobStore,
    escrow: Arc<dyn EscrowEngine>,
    reputation: ReputationTracker,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<JobEvent>,
}

impl JobLedger {
    /// Create a ledger on the system clock
    pub fn new(escrow: Arc<dyn EscrowEngine>, reputation: ReputationTracker) -> Self {
        Self::with_clock(escrow, reputation, Arc::new(SystemClock))
    }

    /// Create a ledger with an explicit clock
    pub fn with_clock(
        escrow: Arc<dyn EscrowEngine>,
        reputation: ReputationTracker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store: JobStore::new(),
            escrow,
            reputation,
            clock,
            events,
        }
    }

    /// Subscribe to ledger events
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: JobEvent) {
        // No receivers is fine; events are observations, not contracts
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Post a job and escrow its ceiling price
    ///
    /// All-or-nothing: if the escrow lock fails, no job record is created
    /// and the reserved id goes to the next posting.
    pub async fn post_job(
        &self,
        requester: &AgentId,
        description: impl Into<String>,
        min_price: Amount,
        max_price: Amount,
        auction_duration_secs: u64,
        work_deadline_secs: u64,
    ) -> Result<JobId> {
        let description = description.into();
        if description.is_empty() {
            return Err(AgoraError::invalid_input(
                "description",
                "must not be empty",
            ));
        }
        if max_price.is_zero() {
            return Err(AgoraError::invalid_input(
                "max_price",
                "must be greater than zero",
            ));
        }
        if max_price < min_price {
            return Err(AgoraError::invalid_input(
                "max_price",
                "must be at least min_price",
            ));
        }
        if auction_duration_secs == 0 {
            return Err(AgoraError::invalid_input(
                "auction_duration_secs",
                "must be greater than zero",
            ));
        }
        if work_deadline_secs == 0 {
            return Err(AgoraError::invalid_input(
                "work_deadline_secs",
                "must be greater than zero",
            ));
        }

        let now = self.clock.now();
        let escrow = &self.escrow;
        let job_id = self
            .store
            .append_with(move |id| async move {
                escrow
                    .lock(id, requester, max_price)
                    .await
                    .map_err(|e| AgoraError::escrow_failed(id.0, e.to_string()))?;
                Ok(Job {
                    id,
                    requester: requester.clone(),
                    description,
                    min_price,
                    max_price,
                    auction_start: now,
                    auction_duration_secs,
                    work_deadline_secs,
                    claimed_at: None,
                    worker: None,
                    worker_registry_id: None,
                    submission_uri: None,
                    locked_amount: Amount::zero(),
                    rating: None,
                    status: JobStatus::Open,
                })
            })
            .await?;

        info!(%job_id, requester = %requester, %min_price, %max_price, "job posted");
        self.emit(JobEvent::JobPosted {
            job_id,
            requester: requester.clone(),
            min_price,
            max_price,
            auction_duration_secs,
            timestamp: now,
        });
        Ok(job_id)
    }

    /// Claim an open job at the current auction price
    ///
    /// The price is re-evaluated at the instant of the claim, never cached
    /// from an earlier read. Locks the price into escrow and refunds the
    /// unused `max_price - price` to the requester; the whole claim is one
    /// atomic unit, rolled back if the refund fails. Returns the locked
    /// price.
    pub async fn claim_job(
        &self,
        job_id: JobId,
        caller: &AgentId,
        worker_registry_id: RegistryId,
    ) -> Result<Amount> {
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Open {
            return Err(job.not_open());
        }
        if caller == &job.requester {
            return Err(AgoraError::RequesterCannotClaimOwnJob { job_id: job_id.0 });
        }

        let now = self.clock.now();
        let price = job.price_at(now)?;
        let refund = job.max_price.checked_sub(price)?;

        // Escrow first, state second; a zero refund is a no-op, not an error
        if !refund.is_zero() {
            self.escrow
                .refund_partial(job_id, &job.requester, refund)
                .await
                .map_err(|e| {
                    warn!(%job_id, error = %e, "claim refund failed, claim rolled back");
                    AgoraError::escrow_failed(job_id.0, e.to_string())
                })?;
        }

        job.status = JobStatus::Claimed;
        job.worker = Some(caller.clone());
        job.worker_registry_id = Some(worker_registry_id);
        job.claimed_at = Some(now);
        job.locked_amount = price;

        info!(%job_id, worker = %caller, locked = %price, %refund, "job claimed");
        self.emit(JobEvent::JobClaimed {
            job_id,
            worker: caller.clone(),
            worker_registry_id,
            locked_amount: price,
            refunded: refund,
            timestamp: now,
        });
        Ok(price)
    }

    /// Submit work for a claimed job
    pub async fn submit_work(
        &self,
        job_id: JobId,
        caller: &AgentId,
        submission_uri: impl Into<String>,
    ) -> Result<()> {
        let submission_uri = submission_uri.into();
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Claimed {
            return Err(job.not_claimed());
        }
        if job.worker.as_ref() != Some(caller) {
            return Err(AgoraError::NotAssignedWorker {
                job_id: job_id.0,
                caller: caller.to_string(),
            });
        }
        if submission_uri.is_empty() {
            return Err(AgoraError::EmptySubmission);
        }

        let now = self.clock.now();
        if let Some(deadline) = job.work_deadline() {
            if now > deadline {
                return Err(AgoraError::WorkDeadlineExceeded {
                    job_id: job_id.0,
                    deadline: deadline.to_rfc3339(),
                });
            }
        }

        job.status = JobStatus::Submitted;
        job.submission_uri = Some(submission_uri.clone());

        info!(%job_id, worker = %caller, uri = %submission_uri, "work submitted");
        self.emit(JobEvent::WorkSubmitted {
            job_id,
            worker: caller.clone(),
            submission_uri,
            timestamp: now,
        });
        Ok(())
    }

    /// Approve submitted work, pay the worker, and record the rating
    ///
    /// The payout happens before the status advances; if it fails, the job
    /// stays `Submitted` and nothing is recorded.
    pub async fn approve_work(&self, job_id: JobId, caller: &AgentId, rating: u8) -> Result<()> {
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Submitted {
            return Err(job.not_submitted());
        }
        if caller != &job.requester {
            return Err(AgoraError::NotRequester {
                job_id: job_id.0,
                caller: caller.to_string(),
            });
        }
        if rating > 100 {
            return Err(AgoraError::InvalidRating { rating });
        }
        let worker = job.worker.clone().ok_or_else(|| job.not_submitted())?;

        let paid = job.locked_amount;
        self.escrow
            .release(job_id, &worker, paid)
            .await
            .map_err(|e| {
                warn!(%job_id, error = %e, "payout failed, approval rolled back");
                AgoraError::escrow_failed(job_id.0, e.to_string())
            })?;

        job.status = JobStatus::Completed;
        job.rating = Some(rating);

        self.reputation.record_completion(&worker, paid, rating).await;

        info!(%job_id, worker = %worker, %paid, rating, "job completed");
        self.emit(JobEvent::JobCompleted {
            job_id,
            worker,
            paid,
            rating,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Dispute submitted work and refund the locked amount to the requester
    ///
    /// The ledger only records the binary outcome; it is not an adjudicator.
    pub async fn dispute_work(&self, job_id: JobId, caller: &AgentId) -> Result<()> {
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Submitted {
            return Err(job.not_submitted());
        }
        if caller != &job.requester {
            return Err(AgoraError::NotRequester {
                job_id: job_id.0,
                caller: caller.to_string(),
            });
        }
        let worker = job.worker.clone().ok_or_else(|| job.not_submitted())?;

        let refund = job.locked_amount;
        self.escrow
            .refund_partial(job_id, &job.requester, refund)
            .await
            .map_err(|e| {
                warn!(%job_id, error = %e, "dispute refund failed");
                AgoraError::escrow_failed(job_id.0, e.to_string())
            })?;

        job.status = JobStatus::Disputed;

        self.reputation.record_dispute(&worker).await;

        info!(%job_id, worker = %worker, refunded = %refund, "job disputed");
        self.emit(JobEvent::JobDisputed {
            job_id,
            worker,
            refunded: refund,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Cancel an unclaimed job and refund the full escrow
    pub async fn cancel_job(&self, job_id: JobId, caller: &AgentId) -> Result<()> {
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Open {
            return Err(job.not_open());
        }
        if caller != &job.requester {
            return Err(AgoraError::NotRequester {
                job_id: job_id.0,
                caller: caller.to_string(),
            });
        }

        // Nothing has been locked yet, so the full ceiling comes back
        let refund = job.max_price;
        self.escrow
            .refund_partial(job_id, &job.requester, refund)
            .await
            .map_err(|e| {
                warn!(%job_id, error = %e, "cancel refund failed");
                AgoraError::escrow_failed(job_id.0, e.to_string())
            })?;

        job.status = JobStatus::Cancelled;

        info!(%job_id, refunded = %refund, "job cancelled");
        self.emit(JobEvent::JobCancelled {
            job_id,
            refunded: refund,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Expire a claimed job whose work deadline has passed
    ///
    /// Permissionless cleanup: any identity may call this, so expiry can be
    /// triggered even if the worker never calls back in. Refunds the locked
    /// amount to the requester. No reputation penalty is recorded.
    pub async fn expire_job(&self, job_id: JobId, caller: &AgentId) -> Result<()> {
        let handle = self.store.get(job_id).await?;
        let mut job = handle.lock().await;

        if job.status != JobStatus::Claimed {
            return Err(job.not_claimed());
        }

        let now = self.clock.now();
        let deadline = job.work_deadline().ok_or_else(|| job.not_claimed())?;
        if now <= deadline {
            return Err(AgoraError::DeadlineNotYetPassed {
                job_id: job_id.0,
                deadline: deadline.to_rfc3339(),
            });
        }
        let worker = job.worker.clone().ok_or_else(|| job.not_claimed())?;

        let refund = job.locked_amount;
        self.escrow
            .refund_partial(job_id, &job.requester, refund)
            .await
            .map_err(|e| {
                warn!(%job_id, error = %e, "expiry refund failed");
                AgoraError::escrow_failed(job_id.0, e.to_string())
            })?;

        job.status = JobStatus::Expired;

        info!(%job_id, triggered_by = %caller, refunded = %refund, "job expired");
        self.emit(JobEvent::JobExpired {
            job_id,
            worker,
            refunded: refund,
            timestamp: now,
        });
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of a job's core and progress fields
    pub async fn job(&self, job_id: JobId) -> Result<Job> {
        self.store.snapshot(job_id).await
    }

    /// Current auction price of a job
    ///
    /// Pure function of elapsed time: `min_price` at the start of the
    /// auction, `max_price` at or past its end, linear (with truncating
    /// division) in between.
    pub async fn current_price(&self, job_id: JobId) -> Result<Amount> {
        let job = self.store.snapshot(job_id).await?;
        job.price_at(self.clock.now())
    }

    /// Number of jobs ever posted
    pub async fn job_count(&self) -> u64 {
        self.store.len().await
    }

    /// Aggregate reputation stats for an agent
    pub async fn stats_of(&self, agent: &AgentId) -> AgentStatsView {
        self.reputation.stats_of(agent).await
    }
}
