//! Job lifecycle types for Agora
//!
//! A job moves through a closed state machine:
//!
//! ```text
//! Open --claim--> Claimed --submit--> Submitted --approve--> Completed
//! Open --cancel-> Cancelled                     --dispute--> Disputed
//! Claimed --expire (after deadline)--> Expired
//! ```
//!
//! Completed, Disputed, Expired and Cancelled are terminal: no field mutates
//! after entry.

use crate::{AgentId, AgoraError, Amount, JobId, RegistryId, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Posted, auction running, claimable by any worker
    Open,
    /// Claimed by a worker, work in progress
    Claimed,
    /// Work submitted, awaiting requester verdict
    Submitted,
    /// Approved and paid out
    Completed,
    /// Disputed by the requester, escrow refunded
    Disputed,
    /// Work deadline passed without submission, escrow refunded
    Expired,
    /// Cancelled by the requester before any claim
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Disputed | Self::Expired | Self::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "Open",
            Self::Claimed => "Claimed",
            Self::Submitted => "Submitted",
            Self::Completed => "Completed",
            Self::Disputed => "Disputed",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{name}")
    }
}

/// A posted work item
///
/// The requester escrows `max_price` at posting time. The claimable price
/// rises linearly from `min_price` to `max_price` over `auction_duration_secs`;
/// whatever is locked at claim time is exactly what will later be paid out or
/// refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Sequential id, assigned at posting, never reused
    pub id: JobId,
    /// Who posted and funded the job
    pub requester: AgentId,
    /// Opaque description of the work, non-empty
    pub description: String,
    /// Auction floor price
    pub min_price: Amount,
    /// Auction ceiling price; this is the amount escrowed at posting
    pub max_price: Amount,
    /// When the auction started (posting time)
    pub auction_start: DateTime<Utc>,
    /// Length of the price ramp, in whole seconds
    pub auction_duration_secs: u64,
    /// Time allowed for the work, in whole seconds from claim
    pub work_deadline_secs: u64,
    /// When the job was claimed
    pub claimed_at: Option<DateTime<Utc>>,
    /// The claiming worker; set exactly once
    pub worker: Option<AgentId>,
    /// Worker's record in the external identity registry
    pub worker_registry_id: Option<RegistryId>,
    /// Where the submitted work lives; opaque to the ledger
    pub submission_uri: Option<String>,
    /// Amount locked in escrow at claim time; zero until claimed
    pub locked_amount: Amount,
    /// Requester's rating on approval, 0-100
    pub rating: Option<u8>,
    /// Current lifecycle status
    pub status: JobStatus,
}

impl Job {
    /// Compute the auction price at the given instant
    ///
    /// Elapsed time is clamped to `[0, auction_duration_secs]`; the price is
    /// the linear interpolation between `min_price` and `max_price` with
    /// truncating integer division. At elapsed 0 the price is exactly
    /// `min_price`; at or past the auction end it is exactly `max_price`.
    pub fn price_at(&self, at: DateTime<Utc>) -> Result<Amount> {
        let secs = at.signed_duration_since(self.auction_start).num_seconds();
        // Clamp without casting the duration: it is a u64 and may exceed
        // i64::MAX, while negative elapsed pins to the floor
        let elapsed = (secs.max(0) as u64).min(self.auction_duration_secs);
        self.min_price
            .lerp(self.max_price, elapsed, self.auction_duration_secs)
    }

    /// The instant the work deadline passes, if the job has been claimed
    pub fn work_deadline(&self) -> Option<DateTime<Utc>> {
        self.claimed_at
            .map(|t| t + Duration::seconds(self.work_deadline_secs as i64))
    }

    /// Typed status error for operations that need the job `Open`
    pub fn not_open(&self) -> AgoraError {
        AgoraError::JobNotOpen {
            job_id: self.id.0,
            status: self.status.to_string(),
        }
    }

    /// Typed status error for operations that need the job `Claimed`
    pub fn not_claimed(&self) -> AgoraError {
        AgoraError::JobNotClaimed {
            job_id: self.id.0,
            status: self.status.to_string(),
        }
    }

    /// Typed status error for operations that need the job `Submitted`
    pub fn not_submitted(&self) -> AgoraError {
        AgoraError::JobNotSubmitted {
            job_id: self.id.0,
            status: self.status.to_string(),
        }
    }
}
