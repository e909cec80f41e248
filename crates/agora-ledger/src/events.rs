//! Ledger events
//!
//! One event per successful transition, broadcast to all subscribers
//! (dashboards, CLI polls, notification fan-out). Events are observations,
//! not part of any contract: a dropped or lagging receiver never blocks or
//! fails a transition.

use agora_types::{AgentId, Amount, JobId, RegistryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the job ledger on successful transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// A job was posted and its ceiling price escrowed
    JobPosted {
        job_id: JobId,
        requester: AgentId,
        min_price: Amount,
        max_price: Amount,
        auction_duration_secs: u64,
        timestamp: DateTime<Utc>,
    },

    /// A worker claimed the job at the current auction price
    JobClaimed {
        job_id: JobId,
        worker: AgentId,
        worker_registry_id: RegistryId,
        locked_amount: Amount,
        refunded: Amount,
        timestamp: DateTime<Utc>,
    },

    /// The worker submitted their work
    WorkSubmitted {
        job_id: JobId,
        worker: AgentId,
        submission_uri: String,
        timestamp: DateTime<Utc>,
    },

    /// The requester approved the work; escrow paid to the worker
    JobCompleted {
        job_id: JobId,
        worker: AgentId,
        paid: Amount,
        rating: u8,
        timestamp: DateTime<Utc>,
    },

    /// The requester disputed the work; escrow refunded
    JobDisputed {
        job_id: JobId,
        worker: AgentId,
        refunded: Amount,
        timestamp: DateTime<Utc>,
    },

    /// The requester cancelled an unclaimed job; escrow refunded
    JobCancelled {
        job_id: JobId,
        refunded: Amount,
        timestamp: DateTime<Utc>,
    },

    /// The work deadline passed without submission; escrow refunded
    JobExpired {
        job_id: JobId,
        worker: AgentId,
        refunded: Amount,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// The job this event concerns
    pub fn job_id(&self) -> JobId {
        match self {
            Self::JobPosted { job_id, .. }
            | Self::JobClaimed { job_id, .. }
            | Self::WorkSubmitted { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobDisputed { job_id, .. }
            | Self::JobCancelled { job_id, .. }
            | Self::JobExpired { job_id, .. } => *job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tag() {
        let event = JobEvent::JobCancelled {
            job_id: JobId(4),
            refunded: Amount::new(200),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "JobCancelled");
        assert_eq!(event.job_id(), JobId(4));
    }
}
