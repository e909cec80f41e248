//! Reputation aggregates for Agora
//!
//! One `AgentStats` row per agent, created lazily on the first terminal
//! event that touches the agent. The average rating is never stored; it is
//! derived at query time to avoid truncation drift across writes.

use crate::Amount;
use serde::{Deserialize, Serialize};

/// Cumulative statistics for one agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Jobs completed and paid out
    pub completed_jobs: u64,
    /// Jobs that ended in a dispute
    pub disputed_jobs: u64,
    /// Total amount earned across completed jobs
    pub total_earned: Amount,
    /// Sum of ratings across completed jobs
    pub total_rating_sum: u64,
}

impl AgentStats {
    /// Average rating across completed jobs, or `None` if nothing completed
    pub fn average_rating(&self) -> Option<u64> {
        if self.completed_jobs == 0 {
            None
        } else {
            Some(self.total_rating_sum / self.completed_jobs)
        }
    }
}

/// Read-only view of an agent's stats, with the average already derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatsView {
    pub completed_jobs: u64,
    pub disputed_jobs: u64,
    pub total_earned: Amount,
    /// `None` when the agent has no completed jobs (reported as "no rating")
    pub average_rating: Option<u64>,
}

impl From<&AgentStats> for AgentStatsView {
    fn from(stats: &AgentStats) -> Self {
        Self {
            completed_jobs: stats.completed_jobs,
            disputed_jobs: stats.disputed_jobs,
            total_earned: stats.total_earned,
            average_rating: stats.average_rating(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rating_without_completions() {
        let stats = AgentStats::default();
        assert_eq!(stats.average_rating(), None);

        let view = AgentStatsView::from(&stats);
        assert_eq!(view.average_rating, None);
        assert_eq!(view.total_earned, Amount::zero());
    }

    #[test]
    fn test_average_rating_truncates_at_query_time() {
        let stats = AgentStats {
            completed_jobs: 3,
            disputed_jobs: 1,
            total_earned: Amount::new(450),
            total_rating_sum: 80 + 90 + 99,
        };
        // 269 / 3 = 89.66.. -> 89
        assert_eq!(stats.average_rating(), Some(89));
    }
}
