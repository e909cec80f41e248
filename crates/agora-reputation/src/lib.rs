//! Agora Reputation - Per-agent aggregate statistics
//!
//! A pure accounting sink. The tracker is invoked only by the job ledger on
//! successful terminal transitions, so its mutators never fail: they only
//! aggregate already-validated data. Rows are created lazily on the first
//! terminal event touching an agent.

use std::collections::HashMap;
use std::sync::Arc;

use agora_types::{AgentId, AgentStats, AgentStatsView, Amount};
use tokio::sync::RwLock;
use tracing::debug;

/// Tracker of per-agent completion and dispute aggregates
#[derive(Clone, Default)]
pub struct ReputationTracker {
    stats: Arc<RwLock<HashMap<AgentId, AgentStats>>>,
}

impl ReputationTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed job: one more completion, `amount` earned,
    /// `rating` added to the rating sum
    pub async fn record_completion(&self, agent: &AgentId, amount: Amount, rating: u8) {
        let mut stats = self.stats.write().await;
        let row = stats.entry(agent.clone()).or_default();
        row.completed_jobs += 1;
        row.total_earned = row
            .total_earned
            .checked_add(amount)
            .unwrap_or(row.total_earned);
        row.total_rating_sum += rating as u64;
        debug!(agent = %agent, %amount, rating, "recorded completion");
    }

    /// Record a disputed job
    pub async fn record_dispute(&self, agent: &AgentId) {
        let mut stats = self.stats.write().await;
        let row = stats.entry(agent.clone()).or_default();
        row.disputed_jobs += 1;
        debug!(agent = %agent, "recorded dispute");
    }

    /// Aggregate stats for an agent, with the average rating derived at
    /// query time. Agents with no terminal events report all-zero stats.
    pub async fn stats_of(&self, agent: &AgentId) -> AgentStatsView {
        let stats = self.stats.read().await;
        match stats.get(agent) {
            Some(row) => AgentStatsView::from(row),
            None => AgentStatsView::from(&AgentStats::default()),
        }
    }
}
