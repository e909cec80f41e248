//! Agora Escrow - Escrow engine for the job market
//!
//! Funds never move directly between requester and worker. The full ceiling
//! price is locked when a job is posted, and every later movement (partial
//! refund at claim, payout on approval, refund on dispute/expiry/cancel) is
//! issued by the ledger against the job's held balance.
//!
//! Calls are synchronous-and-fallible from the ledger's point of view:
//! success or failure is known before the caller's operation returns, and
//! the engine never auto-retries.

use std::collections::HashMap;
use std::sync::Arc;

use agora_types::{AgentId, AgoraError, Amount, JobId, Result};
use tokio::sync::RwLock;
use tracing::debug;

/// Escrow engine consumed by the job ledger
///
/// All calls are scoped to one job. `lock` moves funds from an account into
/// the job's held balance; `release` and `refund_partial` move funds out of
/// it. A failed call must leave balances untouched.
#[async_trait::async_trait]
pub trait EscrowEngine: Send + Sync {
    /// Lock `amount` from `from` into the job's escrow
    async fn lock(&self, job_id: JobId, from: &AgentId, amount: Amount) -> Result<()>;

    /// Release `amount` from the job's escrow to `to`
    async fn release(&self, job_id: JobId, to: &AgentId, amount: Amount) -> Result<()>;

    /// Refund `amount` from the job's escrow back to `to`
    async fn refund_partial(&self, job_id: JobId, to: &AgentId, amount: Amount) -> Result<()>;
}

/// Balances held by the in-memory escrow
#[derive(Debug, Default)]
struct EscrowBook {
    /// Free balance per account
    accounts: HashMap<AgentId, Amount>,
    /// Amount held per job
    held: HashMap<JobId, Amount>,
}

/// In-memory escrow engine
///
/// Tracks free account balances and the amount held per job, enforcing that
/// no account and no job balance ever goes negative. Used by tests and the
/// demo; a production deployment substitutes the external ledger service
/// behind the same trait.
#[derive(Clone, Default)]
pub struct InMemoryEscrow {
    book: Arc<RwLock<EscrowBook>>,
}

impl InMemoryEscrow {
    /// Create an empty escrow engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account's free balance
    pub async fn deposit(&self, account: &AgentId, amount: Amount) -> Result<()> {
        let mut book = self.book.write().await;
        let balance = book.accounts.entry(account.clone()).or_default();
        *balance = balance.checked_add(amount)?;
        Ok(())
    }

    /// Free balance of an account
    pub async fn balance_of(&self, account: &AgentId) -> Amount {
        let book = self.book.read().await;
        book.accounts.get(account).copied().unwrap_or_default()
    }

    /// Amount currently held for a job
    pub async fn held_for(&self, job_id: JobId) -> Amount {
        let book = self.book.read().await;
        book.held.get(&job_id).copied().unwrap_or_default()
    }

    /// Total amount held across all jobs
    pub async fn total_held(&self) -> Amount {
        let book = self.book.read().await;
        book.held.values().copied().sum()
    }

    /// Move funds out of a job's held balance into an account
    async fn pay_out(&self, job_id: JobId, to: &AgentId, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut book = self.book.write().await;

        let held = book.held.get(&job_id).copied().unwrap_or_default();
        let remaining = held.checked_sub(amount).map_err(|_| {
            AgoraError::InsufficientFunds {
                account: job_id.to_string(),
                requested: amount.0,
                available: held.0,
            }
        })?;
        book.held.insert(job_id, remaining);

        let balance = book.accounts.entry(to.clone()).or_default();
        *balance = balance.checked_add(amount)?;

        debug!(%job_id, account = %to, %amount, %remaining, "escrow pay-out");
        Ok(())
    }
}

#[async_trait::async_trait]
impl EscrowEngine for InMemoryEscrow {
    async fn lock(&self, job_id: JobId, from: &AgentId, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut book = self.book.write().await;

        let balance = book.accounts.get(from).copied().unwrap_or_default();
        let remaining = balance.checked_sub(amount).map_err(|_| {
            AgoraError::InsufficientFunds {
                account: from.to_string(),
                requested: amount.0,
                available: balance.0,
            }
        })?;
        book.accounts.insert(from.clone(), remaining);

        let held = book.held.entry(job_id).or_default();
        *held = held.checked_add(amount)?;

        debug!(%job_id, account = %from, %amount, "escrow lock");
        Ok(())
    }

    async fn release(&self, job_id: JobId, to: &AgentId, amount: Amount) -> Result<()> {
        self.pay_out(job_id, to, amount).await
    }

    async fn refund_partial(&self, job_id: JobId, to: &AgentId, amount: Amount) -> Result<()> {
        self.pay_out(job_id, to, amount).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_and_release() {
        let escrow = InMemoryEscrow::new();
        let requester = AgentId::new();
        let worker = AgentId::new();
        let job = JobId(0);

        escrow.deposit(&requester, Amount::new(500)).await.unwrap();
        escrow.lock(job, &requester, Amount::new(200)).await.unwrap();

        assert_eq!(escrow.balance_of(&requester).await, Amount::new(300));
        assert_eq!(escrow.held_for(job).await, Amount::new(200));

        escrow.release(job, &worker, Amount::new(200)).await.unwrap();
        assert_eq!(escrow.held_for(job).await, Amount::zero());
        assert_eq!(escrow.balance_of(&worker).await, Amount::new(200));
    }

    #[tokio::test]
    async fn test_lock_insufficient_funds() {
        let escrow = InMemoryEscrow::new();
        let requester = AgentId::new();

        escrow.deposit(&requester, Amount::new(100)).await.unwrap();
        let result = escrow.lock(JobId(0), &requester, Amount::new(200)).await;

        assert!(matches!(
            result,
            Err(AgoraError::InsufficientFunds { .. })
        ));
        // Failed lock leaves the balance untouched
        assert_eq!(escrow.balance_of(&requester).await, Amount::new(100));
        assert_eq!(escrow.held_for(JobId(0)).await, Amount::zero());
    }

    #[tokio::test]
    async fn test_release_cannot_exceed_held() {
        let escrow = InMemoryEscrow::new();
        let requester = AgentId::new();
        let worker = AgentId::new();
        let job = JobId(3);

        escrow.deposit(&requester, Amount::new(100)).await.unwrap();
        escrow.lock(job, &requester, Amount::new(100)).await.unwrap();

        let result = escrow.release(job, &worker, Amount::new(150)).await;
        assert!(matches!(
            result,
            Err(AgoraError::InsufficientFunds { .. })
        ));
        assert_eq!(escrow.held_for(job).await, Amount::new(100));
        assert_eq!(escrow.balance_of(&worker).await, Amount::zero());
    }

    #[tokio::test]
    async fn test_partial_refund_then_release() {
        let escrow = InMemoryEscrow::new();
        let requester = AgentId::new();
        let worker = AgentId::new();
        let job = JobId(1);

        escrow.deposit(&requester, Amount::new(200)).await.unwrap();
        escrow.lock(job, &requester, Amount::new(200)).await.unwrap();

        // Claim at mid-auction: 50 back to the requester, 150 stays held
        escrow
            .refund_partial(job, &requester, Amount::new(50))
            .await
            .unwrap();
        assert_eq!(escrow.held_for(job).await, Amount::new(150));
        assert_eq!(escrow.balance_of(&requester).await, Amount::new(50));

        escrow.release(job, &worker, Amount::new(150)).await.unwrap();
        assert_eq!(escrow.total_held().await, Amount::zero());
        assert_eq!(escrow.balance_of(&worker).await, Amount::new(150));
    }

    #[tokio::test]
    async fn test_zero_movements_are_noops() {
        let escrow = InMemoryEscrow::new();
        let agent = AgentId::new();

        escrow.lock(JobId(0), &agent, Amount::zero()).await.unwrap();
        escrow
            .refund_partial(JobId(0), &agent, Amount::zero())
            .await
            .unwrap();
        assert_eq!(escrow.held_for(JobId(0)).await, Amount::zero());
    }
}
