//! Scripted walk through one job's life: post, claim mid-auction, submit,
//! approve. Prints every ledger event and the final balances.
//!
//! Run with `RUST_LOG=debug cargo run -p agora-demo` to see the escrow
//! movements as they happen.

use std::sync::Arc;

use agora_escrow::InMemoryEscrow;
use agora_ledger::{JobLedger, ManualClock};
use agora_reputation::ReputationTracker;
use agora_types::{AgentId, Amount};
use anyhow::Result;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let escrow = InMemoryEscrow::new();
    let clock = Arc::new(ManualClock::starting_at(Utc::now()));
    let ledger = JobLedger::with_clock(
        Arc::new(escrow.clone()),
        ReputationTracker::new(),
        clock.clone(),
    );
    let mut events = ledger.subscribe();

    let requester = AgentId::new();
    let worker = AgentId::new();
    escrow.deposit(&requester, Amount::new(1_000)).await?;

    info!(%requester, %worker, "agents funded and ready");

    // Post: 100..200 over a 60 second auction, one hour to do the work
    let job_id = ledger
        .post_job(
            &requester,
            "label 5k images for a vision benchmark",
            Amount::new(100),
            Amount::new(200),
            60,
            3_600,
        )
        .await?;

    // Half the auction elapses before anyone bites
    clock.advance_secs(30);
    let price = ledger.current_price(job_id).await?;
    info!(%job_id, %price, "auction at the halfway mark");

    let locked = ledger.claim_job(job_id, &worker, 7).await?;
    info!(%job_id, %locked, "worker claimed at the current price");

    ledger
        .submit_work(job_id, &worker, "s3://agora-demo/results/labels.parquet")
        .await?;
    ledger.approve_work(job_id, &requester, 92).await?;

    while let Ok(event) = events.try_recv() {
        println!("event: {event:?}");
    }

    let stats = ledger.stats_of(&worker).await;
    println!(
        "worker: completed={} earned={} avg_rating={:?}",
        stats.completed_jobs, stats.total_earned, stats.average_rating
    );
    println!(
        "balances: requester={} worker={} escrowed={}",
        escrow.balance_of(&requester).await,
        escrow.balance_of(&worker).await,
        escrow.total_held().await,
    );

    Ok(())
}
