//! Error types for Agora
//!
//! Every failure is explicit and typed. Validation, precondition, not-found
//! and collaborator failures are all reported synchronously to the caller;
//! nothing is swallowed or retried by the core.

use thiserror::Error;

/// Result type for Agora operations
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Agora error types
#[derive(Debug, Clone, Error)]
pub enum AgoraError {
    // ========================================================================
    // Amount Errors
    // ========================================================================

    /// Amount overflow during arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Amount underflow during arithmetic
    #[error("Amount underflow during arithmetic operation")]
    AmountUnderflow,

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Not-Found Errors
    // ========================================================================

    /// Job not found
    #[error("Job {job_id} not found")]
    JobNotFound { job_id: u64 },

    // ========================================================================
    // Precondition / State Errors
    // ========================================================================

    /// Job is not open for claiming or cancellation
    #[error("Job {job_id} is not open (status: {status})")]
    JobNotOpen { job_id: u64, status: String },

    /// Job is not in the claimed state
    #[error("Job {job_id} is not claimed (status: {status})")]
    JobNotClaimed { job_id: u64, status: String },

    /// Job has no pending submission
    #[error("Job {job_id} has no pending submission (status: {status})")]
    JobNotSubmitted { job_id: u64, status: String },

    /// Requester attempted to claim their own job
    #[error("Requester cannot claim their own job {job_id}")]
    RequesterCannotClaimOwnJob { job_id: u64 },

    /// Caller is not the job's requester
    #[error("Caller {caller} is not the requester of job {job_id}")]
    NotRequester { job_id: u64, caller: String },

    /// Caller is not the job's assigned worker
    #[error("Caller {caller} is not the assigned worker of job {job_id}")]
    NotAssignedWorker { job_id: u64, caller: String },

    /// Work deadline has passed
    #[error("Work deadline for job {job_id} passed at {deadline}")]
    WorkDeadlineExceeded { job_id: u64, deadline: String },

    /// Work deadline has not yet passed
    #[error("Work deadline for job {job_id} has not passed (deadline: {deadline})")]
    DeadlineNotYetPassed { job_id: u64, deadline: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Submission URI is empty
    #[error("Submission URI must not be empty")]
    EmptySubmission,

    /// Rating out of range
    #[error("Rating {rating} is out of range (0-100)")]
    InvalidRating { rating: u8 },

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // ========================================================================
    // Collaborator Failures
    // ========================================================================

    /// Escrow movement failed
    #[error("Escrow transfer failed for job {job_id}: {reason}")]
    EscrowTransferFailed { job_id: u64, reason: String },

    /// Insufficient funds in an escrow account
    #[error("Insufficient funds for {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        requested: u64,
        available: u64,
    },
}

impl AgoraError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an escrow transfer failure
    pub fn escrow_failed(job_id: u64, reason: impl Into<String>) -> Self {
        Self::EscrowTransferFailed {
            job_id,
            reason: reason.into(),
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::AmountUnderflow => "AMOUNT_UNDERFLOW",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::JobNotFound { .. } => "JOB_NOT_FOUND",
            Self::JobNotOpen { .. } => "JOB_NOT_OPEN",
            Self::JobNotClaimed { .. } => "JOB_NOT_CLAIMED",
            Self::JobNotSubmitted { .. } => "JOB_NOT_SUBMITTED",
            Self::RequesterCannotClaimOwnJob { .. } => "REQUESTER_CANNOT_CLAIM_OWN_JOB",
            Self::NotRequester { .. } => "NOT_REQUESTER",
            Self::NotAssignedWorker { .. } => "NOT_ASSIGNED_WORKER",
            Self::WorkDeadlineExceeded { .. } => "WORK_DEADLINE_EXCEEDED",
            Self::DeadlineNotYetPassed { .. } => "DEADLINE_NOT_YET_PASSED",
            Self::EmptySubmission => "EMPTY_SUBMISSION",
            Self::InvalidRating { .. } => "INVALID_RATING",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::EscrowTransferFailed { .. } => "ESCROW_TRANSFER_FAILED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AgoraError::JobNotOpen {
            job_id: 3,
            status: "Claimed".to_string(),
        };
        assert_eq!(err.error_code(), "JOB_NOT_OPEN");

        let err = AgoraError::escrow_failed(0, "account unfunded");
        assert_eq!(err.error_code(), "ESCROW_TRANSFER_FAILED");
    }

    #[test]
    fn test_display() {
        let err = AgoraError::InvalidRating { rating: 101 };
        assert_eq!(err.to_string(), "Rating 101 is out of range (0-100)");
    }
}
