//! Run-level error taxonomy

use council_domain::DomainError;
use thiserror::Error;

use crate::events::ConsumerGone;

/// Errors that abort a council run
///
/// Participant-level failures never appear here — they are isolated into
/// `model_error` events and the run continues.
#[derive(Error, Debug)]
pub enum RunError {
    /// Fewer than two participants succeeded in an initial or defense round
    #[error("quorum lost")]
    QuorumLost,

    /// Run configuration was rejected before any request was made
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The consumer cancelled the run
    #[error("run cancelled")]
    Cancelled,
}

impl From<ConsumerGone> for RunError {
    fn from(_: ConsumerGone) -> Self {
        RunError::Cancelled
    }
}
