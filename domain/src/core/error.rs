//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid cycle count {0}: a debate needs at least one critique-defense cycle")]
    InvalidCycles(u32),

    #[error("Council needs at least 2 participants, got {0}")]
    NotEnoughParticipants(usize),
}
