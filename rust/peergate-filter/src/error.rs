use std::fmt::Display;
use std::time::Duration;

use peergate_authority::AuthorityError;
use peergate_condition::ConditionError;
use thiserror::Error;

/// Failures that abort a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The template cannot be bound; nothing was sent to the authority.
    #[error(transparent)]
    InvalidTemplate(ConditionError),

    /// The wallet declined to sign, or did not answer in time.
    #[error("Authorization rejected: {0}")]
    AuthRejected(String),

    /// The signing authority could not be reached.
    #[error("Signing authority unreachable: {0}")]
    Network(String),

    /// A newer filter request superseded this batch.
    #[error("Batch superseded by a newer filter request")]
    Cancelled,
}

/// The network steps of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStep {
    /// Registering the bound condition for the resource.
    Register,
    /// Requesting a token for the resource.
    RequestToken,
    /// Verifying the returned token.
    VerifyToken,
}

impl Display for EvaluationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => write!(f, "condition registration"),
            Self::RequestToken => write!(f, "token request"),
            Self::VerifyToken => write!(f, "token verification"),
        }
    }
}

/// Failures confined to a single subject. They degrade that subject to
/// "not eligible" and never abort the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The subject could not be bound into the template.
    #[error("Could not bind subject: {0}")]
    Binding(#[from] ConditionError),

    /// The authority did not store the condition.
    #[error("Registering the condition failed: {0}")]
    Registration(AuthorityError),

    /// The authority refused to issue a token.
    #[error("Token request refused: {0}")]
    TokenRequest(AuthorityError),

    /// The token could not be checked.
    #[error("Token verification failed: {0}")]
    Verification(AuthorityError),

    /// The token verified but is scoped to another resource or chain.
    #[error("Token claims do not match the requested resource")]
    ClaimsMismatch,

    /// A step exceeded its time budget.
    #[error("{step} timed out after {after:?}")]
    Timeout {
        /// The step that timed out.
        step: EvaluationStep,
        /// The budget that was exceeded.
        after: Duration,
    },
}
