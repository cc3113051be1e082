use thiserror::Error;

/// Errors raised while reading or binding access-control conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The template cannot be bound: it has no clauses, or the binding slot
    /// does not point at an existing parameter of a clause.
    #[error("Invalid condition template: {0}")]
    InvalidTemplate(String),

    /// A subject was constructed from an empty address.
    #[error("Subject address must not be empty")]
    EmptySubject,

    /// The picker payload could not be decoded.
    #[error("Malformed condition payload: {0}")]
    Malformed(String),
}
