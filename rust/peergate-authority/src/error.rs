use thiserror::Error;

/// Errors reported by a signing authority client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// The authority (or the wallet) refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The authority could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The auth signature presented with a request is not acceptable.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A token could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The wallet failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// An operation that needs authority state ran before `connect`.
    #[error("Not connected to the signing authority")]
    NotConnected,
}
