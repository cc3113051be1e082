use crate::BatchError;

/// Progress of the most recent batch, for UI binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterState {
    /// Filtering is off, or nothing has run yet.
    #[default]
    Idle,
    /// Waiting for the wallet to sign the batch authorization.
    Authorizing,
    /// Evaluating peers.
    Evaluating {
        /// Number of distinct peers being evaluated.
        total: usize,
    },
    /// The filtered list is available.
    Ready {
        /// Conversations kept.
        eligible: usize,
        /// Conversations considered.
        total: usize,
    },
    /// The batch was aborted before any peer was evaluated.
    Failed(BatchError),
}

impl FilterState {
    /// Whether a batch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Authorizing | Self::Evaluating { .. })
    }
}
