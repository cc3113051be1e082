use std::time::Duration;

use peergate_condition::Chain;
use serde::{Deserialize, Serialize};

/// Configuration for a [`BatchFilter`](crate::BatchFilter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSettings {
    /// Chain the batch authorization is scoped to (default: "rinkeby")
    pub chain: Chain,

    /// Base URL resources are named under (default: "http://localhost:3000")
    pub base_url: String,

    /// Maximum number of peers evaluated at once (default: 16)
    pub concurrency: usize,

    /// Budget for each registration, token request and verification, in seconds (default: 30)
    pub step_timeout_seconds: u64,

    /// Budget for the wallet to sign the batch authorization, in seconds (default: 120)
    pub signing_timeout_seconds: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            chain: Chain::default(),
            base_url: "http://localhost:3000".to_string(),
            concurrency: 16,
            step_timeout_seconds: 30,
            signing_timeout_seconds: 120,
        }
    }
}

impl FilterSettings {
    /// Set the chain
    pub fn with_chain(mut self, chain: impl Into<Chain>) -> Self {
        self.chain = chain.into();
        self
    }

    /// Set the base URL resources are named under
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the concurrency limit (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-step timeout
    pub fn with_step_timeout(mut self, seconds: u64) -> Self {
        self.step_timeout_seconds = seconds;
        self
    }

    /// Set the signing timeout
    pub fn with_signing_timeout(mut self, seconds: u64) -> Self {
        self.signing_timeout_seconds = seconds;
        self
    }

    /// Per-step timeout as a [`Duration`]
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }

    /// Signing timeout as a [`Duration`]
    pub fn signing_timeout(&self) -> Duration {
        Duration::from_secs(self.signing_timeout_seconds)
    }

    /// Concurrency limit, never below 1
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency.max(1)
    }
}
