use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

/// Number of random characters in a resource path.
pub const RESOURCE_PATH_LENGTH: usize = 32;

/// Generate a fresh, unguessable resource path (`/` plus random alphanumerics).
pub fn new_resource_path() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESOURCE_PATH_LENGTH)
        .map(char::from)
        .collect();
    format!("/{random}")
}

/// The resource a condition is registered for and a token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Origin the resource belongs to.
    pub base_url: String,
    /// Random, per-evaluation path.
    pub path: String,
    /// Always empty for conversation gating.
    pub org_id: String,
    /// Always empty for conversation gating.
    pub role: String,
    /// Always empty for conversation gating.
    pub extra_data: String,
}

/// Mints a new [`ResourceDescriptor`] under a fixed base URL for every
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNamer {
    base_url: String,
}

impl ResourceNamer {
    /// Create a namer for resources under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// The base URL descriptors are minted under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Mint a descriptor with a never-before-used path.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            base_url: self.base_url.clone(),
            path: new_resource_path(),
            org_id: String::new(),
            role: String::new(),
            extra_data: String::new(),
        }
    }
}
