use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::ConditionError;

/// Wallet address that a condition is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    /// Create a subject from a wallet address.
    ///
    /// Fails with [`ConditionError::EmptySubject`] for empty or blank input.
    pub fn new(address: impl Into<String>) -> Result<Self, ConditionError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(ConditionError::EmptySubject);
        }
        Ok(Self(address))
    }

    /// The wallet address.
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Subject {
    type Error = ConditionError;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        Self::new(address)
    }
}

impl TryFrom<&str> for Subject {
    type Error = ConditionError;

    fn try_from(address: &str) -> Result<Self, Self::Error> {
        Self::new(address)
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.0
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Chain identifier an authorization is scoped to (e.g. `rinkeby`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain(String);

impl Chain {
    /// Create a chain identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The chain name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new("rinkeby")
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Chain {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Chain {
    fn from(name: String) -> Self {
        Self(name)
    }
}
