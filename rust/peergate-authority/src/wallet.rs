//! Wallets that sign authorization messages.

use async_trait::async_trait;
use ed25519_dalek::{SigningKey, VerifyingKey};
use signature::Signer;

use crate::AuthorityError;

/// A wallet able to prove control of an address by signing messages.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Address of the wallet.
    fn address(&self) -> &str;

    /// How signatures from this wallet are produced, recorded in the
    /// `derivedVia` field of an auth signature.
    fn derived_via(&self) -> &'static str;

    /// Sign a human-readable message.
    async fn sign_message(&self, message: &str) -> Result<Vec<u8>, AuthorityError>;
}

/// Wallet backed by an Ed25519 key held in memory.
#[derive(Debug, Clone)]
pub struct Ed25519Wallet {
    address: String,
    key: SigningKey,
}

impl Ed25519Wallet {
    /// `derivedVia` value for signatures produced by this wallet.
    pub const DERIVED_VIA: &'static str = "ed25519.sign";

    /// Wrap an existing key.
    pub fn new(address: impl Into<String>, key: SigningKey) -> Self {
        Self {
            address: address.into(),
            key,
        }
    }

    /// Generate a new key for `address`.
    pub fn generate(address: impl Into<String>) -> Self {
        Self::new(address, SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Deterministic wallet, handy for fixtures.
    pub fn from_seed(address: impl Into<String>, seed: [u8; 32]) -> Self {
        Self::new(address, SigningKey::from_bytes(&seed))
    }

    /// Public half of the wallet key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

#[async_trait]
impl Wallet for Ed25519Wallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn derived_via(&self) -> &'static str {
        Self::DERIVED_VIA
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>, AuthorityError> {
        let signature = self
            .key
            .try_sign(message.as_bytes())
            .map_err(|error| AuthorityError::Signing(error.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}
