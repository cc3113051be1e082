//! Wallet-signed authorization statements.

use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::{Signature, VerifyingKey};
use peergate_condition::Chain;
use serde::{Deserialize, Serialize};

use crate::{AuthorityError, Wallet};

/// The statement a wallet signs to open a session with the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMessage {
    /// Address of the signing wallet.
    pub address: String,
    /// Chain the authorization is scoped to.
    pub chain: Chain,
    /// Unix seconds at which the statement was produced.
    pub issued_at: u64,
}

impl AuthMessage {
    /// Render the statement as the exact text that gets signed.
    pub fn render(&self) -> String {
        format!(
            "{} authorizes access-control checks on chain {}.\nIssued At: {}",
            self.address, self.chain, self.issued_at
        )
    }
}

/// Proof that the caller controls a wallet, scoped to one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSignature {
    /// Base64 signature over `signed_message`.
    pub sig: String,
    /// How the signature was produced.
    pub derived_via: String,
    /// The rendered [`AuthMessage`].
    pub signed_message: String,
    /// Address of the signing wallet.
    pub address: String,
}

impl AuthSignature {
    /// Ask `wallet` to sign an [`AuthMessage`] for `chain`.
    pub async fn sign(
        wallet: &dyn Wallet,
        chain: &Chain,
        issued_at: u64,
    ) -> Result<Self, AuthorityError> {
        let message = AuthMessage {
            address: wallet.address().to_owned(),
            chain: chain.clone(),
            issued_at,
        }
        .render();
        let signature = wallet.sign_message(&message).await?;

        Ok(Self {
            sig: STANDARD.encode(signature),
            derived_via: wallet.derived_via().to_owned(),
            signed_message: message,
            address: wallet.address().to_owned(),
        })
    }

    /// Check the signature against the wallet's public key.
    pub fn verify_with(&self, key: &VerifyingKey) -> Result<(), AuthorityError> {
        if !self.signed_message.starts_with(&self.address) {
            return Err(AuthorityError::Unauthorized(
                "signed message does not name the signing address".into(),
            ));
        }

        let bytes = STANDARD
            .decode(&self.sig)
            .map_err(|error| AuthorityError::Unauthorized(error.to_string()))?;
        let signature = Signature::from_slice(&bytes)
            .map_err(|error| AuthorityError::Unauthorized(error.to_string()))?;

        key.verify_strict(self.signed_message.as_bytes(), &signature)
            .map_err(|error| AuthorityError::Unauthorized(error.to_string()))
    }
}
