//! In-process signing authority.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::{SigningKey, VerifyingKey};
use peergate_condition::{AccessControlCondition, Chain, ResourceDescriptor};
use tokio::sync::RwLock;

use crate::{
    AuthSignature, AuthorityError, Ed25519Wallet, SignedToken, SigningAuthority, TokenClaims,
    TokenVerification, Wallet, unix_now,
};

mod ledger;
pub use ledger::*;

/// Default lifetime of issued tokens.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Number of calls a [`MemoryAuthority`] has served, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `connect` calls.
    pub connect: usize,
    /// `sign_auth_message` calls.
    pub sign: usize,
    /// `register_condition` calls.
    pub register: usize,
    /// `request_token` calls.
    pub request: usize,
    /// `verify_token` calls.
    pub verify: usize,
}

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    decline_signing: bool,
    failing_registrations: HashSet<String>,
    rejected_tokens: HashSet<String>,
}

#[derive(Debug, Clone)]
struct Registration {
    condition: AccessControlCondition,
    chain: Chain,
}

#[derive(Debug, Default)]
struct State {
    wallets: HashMap<String, VerifyingKey>,
    registrations: HashMap<String, Registration>,
    ledger: Ledger,
    faults: Faults,
    calls: CallCounts,
}

/// Signing authority that judges conditions against an in-memory [`Ledger`].
///
/// Clones share state, so a test can keep a handle to inspect call counts
/// and inject faults while another handle is being used by the code under
/// test.
///
/// ```
/// use peergate_authority::{Ed25519Wallet, MemoryAuthority, SigningAuthority};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let authority = MemoryAuthority::new(Ed25519Wallet::generate("0xME"));
/// authority.set_balance("0xToken", "0xA", 500).await;
///
/// authority.connect().await?;
/// let auth = authority.sign_auth_message(&"rinkeby".into()).await?;
/// assert_eq!(auth.address, "0xME");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryAuthority {
    issuer: String,
    key: SigningKey,
    wallet: Ed25519Wallet,
    token_lifetime: Duration,
    latency: Option<Duration>,
    state: Arc<RwLock<State>>,
}

impl MemoryAuthority {
    /// Create an authority with a fresh key. `wallet` is the wallet the
    /// authority asks to sign auth messages, and is trusted.
    pub fn new(wallet: Ed25519Wallet) -> Self {
        Self::with_key(wallet, SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Create an authority signing tokens with `key`.
    pub fn with_key(wallet: Ed25519Wallet, key: SigningKey) -> Self {
        let mut state = State::default();
        state
            .wallets
            .insert(wallet.address().to_owned(), wallet.verifying_key());

        Self {
            issuer: "peergate-memory-authority".into(),
            key,
            wallet,
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
            latency: None,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Set the lifetime of issued tokens.
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Delay every remote operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Public key tokens are signed with.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// The wallet auth messages are signed by.
    pub fn wallet(&self) -> &Ed25519Wallet {
        &self.wallet
    }

    /// Accept auth signatures from another wallet.
    pub async fn trust(&self, wallet: &Ed25519Wallet) {
        self.state
            .write()
            .await
            .wallets
            .insert(wallet.address().to_owned(), wallet.verifying_key());
    }

    /// Record `amount` as the balance `holder` has in `contract`.
    pub async fn set_balance(&self, contract: &str, holder: &str, amount: u128) {
        self.state.write().await.ledger.set(contract, holder, amount);
    }

    /// Make the authority unreachable (or reachable again).
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.faults.offline = offline;
    }

    /// Make the wallet decline (or accept) signature requests.
    pub async fn decline_signing(&self, decline: bool) {
        self.state.write().await.faults.decline_signing = decline;
    }

    /// Fail every registration of a condition naming `address`.
    pub async fn fail_registration_for(&self, address: &str) {
        self.state
            .write()
            .await
            .faults
            .failing_registrations
            .insert(address.to_ascii_lowercase());
    }

    /// Reject every token request for a condition naming `address`, whether
    /// or not the condition holds.
    pub async fn reject_tokens_for(&self, address: &str) {
        self.state
            .write()
            .await
            .faults
            .rejected_tokens
            .insert(address.to_ascii_lowercase());
    }

    /// Calls served so far.
    pub async fn calls(&self) -> CallCounts {
        self.state.read().await.calls
    }

    /// The condition registered for `resource`, if any.
    pub async fn registered_condition(
        &self,
        resource: &ResourceDescriptor,
    ) -> Option<AccessControlCondition> {
        self.state
            .read()
            .await
            .registrations
            .get(&resource_key(resource))
            .map(|registration| registration.condition.clone())
    }

    async fn round_trip(&self) -> Result<(), AuthorityError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.state.read().await.faults.offline {
            return Err(AuthorityError::Network("signing authority unreachable".into()));
        }
        Ok(())
    }
}

impl State {
    fn check_auth(&self, auth: &AuthSignature) -> Result<(), AuthorityError> {
        let key = self.wallets.get(&auth.address).ok_or_else(|| {
            AuthorityError::Unauthorized(format!("unknown wallet {}", auth.address))
        })?;
        auth.verify_with(key)
    }
}

#[async_trait]
impl SigningAuthority for MemoryAuthority {
    async fn connect(&self) -> Result<(), AuthorityError> {
        self.state.write().await.calls.connect += 1;
        self.round_trip().await
    }

    async fn sign_auth_message(&self, chain: &Chain) -> Result<AuthSignature, AuthorityError> {
        {
            let mut state = self.state.write().await;
            state.calls.sign += 1;
            if state.faults.decline_signing {
                return Err(AuthorityError::Rejected(
                    "wallet owner declined the signature request".into(),
                ));
            }
        }
        self.round_trip().await?;

        AuthSignature::sign(&self.wallet, chain, unix_now()).await
    }

    async fn register_condition(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<(), AuthorityError> {
        self.state.write().await.calls.register += 1;
        self.round_trip().await?;

        let mut state = self.state.write().await;
        state.check_auth(auth)?;

        if names_any(condition, &state.faults.failing_registrations) {
            return Err(AuthorityError::Rejected("condition could not be stored".into()));
        }

        let key = resource_key(resource);
        if let Some(existing) = state.registrations.get(&key) {
            if existing.condition != *condition || existing.chain != *chain {
                return Err(AuthorityError::Rejected(format!(
                    "resource {} already carries a different condition",
                    resource.path
                )));
            }
        }

        tracing::debug!(path = %resource.path, "Registered signing condition");
        state.registrations.insert(
            key,
            Registration {
                condition: condition.clone(),
                chain: chain.clone(),
            },
        );
        Ok(())
    }

    async fn request_token(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<SignedToken, AuthorityError> {
        self.state.write().await.calls.request += 1;
        self.round_trip().await?;

        let state = self.state.read().await;
        state.check_auth(auth)?;

        let registration = state
            .registrations
            .get(&resource_key(resource))
            .ok_or_else(|| {
                AuthorityError::Rejected(format!("no condition registered for {}", resource.path))
            })?;
        if registration.condition != *condition || registration.chain != *chain {
            return Err(AuthorityError::Rejected(
                "condition does not match the one registered for the resource".into(),
            ));
        }

        if names_any(condition, &state.faults.rejected_tokens) {
            return Err(AuthorityError::Rejected("token request refused".into()));
        }

        if !state.ledger.satisfied(condition, &auth.address) {
            return Err(AuthorityError::Rejected(
                "not authorized: access control condition not met".into(),
            ));
        }

        let claims = TokenClaims::for_resource(
            self.issuer.clone(),
            auth.address.clone(),
            chain.clone(),
            resource,
            unix_now(),
            self.token_lifetime.as_secs(),
        );
        SignedToken::issue(&claims, &self.key)
    }

    async fn verify_token(&self, token: &SignedToken) -> Result<TokenVerification, AuthorityError> {
        self.state.write().await.calls.verify += 1;
        Ok(TokenVerification::check(
            token,
            &self.key.verifying_key(),
            unix_now(),
        ))
    }
}

fn resource_key(resource: &ResourceDescriptor) -> String {
    format!(
        "{}{}|{}|{}|{}",
        resource.base_url, resource.path, resource.org_id, resource.role, resource.extra_data
    )
}

fn names_any(condition: &AccessControlCondition, addresses: &HashSet<String>) -> bool {
    !addresses.is_empty()
        && condition
            .clauses()
            .flat_map(|clause| clause.parameters.iter())
            .any(|parameter| addresses.contains(&parameter.to_ascii_lowercase()))
}
