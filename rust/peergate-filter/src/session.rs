use std::sync::Arc;
use std::time::Duration;

use peergate_authority::{AuthSignature, AuthorityError, SigningAuthority};
use peergate_condition::Chain;
use tracing::{info, instrument};

use crate::BatchError;

/// The authorization shared by every evaluation of one batch.
///
/// Opening a session is the only interactive step of a batch: the wallet
/// owner signs once, and the signature is reused for every subject.
#[derive(Debug, Clone)]
pub struct AuthSession {
    chain: Chain,
    signature: Arc<AuthSignature>,
}

impl AuthSession {
    /// Connect to the authority and have the wallet sign for `chain`.
    ///
    /// Connection failures surface as [`BatchError::Network`]; a declined or
    /// unanswered signature request (after `timeout`) as
    /// [`BatchError::AuthRejected`].
    #[instrument(skip(authority), fields(chain = %chain))]
    pub async fn open<A>(authority: &A, chain: Chain, timeout: Duration) -> Result<Self, BatchError>
    where
        A: SigningAuthority + ?Sized,
    {
        tokio::time::timeout(timeout, authority.connect())
            .await
            .map_err(|_| BatchError::Network(format!("connecting timed out after {timeout:?}")))?
            .map_err(into_batch_error)?;

        let signature = tokio::time::timeout(timeout, authority.sign_auth_message(&chain))
            .await
            .map_err(|_| {
                BatchError::AuthRejected(format!("signature not provided within {timeout:?}"))
            })?
            .map_err(into_batch_error)?;

        info!(address = %signature.address, "Opened authorization session");

        Ok(Self {
            chain,
            signature: Arc::new(signature),
        })
    }

    /// Build a session from a signature obtained elsewhere.
    pub fn from_signature(chain: Chain, signature: AuthSignature) -> Self {
        Self {
            chain,
            signature: Arc::new(signature),
        }
    }

    /// The chain the session is scoped to.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The wallet signature.
    pub fn signature(&self) -> &AuthSignature {
        &self.signature
    }
}

fn into_batch_error(error: AuthorityError) -> BatchError {
    match error {
        AuthorityError::Rejected(reason)
        | AuthorityError::Unauthorized(reason)
        | AuthorityError::Signing(reason) => BatchError::AuthRejected(reason),
        AuthorityError::Network(reason) => BatchError::Network(reason),
        error @ (AuthorityError::InvalidToken(_) | AuthorityError::NotConnected) => {
            BatchError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peergate_authority::{Ed25519Wallet, MemoryAuthority};

    fn authority() -> MemoryAuthority {
        MemoryAuthority::new(Ed25519Wallet::from_seed("0xME", [1; 32]))
    }

    #[tokio::test]
    async fn it_opens_a_session_with_one_signature() {
        let authority = authority();
        let session = AuthSession::open(&authority, "rinkeby".into(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(session.chain(), &Chain::from("rinkeby"));
        assert_eq!(session.signature().address, "0xME");

        let calls = authority.calls().await;
        assert_eq!((calls.connect, calls.sign), (1, 1));
    }

    #[tokio::test]
    async fn it_reports_a_declined_signature() {
        let authority = authority();
        authority.decline_signing(true).await;

        assert!(matches!(
            AuthSession::open(&authority, "rinkeby".into(), Duration::from_secs(5)).await,
            Err(BatchError::AuthRejected(_))
        ));
    }

    #[tokio::test]
    async fn it_reports_an_unreachable_authority() {
        let authority = authority();
        authority.set_offline(true).await;

        assert!(matches!(
            AuthSession::open(&authority, "rinkeby".into(), Duration::from_secs(5)).await,
            Err(BatchError::Network(_))
        ));
        assert_eq!(authority.calls().await.sign, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn it_gives_up_on_an_authority_that_never_answers() {
        let authority = authority().with_latency(Duration::from_secs(600));

        assert!(matches!(
            AuthSession::open(&authority, "rinkeby".into(), Duration::from_secs(1)).await,
            Err(BatchError::Network(_))
        ));
    }

    /// Connects instantly, but its wallet never answers the signature request.
    struct SilentWallet;

    #[async_trait::async_trait]
    impl SigningAuthority for SilentWallet {
        async fn connect(&self) -> Result<(), AuthorityError> {
            Ok(())
        }

        async fn sign_auth_message(&self, _: &Chain) -> Result<AuthSignature, AuthorityError> {
            std::future::pending().await
        }

        async fn register_condition(
            &self,
            _: &peergate_condition::AccessControlCondition,
            _: &Chain,
            _: &AuthSignature,
            _: &peergate_condition::ResourceDescriptor,
        ) -> Result<(), AuthorityError> {
            Err(AuthorityError::NotConnected)
        }

        async fn request_token(
            &self,
            _: &peergate_condition::AccessControlCondition,
            _: &Chain,
            _: &AuthSignature,
            _: &peergate_condition::ResourceDescriptor,
        ) -> Result<peergate_authority::SignedToken, AuthorityError> {
            Err(AuthorityError::NotConnected)
        }

        async fn verify_token(
            &self,
            _: &peergate_authority::SignedToken,
        ) -> Result<peergate_authority::TokenVerification, AuthorityError> {
            Err(AuthorityError::NotConnected)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn it_treats_an_unanswered_signature_request_as_rejected() {
        assert!(matches!(
            AuthSession::open(&SilentWallet, "rinkeby".into(), Duration::from_secs(120)).await,
            Err(BatchError::AuthRejected(_))
        ));
    }
}
