use async_trait::async_trait;
use peergate_condition::{AccessControlCondition, Chain, ResourceDescriptor};

use crate::{AuthSignature, AuthorityError, SignedToken, TokenVerification};

/// Operations offered by a signing authority.
///
/// All methods take `&self` so that a single client can serve every
/// evaluation of a batch concurrently.
#[async_trait]
pub trait SigningAuthority: Send + Sync {
    /// Establish the connection to the authority.
    async fn connect(&self) -> Result<(), AuthorityError>;

    /// Have the current wallet sign an authorization statement for `chain`.
    ///
    /// This is an interactive step for the wallet owner and may be declined.
    async fn sign_auth_message(&self, chain: &Chain) -> Result<AuthSignature, AuthorityError>;

    /// Associate `condition` with `resource`, so tokens requested for the
    /// resource are judged against it.
    async fn register_condition(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<(), AuthorityError>;

    /// Request a token for `resource`. The authority rejects the request when
    /// the condition does not hold.
    async fn request_token(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<SignedToken, AuthorityError>;

    /// Verify a token issued by this authority.
    async fn verify_token(&self, token: &SignedToken) -> Result<TokenVerification, AuthorityError>;
}

#[async_trait]
impl<T> SigningAuthority for std::sync::Arc<T>
where
    T: SigningAuthority + ?Sized,
{
    async fn connect(&self) -> Result<(), AuthorityError> {
        (**self).connect().await
    }

    async fn sign_auth_message(&self, chain: &Chain) -> Result<AuthSignature, AuthorityError> {
        (**self).sign_auth_message(chain).await
    }

    async fn register_condition(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<(), AuthorityError> {
        (**self)
            .register_condition(condition, chain, auth, resource)
            .await
    }

    async fn request_token(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<SignedToken, AuthorityError> {
        (**self).request_token(condition, chain, auth, resource).await
    }

    async fn verify_token(&self, token: &SignedToken) -> Result<TokenVerification, AuthorityError> {
        (**self).verify_token(token).await
    }
}
