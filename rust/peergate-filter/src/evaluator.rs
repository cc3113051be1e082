use std::future::Future;
use std::time::Duration;

use peergate_authority::{AuthorityError, SigningAuthority};
use peergate_condition::{ConditionTemplate, ResourceNamer, Subject, bind};
use tracing::{debug, instrument, warn};

use crate::{AuthSession, EligibilityResult, EvaluationError, EvaluationStep, FilterSettings};

/// Decides whether a single subject satisfies a template.
///
/// Each evaluation binds the subject into its own copy of the template,
/// names a fresh resource, registers the bound condition for it, asks for a
/// token and verifies that token.
#[derive(Debug, Clone)]
pub struct ConditionEvaluator<A> {
    authority: A,
    namer: ResourceNamer,
    step_timeout: Duration,
}

impl<A> ConditionEvaluator<A>
where
    A: SigningAuthority,
{
    /// Create an evaluator using `authority`, naming resources under the
    /// configured base URL.
    pub fn new(authority: A, settings: &FilterSettings) -> Self {
        Self {
            authority,
            namer: ResourceNamer::new(settings.base_url.clone()),
            step_timeout: settings.step_timeout(),
        }
    }

    /// The authority evaluations are sent to.
    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Evaluate `subject`. Any failure is logged and yields
    /// `verified: false`.
    #[instrument(skip_all, fields(subject = %subject))]
    pub async fn evaluate(
        &self,
        template: &ConditionTemplate,
        subject: Subject,
        session: &AuthSession,
    ) -> EligibilityResult {
        let verified = match self.try_evaluate(template, &subject, session).await {
            Ok(verified) => verified,
            Err(error) => {
                warn!(%error, "Evaluation failed; treating subject as ineligible");
                false
            }
        };

        EligibilityResult { subject, verified }
    }

    /// Evaluate `subject`, reporting why it failed.
    ///
    /// `Ok(false)` means the authority issued a token that did not verify;
    /// a refusal to issue a token is an [`EvaluationError::TokenRequest`].
    pub async fn try_evaluate(
        &self,
        template: &ConditionTemplate,
        subject: &Subject,
        session: &AuthSession,
    ) -> Result<bool, EvaluationError> {
        let bound = bind(template, subject)?;
        let resource = self.namer.next();
        let chain = session.chain();
        let auth = session.signature();

        debug!(path = %resource.path, "Registering condition");
        self.bounded(
            EvaluationStep::Register,
            self.authority
                .register_condition(&bound.condition, chain, auth, &resource),
        )
        .await?
        .map_err(EvaluationError::Registration)?;

        let token = self
            .bounded(
                EvaluationStep::RequestToken,
                self.authority
                    .request_token(&bound.condition, chain, auth, &resource),
            )
            .await?
            .map_err(EvaluationError::TokenRequest)?;
        debug!("Token issued");

        let verification = self
            .bounded(EvaluationStep::VerifyToken, self.authority.verify_token(&token))
            .await?
            .map_err(EvaluationError::Verification)?;

        if !verification.verified {
            return Ok(false);
        }

        match verification.claims {
            Some(claims) if claims.matches_resource(&resource) && &claims.chain == chain => Ok(true),
            _ => Err(EvaluationError::ClaimsMismatch),
        }
    }

    async fn bounded<T>(
        &self,
        step: EvaluationStep,
        future: impl Future<Output = Result<T, AuthorityError>>,
    ) -> Result<Result<T, AuthorityError>, EvaluationError> {
        tokio::time::timeout(self.step_timeout, future)
            .await
            .map_err(|_| EvaluationError::Timeout {
                step,
                after: self.step_timeout,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peergate_authority::{Ed25519Wallet, MemoryAuthority};
    use peergate_condition::AccessControlCondition;

    fn template() -> ConditionTemplate {
        ConditionTemplate::from_picker_value(serde_json::json!({
            "accessControlConditions": [{
                "contractAddress": "0xToken",
                "standardContractType": "ERC721",
                "chain": "rinkeby",
                "method": "balanceOf",
                "parameters": [":userAddress"],
                "returnValueTest": { "comparator": ">", "value": "0" }
            }]
        }))
        .unwrap()
    }

    fn subject(address: &str) -> Subject {
        Subject::new(address).unwrap()
    }

    async fn setup(settings: FilterSettings) -> (MemoryAuthority, ConditionEvaluator<MemoryAuthority>, AuthSession) {
        let authority = MemoryAuthority::new(Ed25519Wallet::from_seed("0xME", [2; 32]));
        authority.set_balance("0xToken", "0xA", 1).await;
        let session = AuthSession::open(&authority, settings.chain.clone(), settings.signing_timeout())
            .await
            .unwrap();
        let evaluator = ConditionEvaluator::new(authority.clone(), &settings);
        (authority, evaluator, session)
    }

    #[tokio::test]
    async fn it_verifies_a_holder() {
        let (authority, evaluator, session) = setup(FilterSettings::default()).await;

        let result = evaluator.evaluate(&template(), subject("0xA"), &session).await;

        assert_eq!(
            result,
            EligibilityResult {
                subject: subject("0xA"),
                verified: true
            }
        );
        let calls = authority.calls().await;
        assert_eq!((calls.register, calls.request, calls.verify), (1, 1, 1));
    }

    #[tokio::test]
    async fn it_reports_an_unmet_condition_as_a_token_request_error() {
        let (_, evaluator, session) = setup(FilterSettings::default()).await;

        assert!(matches!(
            evaluator.try_evaluate(&template(), &subject("0xB"), &session).await,
            Err(EvaluationError::TokenRequest(AuthorityError::Rejected(_)))
        ));
        assert!(!evaluator.evaluate(&template(), subject("0xB"), &session).await.verified);
    }

    #[tokio::test]
    async fn it_degrades_registration_failures_to_ineligible() {
        let (authority, evaluator, session) = setup(FilterSettings::default()).await;
        authority.fail_registration_for("0xA").await;

        assert!(matches!(
            evaluator.try_evaluate(&template(), &subject("0xA"), &session).await,
            Err(EvaluationError::Registration(_))
        ));
        assert!(!evaluator.evaluate(&template(), subject("0xA"), &session).await.verified);
        assert_eq!(authority.calls().await.request, 0);
    }

    #[tokio::test]
    async fn it_fails_binding_before_touching_the_authority() {
        let (authority, evaluator, session) = setup(FilterSettings::default()).await;
        let empty = ConditionTemplate::new(AccessControlCondition::default());

        assert!(matches!(
            evaluator.try_evaluate(&empty, &subject("0xA"), &session).await,
            Err(EvaluationError::Binding(_))
        ));
        assert_eq!(authority.calls().await.register, 0);
    }

    /// Ways [`Rigged`] departs from the authority it wraps.
    #[derive(Clone, Copy)]
    enum Rig {
        /// Issue tokens for a resource other than the one asked for.
        Misroute,
        /// Fail every verification call.
        BreakVerification,
    }

    struct Rigged(MemoryAuthority, Rig);

    #[async_trait::async_trait]
    impl SigningAuthority for Rigged {
        async fn connect(&self) -> Result<(), AuthorityError> {
            self.0.connect().await
        }

        async fn sign_auth_message(
            &self,
            chain: &peergate_condition::Chain,
        ) -> Result<peergate_authority::AuthSignature, AuthorityError> {
            self.0.sign_auth_message(chain).await
        }

        async fn register_condition(
            &self,
            condition: &AccessControlCondition,
            chain: &peergate_condition::Chain,
            auth: &peergate_authority::AuthSignature,
            resource: &peergate_condition::ResourceDescriptor,
        ) -> Result<(), AuthorityError> {
            self.0.register_condition(condition, chain, auth, resource).await
        }

        async fn request_token(
            &self,
            condition: &AccessControlCondition,
            chain: &peergate_condition::Chain,
            auth: &peergate_authority::AuthSignature,
            resource: &peergate_condition::ResourceDescriptor,
        ) -> Result<peergate_authority::SignedToken, AuthorityError> {
            match self.1 {
                Rig::Misroute => {
                    let elsewhere = ResourceNamer::new(resource.base_url.clone()).next();
                    self.0.register_condition(condition, chain, auth, &elsewhere).await?;
                    self.0.request_token(condition, chain, auth, &elsewhere).await
                }
                Rig::BreakVerification => {
                    self.0.request_token(condition, chain, auth, resource).await
                }
            }
        }

        async fn verify_token(
            &self,
            token: &peergate_authority::SignedToken,
        ) -> Result<peergate_authority::TokenVerification, AuthorityError> {
            match self.1 {
                Rig::Misroute => self.0.verify_token(token).await,
                Rig::BreakVerification => {
                    Err(AuthorityError::Network("verifier unavailable".into()))
                }
            }
        }
    }

    #[tokio::test]
    async fn it_rejects_tokens_scoped_to_another_resource() {
        let (authority, _, session) = setup(FilterSettings::default()).await;
        let evaluator =
            ConditionEvaluator::new(Rigged(authority, Rig::Misroute), &FilterSettings::default());

        assert_eq!(
            evaluator.try_evaluate(&template(), &subject("0xA"), &session).await,
            Err(EvaluationError::ClaimsMismatch)
        );
    }

    #[tokio::test]
    async fn it_reports_an_issued_token_that_fails_verification_as_ineligible() {
        let (authority, _, session) = setup(FilterSettings::default()).await;
        let evaluator = ConditionEvaluator::new(
            authority.clone().with_token_lifetime(Duration::ZERO),
            &FilterSettings::default(),
        );

        assert_eq!(
            evaluator.try_evaluate(&template(), &subject("0xA"), &session).await,
            Ok(false)
        );
        let calls = authority.calls().await;
        assert_eq!((calls.request, calls.verify), (1, 1));
    }

    #[tokio::test]
    async fn it_reports_verification_failures() {
        let (authority, _, _) = setup(FilterSettings::default()).await;
        let chain = peergate_condition::Chain::default();
        let session = AuthSession::from_signature(
            chain.clone(),
            authority.sign_auth_message(&chain).await.unwrap(),
        );
        let evaluator = ConditionEvaluator::new(
            Rigged(authority, Rig::BreakVerification),
            &FilterSettings::default(),
        );

        assert!(matches!(
            evaluator.try_evaluate(&template(), &subject("0xA"), &session).await,
            Err(EvaluationError::Verification(AuthorityError::Network(_)))
        ));
        assert!(!evaluator.evaluate(&template(), subject("0xA"), &session).await.verified);
    }

    #[tokio::test(start_paused = true)]
    async fn it_times_out_slow_steps() {
        let settings = FilterSettings::default().with_step_timeout(1);
        let (authority, _, session) = setup(settings.clone()).await;
        let evaluator = ConditionEvaluator::new(
            authority.with_latency(Duration::from_secs(10)),
            &settings,
        );

        assert!(matches!(
            evaluator.try_evaluate(&template(), &subject("0xA"), &session).await,
            Err(EvaluationError::Timeout {
                step: EvaluationStep::Register,
                ..
            })
        ));
    }
}
