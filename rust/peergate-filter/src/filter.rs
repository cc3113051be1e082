use std::collections::HashSet;

use futures_util::{StreamExt, stream};
use parking_lot::Mutex;
use peergate_authority::SigningAuthority;
use peergate_condition::{ConditionTemplate, Subject};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    AuthSession, BatchError, ConditionEvaluator, EligibilityMap, FilterSettings, FilterState,
    PeerConversation,
};

/// Runs evaluation batches over conversation lists.
///
/// Each call to [`BatchFilter::filter_conversations`] is one batch and
/// supersedes the previous one: an in-flight batch is cancelled and returns
/// [`BatchError::Cancelled`] without publishing its outcome.
pub struct BatchFilter<A> {
    evaluator: ConditionEvaluator<A>,
    settings: FilterSettings,
    current: Mutex<CancellationToken>,
    state: watch::Sender<FilterState>,
}

impl<A> BatchFilter<A>
where
    A: SigningAuthority,
{
    /// Create a filter sending evaluations to `authority`.
    pub fn new(authority: A, settings: FilterSettings) -> Self {
        let (state, _) = watch::channel(FilterState::Idle);
        Self {
            evaluator: ConditionEvaluator::new(authority, &settings),
            settings,
            current: Mutex::new(CancellationToken::new()),
            state,
        }
    }

    /// The settings in use.
    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Watch the state of the most recent batch.
    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.state.subscribe()
    }

    /// State of the most recent batch.
    pub fn state(&self) -> FilterState {
        self.state.borrow().clone()
    }

    /// Cancel the batch in flight, if any. A batch still authorizing or
    /// evaluating leaves the state at [`FilterState::Idle`].
    pub fn cancel(&self) {
        let current = self.current.lock();
        current.cancel();
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                *state = FilterState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Return the conversations whose peer satisfies `template`.
    ///
    /// With `filter_enabled` off the input is returned unchanged and nothing
    /// is evaluated. Otherwise the template is validated, one
    /// [`AuthSession`] is opened, every distinct peer is evaluated (at most
    /// [`FilterSettings::concurrency`] at a time) and the conversations are
    /// filtered in their original order.
    #[instrument(
        skip_all,
        fields(conversations = conversations.len(), filter_enabled = filter_enabled)
    )]
    pub async fn filter_conversations<C>(
        &self,
        conversations: Vec<C>,
        template: &ConditionTemplate,
        filter_enabled: bool,
    ) -> Result<Vec<C>, BatchError>
    where
        C: PeerConversation,
    {
        let batch = self.begin_batch();

        if !filter_enabled {
            self.publish(&batch, FilterState::Idle);
            return Ok(conversations);
        }

        if let Err(error) = template.validate() {
            return Err(self.abort(&batch, BatchError::InvalidTemplate(error)));
        }

        self.publish(&batch, FilterState::Authorizing);
        let session = tokio::select! {
            biased;
            _ = batch.cancelled() => return Err(BatchError::Cancelled),
            session = AuthSession::open(
                self.evaluator.authority(),
                self.settings.chain.clone(),
                self.settings.signing_timeout(),
            ) => session,
        };
        let session = match session {
            Ok(session) => session,
            Err(error) => return Err(self.abort(&batch, error)),
        };

        let subjects = distinct_subjects(&conversations);
        self.publish(
            &batch,
            FilterState::Evaluating {
                total: subjects.len(),
            },
        );

        let evaluations = stream::iter(subjects)
            .map(|subject| self.evaluator.evaluate(template, subject, &session))
            .buffer_unordered(self.settings.concurrency_limit())
            .collect::<EligibilityMap>();
        let eligibility = tokio::select! {
            biased;
            _ = batch.cancelled() => return Err(BatchError::Cancelled),
            eligibility = evaluations => eligibility,
        };

        let total = conversations.len();
        let filtered: Vec<C> = conversations
            .into_iter()
            .filter(|conversation| eligibility.is_eligible(conversation.peer_address()))
            .collect();

        info!(
            peers = eligibility.len(),
            eligible = eligibility.eligible(),
            kept = filtered.len(),
            "Filtered conversations"
        );
        self.publish(
            &batch,
            FilterState::Ready {
                eligible: filtered.len(),
                total,
            },
        );

        Ok(filtered)
    }

    fn begin_batch(&self) -> CancellationToken {
        let batch = CancellationToken::new();
        let mut current = self.current.lock();
        current.cancel();
        *current = batch.clone();
        batch
    }

    // Checked under `current`: a superseded batch never overwrites a newer
    // batch's state.
    fn publish(&self, batch: &CancellationToken, state: FilterState) {
        let _current = self.current.lock();
        if !batch.is_cancelled() {
            self.state.send_replace(state);
        }
    }

    fn abort(&self, batch: &CancellationToken, error: BatchError) -> BatchError {
        warn!(%error, "Filter batch aborted");
        self.publish(batch, FilterState::Failed(error.clone()));
        error
    }
}

fn distinct_subjects<C: PeerConversation>(conversations: &[C]) -> Vec<Subject> {
    let mut seen = HashSet::new();
    conversations
        .iter()
        .filter_map(|conversation| match Subject::new(conversation.peer_address()) {
            Ok(subject) => Some(subject),
            Err(error) => {
                debug!(%error, "Skipping conversation without a peer address");
                None
            }
        })
        .filter(|subject| seen.insert(subject.clone()))
        .collect()
}
