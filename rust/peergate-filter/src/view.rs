use crate::{BatchError, FilterState};

/// What the messaging client reports about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagingStatus {
    /// A wallet is connected.
    pub wallet_connected: bool,
    /// The messaging client finished initialising (its keys are signed).
    pub client_ready: bool,
    /// The conversation list is still being fetched.
    pub loading_conversations: bool,
}

/// What the conversation panel should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelView<C> {
    /// Prompt the user to connect a wallet.
    NoWallet,
    /// Waiting for the user to sign in to the messaging client.
    AwaitingSignatures,
    /// Conversations are loading or a filter batch is in flight.
    Loading,
    /// The filter condition is malformed and was never evaluated.
    InvalidCondition(String),
    /// The filter batch could not be authorized.
    AuthorizationFailed(String),
    /// Nothing to show.
    Empty,
    /// The conversations to list.
    Conversations(Vec<C>),
}

impl<C> PanelView<C> {
    /// Pick the view for the current status, filter state and (possibly
    /// filtered) conversations.
    pub fn resolve(status: MessagingStatus, state: &FilterState, conversations: Vec<C>) -> Self {
        if !status.wallet_connected {
            return Self::NoWallet;
        }
        if !status.client_ready {
            return Self::AwaitingSignatures;
        }
        if status.loading_conversations || state.is_loading() {
            return Self::Loading;
        }
        match state {
            FilterState::Failed(error @ BatchError::InvalidTemplate(_)) => {
                return Self::InvalidCondition(error.to_string());
            }
            FilterState::Failed(error) => return Self::AuthorizationFailed(error.to_string()),
            _ => {}
        }
        if conversations.is_empty() {
            return Self::Empty;
        }
        Self::Conversations(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peergate_condition::ConditionError;

    const READY: MessagingStatus = MessagingStatus {
        wallet_connected: true,
        client_ready: true,
        loading_conversations: false,
    };

    #[test]
    fn it_asks_for_a_wallet_first() {
        let view = PanelView::resolve(MessagingStatus::default(), &FilterState::Idle, vec![1]);
        assert_eq!(view, PanelView::NoWallet);
    }

    #[test]
    fn it_waits_for_the_client_signatures() {
        let status = MessagingStatus {
            client_ready: false,
            ..READY
        };
        assert_eq!(
            PanelView::resolve(status, &FilterState::Idle, vec![1]),
            PanelView::AwaitingSignatures
        );
    }

    #[test]
    fn it_shows_loading_while_a_batch_runs() {
        assert_eq!(
            PanelView::resolve(READY, &FilterState::Evaluating { total: 2 }, vec![1]),
            PanelView::Loading
        );
        assert_eq!(
            PanelView::resolve(
                MessagingStatus {
                    loading_conversations: true,
                    ..READY
                },
                &FilterState::Idle,
                vec![1]
            ),
            PanelView::Loading
        );
    }

    #[test]
    fn it_surfaces_authorization_failures() {
        let state = FilterState::Failed(BatchError::AuthRejected("declined".into()));
        assert_eq!(
            PanelView::resolve(READY, &state, Vec::<u8>::new()),
            PanelView::AuthorizationFailed("Authorization rejected: declined".into())
        );
    }

    #[test]
    fn it_tells_a_malformed_condition_apart_from_an_authorization_failure() {
        let state = FilterState::Failed(BatchError::InvalidTemplate(
            ConditionError::InvalidTemplate("condition has no clauses".into()),
        ));
        assert_eq!(
            PanelView::resolve(READY, &state, vec![1]),
            PanelView::InvalidCondition(
                "Invalid condition template: condition has no clauses".into()
            )
        );
    }

    #[test]
    fn it_lists_conversations_or_reports_emptiness() {
        let state = FilterState::Ready {
            eligible: 1,
            total: 2,
        };
        assert_eq!(
            PanelView::resolve(READY, &state, vec!["0xA"]),
            PanelView::Conversations(vec!["0xA"])
        );
        assert_eq!(
            PanelView::resolve(READY, &state, Vec::<&str>::new()),
            PanelView::Empty
        );
    }
}
