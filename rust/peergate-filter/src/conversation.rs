use serde::{Deserialize, Serialize};

/// Anything exposing the wallet address of the peer on the other side of a
/// conversation.
pub trait PeerConversation {
    /// The peer's wallet address.
    fn peer_address(&self) -> &str;
}

/// A conversation as handed over by the messaging client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The peer's wallet address.
    pub peer_address: String,
    /// Conversation topic, when the messaging client provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Conversation {
    /// A conversation with `peer_address` and no topic.
    pub fn new(peer_address: impl Into<String>) -> Self {
        Self {
            peer_address: peer_address.into(),
            topic: None,
        }
    }
}

impl PeerConversation for Conversation {
    fn peer_address(&self) -> &str {
        &self.peer_address
    }
}
