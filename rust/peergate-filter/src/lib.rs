//! Filter a conversation list down to the peers that satisfy an
//! access-control condition.
//!
//! A [`BatchFilter`] runs one batch per filter toggle: it opens a single
//! [`AuthSession`] (one wallet signature for the whole batch), evaluates
//! every distinct peer address with a [`ConditionEvaluator`], and keeps the
//! conversations whose peer came out eligible.
//!
//! Failures are split in two tiers. Batch-level failures (a malformed
//! template, a declined or unreachable authorization) abort the batch and
//! are returned as [`BatchError`]. Subject-level failures (registration or
//! token errors for one peer) are logged and only exclude that peer.
//!
//! ```no_run
//! use peergate_authority::{Ed25519Wallet, MemoryAuthority};
//! use peergate_condition::ConditionTemplate;
//! use peergate_filter::{BatchFilter, Conversation, FilterSettings};
//!
//! # async fn example(payload: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let authority = MemoryAuthority::new(Ed25519Wallet::generate("0xME"));
//! let filter = BatchFilter::new(authority, FilterSettings::default());
//! let template = ConditionTemplate::from_picker_output(payload)?;
//!
//! let conversations = vec![Conversation::new("0xA"), Conversation::new("0xB")];
//! let visible = filter.filter_conversations(conversations, &template, true).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod settings;
pub use settings::*;

mod conversation;
pub use conversation::*;

mod eligibility;
pub use eligibility::*;

mod session;
pub use session::*;

mod evaluator;
pub use evaluator::*;

mod state;
pub use state::*;

mod filter;
pub use filter::*;

mod view;
pub use view::*;
