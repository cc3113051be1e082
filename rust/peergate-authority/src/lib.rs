//! Client side of the signing authority that judges access-control
//! conditions.
//!
//! The authority is a remote service. A caller first proves control of a
//! wallet with an [`AuthSignature`], then registers a bound condition for a
//! resource, requests a [`SignedToken`] scoped to that resource, and finally
//! verifies the token. [`SigningAuthority`] is the contract for those calls;
//! [`MemoryAuthority`] implements it in-process and [`RestAuthority`] talks to
//! a remote deployment over HTTP.

mod error;
pub use error::*;

mod wallet;
pub use wallet::*;

mod auth;
pub use auth::*;

mod token;
pub use token::*;

mod authority;
pub use authority::*;

mod memory;
pub use memory::*;

mod rest;
pub use rest::*;

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
