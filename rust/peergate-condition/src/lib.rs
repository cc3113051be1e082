//! Access-control conditions for gating peer conversations.
//!
//! A [`ConditionTemplate`] is authored once by a condition picker and then
//! shared read-only by every evaluation of a batch. Each evaluation binds a
//! concrete [`Subject`] (a peer's wallet address) into its own copy of the
//! template with [`bind`], and names a fresh [`ResourceDescriptor`] with a
//! [`ResourceNamer`] so that tokens issued for one subject can never be
//! confused with tokens issued for another.
//!
//! ```rust
//! use peergate_condition::{ConditionTemplate, ResourceNamer, Subject, bind};
//!
//! let template = ConditionTemplate::from_picker_output(r#"{
//!     "accessControlConditions": [{
//!         "contractAddress": "",
//!         "standardContractType": "",
//!         "chain": "rinkeby",
//!         "method": "",
//!         "parameters": [":userAddress"],
//!         "returnValueTest": { "comparator": "=", "value": "0xA" }
//!     }]
//! }"#).unwrap();
//!
//! let bound = bind(&template, &Subject::new("0xA").unwrap()).unwrap();
//! assert_eq!(bound.condition.first_clause().unwrap().parameters[0], "0xA");
//!
//! let resource = ResourceNamer::new("http://localhost:3000").next();
//! assert!(resource.path.starts_with('/'));
//! ```

mod error;
pub use error::*;

mod subject;
pub use subject::*;

mod condition;
pub use condition::*;

mod bind;
pub use bind::*;

mod resource;
pub use resource::*;

mod picker;
