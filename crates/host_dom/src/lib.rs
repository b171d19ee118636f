//! # host_dom
//!
//! Document model for the composer overlay.
//!
//! - [`HostDocument`]: the interface the bridge is written against
//! - [`Document`]: arena-backed implementation with SPA history, a subtree
//!   observer and an event journal
//! - [`Selector`]: the subset of CSS selectors used to address host elements

mod arena;
mod document;
mod error;
mod event;
mod mutation;
mod selector;
mod traits;
mod types;

pub use document::Document;
pub use error::{DomError, SelectorError};
pub use event::{DispatchedEvent, Event, EventKind};
pub use mutation::{MutationKind, MutationRecord};
pub use selector::{AttrMatcher, AttrOp, Combinator, Compound, Selector};
pub use traits::HostDocument;
pub use types::NodeKey;
