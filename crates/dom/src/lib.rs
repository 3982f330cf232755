//! The live document.
//!
//! An arena-backed tree with exactly the query and mutation surface the patch
//! engine needs: attribute and class access, ancestor/descendant search,
//! insert-after / remove / replace, importing subtrees from a parsed fragment,
//! a listener registry and simulated activation. Activation handlers are `Rc`
//! closures, so a document stays on one thread.

mod document;
mod error;
mod events;
mod query;
mod serialize;
mod style;

pub use crate::document::{Document, NodeKey, NodeKind};
pub use crate::error::DomError;
pub use crate::events::{ActivationHandler, Listener};
pub use crate::query::{Subtree, select};
