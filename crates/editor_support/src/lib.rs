//! In-place patching of a live page from authoring-tool change events.
//!
//! A change event names a resource and carries re-rendered markup for it.
//! [`resolve`] turns the event into a target and a granularity, the
//! [`Reconciler`] splices the markup in through the page's [`Decorator`], and
//! the [`Dispatcher`] routes events, keeps editor annotations current and
//! falls back to a full reload whenever a patch cannot be applied.

pub mod annotations;
pub mod config;
pub mod decorate;
pub mod dispatcher;
mod error;
pub mod reconciler;
pub mod resolve;
pub mod widget_state;

pub use crate::annotations::PageContext;
pub use crate::config::SupportConfig;
pub use crate::decorate::{Decorator, StandardDecorator};
pub use crate::dispatcher::{Dispatcher, Host, Outcome, attach_event_listeners};
pub use crate::error::Unapplied;
pub use crate::reconciler::{Applied, Reconciler};
pub use crate::resolve::{Granularity, GranularityKind};
pub use crate::widget_state::{WidgetKind, WidgetRegistry, WidgetState};
