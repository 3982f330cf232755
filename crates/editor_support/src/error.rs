use core_types::ResourceId;
use dom::DomError;
use thiserror::Error;

/// Why a change event could not be patched in place. Every variant ends in a
/// full page reload; none of them is surfaced to the authoring tool.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Unapplied {
    #[error("event names no resource")]
    NoResource,
    #[error("response carries no updates")]
    NoUpdates,
    #[error("first update has empty content")]
    EmptyContent,
    #[error("no element annotated with {0}")]
    TargetNotFound(ResourceId),
    #[error("updated markup has no element for {0}")]
    ReplacementNotFound(ResourceId),
    #[error("splice failed: {0}")]
    Dom(#[from] DomError),
}
