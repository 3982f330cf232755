//! HTML fragment parsing for patch payloads.
//!
//! The authoring tool ships freshly rendered markup as strings. This crate turns
//! such a string into an owned [`Node`] tree that the live document can import.
//! Parsing never fails: malformed markup produces a best-effort tree.

mod entities;
mod tokenizer;
mod tree_builder;
mod types;

pub use crate::entities::{decode_entities, escape_attribute, escape_text};
pub use crate::tokenizer::{is_void_element, tokenize};
pub use crate::tree_builder::build_tree;
pub use crate::types::{Attribute, Node, Token};

/// Tokenize and build in one step.
///
/// The result is always a `Node::Document` whose children are the top-level
/// nodes of `input`. No `html`/`head`/`body` wrappers are synthesized.
pub fn parse(input: &str) -> Node {
    build_tree(tokenize(input))
}
