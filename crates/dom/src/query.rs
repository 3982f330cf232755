//! Traversal and element matching.
//!
//! Matchers are plain predicates over `(document, node)`. The helpers in
//! [`select`] build the common ones; closures compose them.

use crate::{Document, NodeKey};

/// Preorder walk over a node and its descendants.
pub struct Subtree<'a> {
    doc: &'a Document,
    stack: Vec<NodeKey>,
}

impl Iterator for Subtree<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(key).iter().rev().copied());
        Some(key)
    }
}

impl Document {
    /// `key` followed by all of its descendants in document order.
    pub fn subtree(&self, key: NodeKey) -> Subtree<'_> {
        let stack = if self.is_live(key) { vec![key] } else { Vec::new() };
        Subtree { doc: self, stack }
    }

    /// Descendants of `key` in document order, excluding `key` itself.
    pub fn descendants(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.subtree(key).skip(1)
    }

    /// First descendant element of `scope` matching `pred`.
    pub fn query<F>(&self, scope: NodeKey, pred: F) -> Option<NodeKey>
    where
        F: Fn(&Document, NodeKey) -> bool,
    {
        self.descendants(scope)
            .find(|&k| self.is_element(k) && pred(self, k))
    }

    /// All descendant elements of `scope` matching `pred`, in document order.
    pub fn query_all<F>(&self, scope: NodeKey, pred: F) -> Vec<NodeKey>
    where
        F: Fn(&Document, NodeKey) -> bool,
    {
        self.descendants(scope)
            .filter(|&k| self.is_element(k) && pred(self, k))
            .collect()
    }

    /// `key` itself or its nearest ancestor element matching `pred`.
    pub fn closest<F>(&self, key: NodeKey, pred: F) -> Option<NodeKey>
    where
        F: Fn(&Document, NodeKey) -> bool,
    {
        let mut current = Some(key);
        while let Some(k) = current {
            if self.is_element(k) && pred(self, k) {
                return Some(k);
            }
            current = self.parent(k);
        }
        None
    }

    pub fn matches<F>(&self, key: NodeKey, pred: F) -> bool
    where
        F: Fn(&Document, NodeKey) -> bool,
    {
        self.is_element(key) && pred(self, key)
    }

    /// First connected element whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeKey> {
        self.query(self.root(), select::attr_eq(name, value))
    }
}

pub mod select {
    use crate::{Document, NodeKey};

    pub fn tag(name: &str) -> impl Fn(&Document, NodeKey) -> bool + '_ {
        move |doc, k| doc.tag_name(k).is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn class(class: &str) -> impl Fn(&Document, NodeKey) -> bool + '_ {
        move |doc, k| doc.has_class(k, class)
    }

    /// All of `classes` present.
    pub fn classes<'a>(classes: &'a [&'a str]) -> impl Fn(&Document, NodeKey) -> bool + 'a {
        move |doc, k| classes.iter().all(|c| doc.has_class(k, c))
    }

    pub fn has_attr(name: &str) -> impl Fn(&Document, NodeKey) -> bool + '_ {
        move |doc, k| doc.has_attr(k, name)
    }

    pub fn attr_eq<'a>(name: &'a str, value: &'a str) -> impl Fn(&Document, NodeKey) -> bool + 'a {
        move |doc, k| doc.attr(k, name) == Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::select::*;
    use crate::Document;

    #[test]
    fn query_excludes_scope_and_closest_includes_self() {
        let doc = Document::parse(
            r#"<div class="block" id="outer"><div class="block" id="inner"><p id="leaf"></p></div></div>"#,
        );
        let outer = doc.find_by_attr("id", "outer").unwrap();
        let inner = doc.find_by_attr("id", "inner").unwrap();
        let leaf = doc.find_by_attr("id", "leaf").unwrap();

        assert_eq!(doc.query(outer, class("block")), Some(inner));
        assert_eq!(doc.closest(inner, class("block")), Some(inner));
        assert_eq!(doc.closest(leaf, class("block")), Some(inner));
        assert_eq!(doc.closest(leaf, tag("main")), None);
    }

    #[test]
    fn query_all_is_document_ordered() {
        let doc = Document::parse(
            r#"<p data-r="x" id="1"></p><div><span data-r="x" id="2"></span></div><p data-r="y"></p><i data-r="x" id="3"></i>"#,
        );
        let hits: Vec<_> = doc
            .query_all(doc.root(), attr_eq("data-r", "x"))
            .into_iter()
            .map(|k| doc.attr(k, "id").unwrap())
            .collect();
        assert_eq!(hits, ["1", "2", "3"]);
    }

    #[test]
    fn detached_nodes_are_not_found_from_root() {
        let mut doc = Document::parse("<main></main>");
        let orphan = doc.create_element("div");
        doc.set_attr(orphan, "data-r", "x").unwrap();
        assert_eq!(doc.find_by_attr("data-r", "x"), None);
        assert!(doc.matches(orphan, has_attr("data-r")));
    }
}
