use crate::error::DomError;
use crate::events::{ActivationHandler, Listener};
use core_types::ListenerId;
use html::{Attribute, Node};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Arena index of a node. Keys are never reused, so a key held across a
/// removal keeps pointing at the retired node rather than at a newcomer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document { doctype: Option<String> },
    Element {
        name: Arc<str>,
        attributes: Vec<Attribute>,
    },
    Text { text: String },
    Comment { text: String },
}

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) retired: bool,
    pub(crate) scroll_left: f64,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            retired: false,
            scroll_left: 0.0,
        }
    }

    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document { .. } | NodeKind::Element { .. })
    }
}

/// A mutable document tree.
///
/// Nodes live in an arena with parent links. Detached nodes (freshly created or
/// imported) stay in the arena until they are inserted; removed nodes are
/// retired together with their listeners and activation handlers.
pub struct Document {
    pub(crate) nodes: Vec<NodeRecord>,
    root: NodeKey,
    pub(crate) listeners: HashMap<NodeKey, Vec<Listener>>,
    pub(crate) activations: HashMap<NodeKey, ActivationHandler>,
    pub(crate) activation_log: Vec<NodeKey>,
    pub(crate) next_listener: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("listeners", &self.listeners.len())
            .field("activations", &self.activations.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document { doctype: None })],
            root: NodeKey(0),
            listeners: HashMap::new(),
            activations: HashMap::new(),
            activation_log: Vec::new(),
            next_listener: 1,
        }
    }

    /// Parses `markup` into a fresh document. Top-level nodes of the markup
    /// become children of the document root.
    pub fn parse(markup: &str) -> Self {
        Self::from_node(&html::parse(markup))
    }

    pub fn from_node(node: &Node) -> Self {
        let mut doc = Self::new();
        match node {
            Node::Document { doctype, children } => {
                doc.nodes[0].kind = NodeKind::Document {
                    doctype: doctype.clone(),
                };
                for child in children {
                    let key = doc.import_node(child);
                    doc.link_last(doc.root, key);
                }
            }
            other => {
                let key = doc.import_node(other);
                doc.link_last(doc.root, key);
            }
        }
        doc
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn body(&self) -> Option<NodeKey> {
        self.first_element_named("body")
    }

    pub fn main(&self) -> Option<NodeKey> {
        self.first_element_named("main")
    }

    fn first_element_named(&self, name: &str) -> Option<NodeKey> {
        self.subtree(self.root)
            .find(|&k| self.tag_name(k).is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    pub(crate) fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomError> {
        let record = self
            .nodes
            .get(key.index())
            .ok_or(DomError::UnknownNode(key))?;
        if record.retired {
            return Err(DomError::Retired(key));
        }
        Ok(record)
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        let record = self
            .nodes
            .get_mut(key.index())
            .ok_or(DomError::UnknownNode(key))?;
        if record.retired {
            return Err(DomError::Retired(key));
        }
        Ok(record)
    }

    /// `true` for keys of this arena that have not been removed.
    pub fn is_live(&self, key: NodeKey) -> bool {
        self.record(key).is_ok()
    }

    /// `true` when the node is reachable from the document root.
    pub fn is_connected(&self, key: NodeKey) -> bool {
        if !self.is_live(key) {
            return false;
        }
        let mut current = key;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.index()].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.record(key).ok().map(|r| &r.kind)
    }

    pub fn tag_name(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        self.tag_name(key).is_some()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.record(key).ok()?.parent
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.record(key).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.children(key)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    // --- attributes ---

    pub fn attributes(&self, key: NodeKey) -> &[Attribute] {
        match self.kind(key) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Attribute value; valueless attributes read as `""`.
    pub fn attr(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.attributes(key)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, key: NodeKey, name: &str) -> bool {
        self.attr(key, name).is_some()
    }

    pub fn set_attr(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        let attributes = self.attributes_mut(key)?;
        match attributes.iter().position(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(i) => attributes[i].1 = Some(value.to_string()),
            None => {
                attributes.push((Arc::from(name.to_ascii_lowercase()), Some(value.to_string())))
            }
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        self.attributes_mut(key)?
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(())
    }

    fn attributes_mut(&mut self, key: NodeKey) -> Result<&mut Vec<Attribute>, DomError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    pub fn has_class(&self, key: NodeKey, class: &str) -> bool {
        self.attr(key, "class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, key: NodeKey, class: &str) -> Result<(), DomError> {
        if self.has_class(key, class) {
            return Ok(());
        }
        let value = match self.attr(key, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(key, "class", &value)
    }

    pub fn remove_class(&mut self, key: NodeKey, class: &str) -> Result<(), DomError> {
        let Some(existing) = self.attr(key, "class") else {
            return Ok(());
        };
        let value = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(key, "class", &value)
    }

    // --- text ---

    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for k in self.subtree(key) {
            if let Some(NodeKind::Text { text }) = self.kind(k) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replaces all children of `key` with a single text node.
    pub fn set_text_content(&mut self, key: NodeKey, text: &str) -> Result<(), DomError> {
        if let NodeKind::Text { text: existing } = &mut self.record_mut(key)?.kind {
            *existing = text.to_string();
            return Ok(());
        }
        for child in self.children(key).to_vec() {
            self.remove(child)?;
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(key, node)?;
        }
        Ok(())
    }

    pub fn scroll_left(&self, key: NodeKey) -> f64 {
        self.record(key).map(|r| r.scroll_left).unwrap_or(0.0)
    }

    pub fn set_scroll_left(&mut self, key: NodeKey, offset: f64) -> Result<(), DomError> {
        self.record_mut(key)?.scroll_left = offset.max(0.0);
        Ok(())
    }

    // --- construction ---

    fn push(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        key
    }

    pub fn create_element(&mut self, name: &str) -> NodeKey {
        self.push(NodeKind::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.push(NodeKind::Text {
            text: text.to_string(),
        })
    }

    /// Deep-copies a parsed node into this arena. The copy is detached.
    /// A `Node::Document` is copied as an element-less container.
    pub fn import_node(&mut self, node: &Node) -> NodeKey {
        let mut pending = vec![(node, None::<NodeKey>)];
        let mut top = None;
        while let Some((current, parent)) = pending.pop() {
            let kind = match current {
                Node::Document { doctype, .. } => NodeKind::Document {
                    doctype: doctype.clone(),
                },
                Node::Element {
                    name, attributes, ..
                } => NodeKind::Element {
                    name: Arc::clone(name),
                    attributes: attributes.clone(),
                },
                Node::Text { text } => NodeKind::Text { text: text.clone() },
                Node::Comment { text } => NodeKind::Comment { text: text.clone() },
            };
            let key = self.push(kind);
            match parent {
                Some(parent) => self.link_last(parent, key),
                None => top = Some(key),
            }
            // Children are pushed reversed and popped in order, so each parent
            // receives them left to right.
            pending.extend(current.children().iter().rev().map(|c| (c, Some(key))));
        }
        top.unwrap_or(self.root)
    }

    /// Deep-copies `key` (and its subtree) from another document into this one.
    /// Listeners and activation handlers are not copied. The copy is detached.
    pub fn import(&mut self, source: &Document, key: NodeKey) -> Result<NodeKey, DomError> {
        source.record(key)?;
        let mut pending = vec![(key, None::<NodeKey>)];
        let mut top = None;
        while let Some((current, parent)) = pending.pop() {
            let record = source.record(current)?;
            let copy = self.push(record.kind.clone());
            self.nodes[copy.index()].scroll_left = record.scroll_left;
            match parent {
                Some(parent) => self.link_last(parent, copy),
                None => top = Some(copy),
            }
            pending.extend(record.children.iter().rev().map(|&c| (c, Some(copy))));
        }
        top.ok_or(DomError::UnknownNode(key))
    }

    fn link_last(&mut self, parent: NodeKey, child: NodeKey) {
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    // --- surgery ---

    fn check_insertable(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        if child == self.root {
            return Err(DomError::Root);
        }
        if !self.record(parent)?.allows_children() {
            return Err(DomError::NotAContainer(parent));
        }
        self.record(child)?;
        if parent == child || self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        Ok(())
    }

    /// `true` if `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Unlinks `key` from its parent without retiring it.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), DomError> {
        if key == self.root {
            return Err(DomError::Root);
        }
        if let Some(parent) = self.record_mut(key)?.parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != key);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        self.detach(child)?;
        self.link_last(parent, child);
        Ok(())
    }

    /// Inserts `node` as the next sibling of `reference`, moving it if it is
    /// already attached somewhere.
    pub fn insert_after(&mut self, reference: NodeKey, node: NodeKey) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Orphan(reference))?;
        self.check_insertable(parent, node)?;
        self.detach(node)?;
        let siblings = &mut self.nodes[parent.index()].children;
        let at = siblings
            .iter()
            .position(|&c| c == reference)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(at, node);
        self.nodes[node.index()].parent = Some(parent);
        Ok(())
    }

    /// Detaches `key` and retires its whole subtree. Listeners and activation
    /// handlers registered inside the subtree are dropped.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.detach(key)?;
        let retired: Vec<NodeKey> = self.subtree(key).collect();
        for k in &retired {
            self.nodes[k.index()].retired = true;
            self.listeners.remove(k);
            self.activations.remove(k);
        }
        log::trace!(target: "dom", "retired {} node(s) under {key:?}", retired.len());
        Ok(())
    }

    /// Replaces `key` with `replacements` (in order) and removes `key`.
    pub fn replace_with(&mut self, key: NodeKey, replacements: &[NodeKey]) -> Result<(), DomError> {
        if self.parent(key).is_none() {
            return Err(DomError::Orphan(key));
        }
        for &node in replacements {
            if node == key || self.contains(node, key) {
                return Err(DomError::Cycle {
                    parent: node,
                    child: key,
                });
            }
        }
        let mut anchor = key;
        for &node in replacements {
            self.insert_after(anchor, node)?;
            anchor = node;
        }
        self.remove(key)
    }

    pub(crate) fn allocate_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }
}
