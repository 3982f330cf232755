use crate::{Document, NodeKey, NodeKind};
use html::{escape_attribute, escape_text, is_void_element};

impl Document {
    pub fn outer_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.write_node(key, &mut out);
        out
    }

    pub fn inner_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for &child in self.children(key) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes the whole document, doctype included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Document {
            doctype: Some(dt), ..
        }) = self.kind(self.root())
        {
            out.push_str("<!");
            out.push_str(dt);
            out.push('>');
        }
        out.push_str(&self.inner_html(self.root()));
        out
    }

    fn write_node(&self, key: NodeKey, out: &mut String) {
        // Explicit stack: (node, closing?) so deep trees don't recurse.
        let mut stack = vec![(key, false)];
        while let Some((k, closing)) = stack.pop() {
            let Some(kind) = self.kind(k) else {
                continue;
            };
            match kind {
                NodeKind::Document { .. } => {
                    stack.extend(self.children(k).iter().rev().map(|&c| (c, false)));
                }
                NodeKind::Text { text } => out.push_str(&self.escape_for_parent(k, text)),
                NodeKind::Comment { text } => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeKind::Element { name, .. } if closing => {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                NodeKind::Element { name, attributes } => {
                    out.push('<');
                    out.push_str(name);
                    for (attr, value) in attributes {
                        out.push(' ');
                        out.push_str(attr);
                        if let Some(value) = value {
                            out.push_str("=\"");
                            out.push_str(&escape_attribute(value));
                            out.push('"');
                        }
                    }
                    out.push('>');
                    if !is_void_element(name) {
                        stack.push((k, true));
                        stack.extend(self.children(k).iter().rev().map(|&c| (c, false)));
                    }
                }
            }
        }
    }

    fn escape_for_parent(&self, text_node: NodeKey, text: &str) -> String {
        let raw = self
            .parent(text_node)
            .and_then(|p| self.tag_name(p))
            .is_some_and(|n| n == "script" || n == "style");
        if raw { text.to_string() } else { escape_text(text) }
    }
}
