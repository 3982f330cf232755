use crate::types::{Node, Token};

/// Builds an owned tree from a token stream.
///
/// Nodes are collected in a flat arena first and materialized in one postorder
/// pass at the end, so deeply nested input never recurses.
///
/// End tags close the nearest open element with the same name (and everything
/// opened after it). End tags without an open match are dropped.
pub fn build_tree(tokens: Vec<Token>) -> Node {
    let mut arena = Arena::default();
    let root = arena.push(Pending::Document {
        doctype: None,
        children: Vec::new(),
    });
    let mut open: Vec<usize> = Vec::new();

    for token in tokens {
        let parent = open.last().copied().unwrap_or(root);
        match token {
            Token::Doctype(dt) => arena.set_doctype(root, dt),
            Token::Comment(text) => {
                arena.add_child(parent, Pending::Comment { text });
            }
            Token::Text(text) => {
                arena.add_child(parent, Pending::Text { text });
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let index = arena.add_child(
                    parent,
                    Pending::Element {
                        name,
                        attributes,
                        children: Vec::new(),
                    },
                );
                if !self_closing {
                    open.push(index);
                }
            }
            Token::EndTag(name) => {
                if let Some(depth) = open.iter().rposition(|&i| arena.is_named(i, &name)) {
                    open.truncate(depth);
                } else {
                    log::trace!(target: "html.tree_builder", "dropping stray </{name}>");
                }
            }
        }
    }

    arena.into_tree(root)
}

#[derive(Debug)]
enum Pending {
    Document {
        doctype: Option<String>,
        children: Vec<usize>,
    },
    Element {
        name: std::sync::Arc<str>,
        attributes: Vec<crate::types::Attribute>,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<Option<Pending>>,
}

impl Arena {
    fn push(&mut self, node: Pending) -> usize {
        self.nodes.push(Some(node));
        self.nodes.len() - 1
    }

    fn add_child(&mut self, parent: usize, child: Pending) -> usize {
        // Adjacent text tokens (e.g. around a stray `<`) merge into one node.
        if let Pending::Text { text } = &child {
            if let Some(last) = self.last_child(parent) {
                if let Some(Pending::Text { text: existing }) = self.nodes[last].as_mut() {
                    existing.push_str(text);
                    return last;
                }
            }
        }
        let index = self.push(child);
        match self.nodes[parent].as_mut() {
            Some(Pending::Document { children, .. } | Pending::Element { children, .. }) => {
                children.push(index)
            }
            _ => unreachable!("tree builder parents are always containers"),
        }
        index
    }

    fn last_child(&self, parent: usize) -> Option<usize> {
        match self.nodes[parent].as_ref() {
            Some(Pending::Document { children, .. } | Pending::Element { children, .. }) => {
                children.last().copied()
            }
            _ => None,
        }
    }

    fn set_doctype(&mut self, root: usize, doctype: String) {
        if let Some(Pending::Document { doctype: slot, .. }) = self.nodes[root].as_mut() {
            *slot = Some(doctype);
        }
    }

    fn is_named(&self, index: usize, target: &str) -> bool {
        matches!(
            self.nodes[index].as_ref(),
            Some(Pending::Element { name, .. }) if &**name == target
        )
    }

    fn into_tree(mut self, root: usize) -> Node {
        // Postorder: a node is finished once all of its children are on `built`,
        // and its direct children are the last `n` entries there, in order.
        let mut built: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(root, false)];

        while let Some((index, expanded)) = stack.pop() {
            if !expanded {
                stack.push((index, true));
                if let Some(
                    Pending::Document { children, .. } | Pending::Element { children, .. },
                ) = self.nodes[index].as_ref()
                {
                    stack.extend(children.iter().rev().map(|&c| (c, false)));
                }
                continue;
            }

            let node = match self.nodes[index].take() {
                Some(Pending::Document { doctype, children }) => Node::Document {
                    doctype,
                    children: built.split_off(built.len() - children.len()),
                },
                Some(Pending::Element {
                    name,
                    attributes,
                    children,
                }) => Node::Element {
                    name,
                    attributes,
                    children: built.split_off(built.len() - children.len()),
                },
                Some(Pending::Text { text }) => Node::Text { text },
                Some(Pending::Comment { text }) => Node::Comment { text },
                None => unreachable!("tree builder visits every node once"),
            };
            built.push(node);
        }

        debug_assert_eq!(built.len(), 1, "tree builder must produce one root");
        built.pop().unwrap_or(Node::Document {
            doctype: None,
            children: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().filter_map(Node::name).collect()
    }

    #[test]
    fn end_tag_closes_nearest_matching_element() {
        let doc = build_tree(tokenize("<div><p><em>x</div><span></span>"));
        assert_eq!(names(doc.children()), vec!["div", "span"]);
        let div = &doc.children()[0];
        assert_eq!(names(div.children()), vec!["p"]);
    }

    #[test]
    fn stray_end_tag_is_ignored() {
        let doc = build_tree(tokenize("<div>a</section>b</div>"));
        let div = &doc.children()[0];
        assert!(matches!(div.children(), [Node::Text { text }] if text == "ab"));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 10_000;
        let input = format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = build_tree(tokenize(&input));
        let mut current = &doc.children()[0];
        for _ in 1..depth {
            assert_eq!(current.children().len(), 1);
            current = &current.children()[0];
        }
        assert!(current.children().is_empty());
    }

    #[test]
    fn doctype_lands_on_document() {
        let doc = build_tree(tokenize("<!doctype html><main></main>"));
        assert!(matches!(&doc, Node::Document { doctype: Some(dt), .. } if dt == "doctype html"));
    }
}
