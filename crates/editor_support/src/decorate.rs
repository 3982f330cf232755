//! Page rendering passes the patch engine calls into.
//!
//! The engine never decides what a block looks like; it only sequences the
//! passes a [`Decorator`] provides. [`StandardDecorator`] is a small
//! Edge-Delivery-style baseline: enough structure for classification and
//! widget state to work on server-rendered markup.

use crate::config::SupportConfig;
use dom::{Document, DomError, NodeKey, select};
use std::future::Future;

pub trait Decorator {
    fn decorate_buttons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError>;
    fn decorate_icons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError>;
    fn decorate_richtext(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError>;
    /// Turns the undecorated children of `parent` into sections.
    fn decorate_sections(&self, doc: &mut Document, parent: NodeKey) -> Result<(), DomError>;
    fn decorate_block(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError>;
    /// Finds block candidates under `scope` and decorates each.
    fn decorate_blocks(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError>;

    /// Full pass over a main region.
    fn decorate_main(&self, doc: &mut Document, main: NodeKey) -> Result<(), DomError> {
        self.decorate_buttons(doc, main)?;
        self.decorate_icons(doc, main)?;
        self.decorate_sections(doc, main)?;
        self.decorate_blocks(doc, main)
    }

    fn load_block(
        &self,
        doc: &mut Document,
        block: NodeKey,
    ) -> impl Future<Output = Result<(), DomError>>;

    /// Loads every section of `scope` (or `scope` itself when it is one).
    fn load_sections(
        &self,
        doc: &mut Document,
        scope: NodeKey,
    ) -> impl Future<Output = Result<(), DomError>>;
}

#[derive(Clone, Debug, Default)]
pub struct StandardDecorator {
    config: SupportConfig,
}

impl StandardDecorator {
    pub fn new(config: SupportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SupportConfig {
        &self.config
    }

    fn block_name<'d>(&self, doc: &'d Document, block: NodeKey) -> Option<&'d str> {
        doc.attr(block, "class")?
            .split_ascii_whitespace()
            .find(|c| *c != self.config.classes.block)
    }

    fn sections_of(&self, doc: &Document, scope: NodeKey) -> Vec<NodeKey> {
        let section = self.config.classes.section.as_str();
        if doc.has_class(scope, section) {
            return vec![scope];
        }
        doc.element_children(scope)
            .into_iter()
            .filter(|&k| doc.has_class(k, section))
            .collect()
    }

    /// Clicking a tab selects it and shows the panel labelled by it.
    fn wire_tabs(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError> {
        let tabpanel = self.config.classes.tabpanel.clone();
        doc.set_activation(block, move |doc, clicked| {
            let Some(tab) = doc.closest(clicked, select::attr_eq("role", "tab")) else {
                return;
            };
            let tab_id = doc.attr(tab, "id").map(str::to_string);
            let updates: Vec<(NodeKey, &str, &str)> = doc
                .query_all(block, select::attr_eq("role", "tab"))
                .into_iter()
                .map(|t| (t, "aria-selected", if t == tab { "true" } else { "false" }))
                .chain(
                    doc.query_all(block, select::class(&tabpanel))
                        .into_iter()
                        .map(|p| {
                            let shown = tab_id.is_some()
                                && doc.attr(p, "aria-labelledby") == tab_id.as_deref();
                            (p, "aria-hidden", if shown { "false" } else { "true" })
                        }),
                )
                .collect();
            for (node, name, value) in updates {
                if let Err(err) = doc.set_attr(node, name, value) {
                    log::warn!(target: "editor_support", "tab switch failed: {err}");
                }
            }
        })
    }
}

impl Decorator for StandardDecorator {
    /// A link alone in its paragraph becomes a button; wrapped in `strong` or
    /// `em` it becomes a primary or secondary one.
    fn decorate_buttons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        let links: Vec<NodeKey> = doc
            .subtree(scope)
            .filter(|&k| doc.matches(k, select::tag("a")))
            .collect();
        for link in links {
            if doc.query(link, select::tag("img")).is_some()
                || doc.text_content(link).trim().is_empty()
            {
                continue;
            }
            let Some(parent) = doc.parent(link) else {
                continue;
            };
            let (container, variant) = match doc.tag_name(parent) {
                Some("p" | "div") => (parent, None),
                Some(emphasis @ ("strong" | "em")) => {
                    let variant = if emphasis == "strong" { "primary" } else { "secondary" };
                    match doc.parent(parent) {
                        Some(p) if doc.matches(p, select::tag("p")) && alone_in(doc, p, parent) => {
                            (p, Some(variant))
                        }
                        _ => continue,
                    }
                }
                _ => continue,
            };
            if variant.is_none() && !alone_in(doc, container, link) {
                continue;
            }
            doc.add_class(link, "button")?;
            if let Some(variant) = variant {
                doc.add_class(link, variant)?;
            }
            doc.add_class(container, "button-container")?;
        }
        Ok(())
    }

    fn decorate_icons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        let icons: Vec<(NodeKey, String)> = doc
            .subtree(scope)
            .filter(|&k| doc.matches(k, select::tag("span")) && doc.children(k).is_empty())
            .filter_map(|k| {
                let name = doc
                    .attr(k, "class")?
                    .split_ascii_whitespace()
                    .find_map(|c| c.strip_prefix("icon-"))?;
                Some((k, name.to_string()))
            })
            .collect();
        for (span, name) in icons {
            let img = doc.create_element("img");
            doc.set_attr(img, "data-icon-name", &name)?;
            doc.set_attr(img, "src", &format!("/icons/{name}.svg"))?;
            doc.set_attr(img, "alt", "")?;
            doc.set_attr(img, "loading", "lazy")?;
            doc.append_child(span, img)?;
        }
        Ok(())
    }

    /// Rich-text carriers become editable in place: they get the resource
    /// annotation and the rich-text editor type.
    fn decorate_richtext(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        let attrs = &self.config.attributes;
        let carriers: Vec<(NodeKey, String)> = doc
            .subtree(scope)
            .filter_map(|k| Some((k, doc.attr(k, &attrs.richtext_resource)?.to_string())))
            .collect();
        for (node, resource) in carriers {
            if !doc.has_attr(node, &attrs.resource) {
                doc.set_attr(node, &attrs.resource, &resource)?;
            }
            doc.set_attr(node, "data-aue-type", "richtext")?;
            for (from, to) in [
                ("data-richtext-prop", "data-aue-prop"),
                ("data-richtext-label", "data-aue-label"),
            ] {
                if let Some(value) = doc.attr(node, from).map(str::to_string) {
                    doc.set_attr(node, to, &value)?;
                }
            }
        }
        Ok(())
    }

    fn decorate_sections(&self, doc: &mut Document, parent: NodeKey) -> Result<(), DomError> {
        let fresh: Vec<NodeKey> = doc
            .element_children(parent)
            .into_iter()
            .filter(|&k| {
                doc.matches(k, select::tag("div")) && !doc.has_attr(k, "data-section-status")
            })
            .collect();
        for section in fresh {
            doc.add_class(section, &self.config.classes.section)?;
            doc.set_attr(section, "data-section-status", "initialized")?;
        }
        Ok(())
    }

    fn decorate_block(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError> {
        if doc.has_attr(block, "data-block-status") {
            return Ok(());
        }
        let Some(name) = self.block_name(doc, block).map(str::to_string) else {
            return Ok(());
        };
        doc.add_class(block, &self.config.classes.block)?;
        doc.set_attr(block, "data-block-name", &name)?;
        doc.set_attr(block, "data-block-status", "initialized")?;
        if let Some(wrapper) = doc.parent(block).filter(|&p| doc.is_element(p)) {
            doc.add_class(wrapper, &format!("{name}-wrapper"))?;
            let section = doc
                .parent(wrapper)
                .filter(|&s| doc.has_class(s, &self.config.classes.section));
            if let Some(section) = section {
                doc.add_class(section, &format!("{name}-container"))?;
            }
        }
        if name == self.config.classes.tabs {
            self.wire_tabs(doc, block)?;
        }
        log::debug!(target: "editor_support", "decorated {name} block");
        Ok(())
    }

    /// Candidates are classed divs one wrapper below a section.
    fn decorate_blocks(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        let section = self.config.classes.section.as_str();
        let candidates = doc.query_all(scope, |d: &Document, k| {
            d.matches(k, select::tag("div"))
                && d.attr(k, "class").is_some_and(|c| !c.trim().is_empty())
                && d.parent(k)
                    .filter(|&w| d.matches(w, select::tag("div")))
                    .and_then(|w| d.parent(w))
                    .is_some_and(|s| d.has_class(s, section))
        });
        for block in candidates {
            self.decorate_block(doc, block)?;
        }
        Ok(())
    }

    async fn load_block(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError> {
        doc.set_attr(block, "data-block-status", "loaded")
    }

    async fn load_sections(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        for section in self.sections_of(doc, scope) {
            let blocks = doc.query_all(section, select::class(&self.config.classes.block));
            for block in blocks {
                self.load_block(doc, block).await?;
            }
            doc.set_attr(section, "data-section-status", "loaded")?;
        }
        Ok(())
    }
}

fn alone_in(doc: &Document, parent: NodeKey, child: NodeKey) -> bool {
    doc.element_children(parent) == [child]
        && doc.text_content(parent).trim() == doc.text_content(child).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decorated(html: &str) -> Document {
        let decorator = StandardDecorator::default();
        let mut doc = Document::parse(html);
        let main = doc.main().unwrap();
        decorator.decorate_main(&mut doc, main).unwrap();
        pollster::block_on(decorator.load_sections(&mut doc, main)).unwrap();
        doc
    }

    #[test]
    fn main_pass_builds_sections_and_blocks() {
        let doc = decorated(
            r#"<main><div><div><div class="hero" data-aue-resource="urn:h"><h1>Hi</h1></div></div></div><div><p>text</p></div></main>"#,
        );
        let main = doc.main().unwrap();
        let sections = doc.element_children(main);
        assert!(sections.iter().all(|&s| doc.has_class(s, "section")));
        assert!(sections.iter().all(|&s| doc.attr(s, "data-section-status") == Some("loaded")));
        let hero = doc.find_by_attr("data-aue-resource", "urn:h").unwrap();
        assert!(doc.has_class(hero, "block"));
        assert_eq!(doc.attr(hero, "data-block-name"), Some("hero"));
        assert_eq!(doc.attr(hero, "data-block-status"), Some("loaded"));
        assert!(doc.has_class(sections[0], "hero-container"));
    }

    #[test]
    fn buttons_and_icons() {
        let doc = decorated(
            r#"<main><div><p><a href="/a">Go</a></p><p><strong><a href="/b">Buy</a></strong></p><p>Read <a href="/c">more</a></p><p><span class="icon icon-search"></span></p></div></main>"#,
        );
        let a = doc.find_by_attr("href", "/a").unwrap();
        let b = doc.find_by_attr("href", "/b").unwrap();
        let c = doc.find_by_attr("href", "/c").unwrap();
        assert!(doc.has_class(a, "button") && !doc.has_class(a, "primary"));
        assert!(doc.has_class(b, "button") && doc.has_class(b, "primary"));
        assert!(!doc.has_class(c, "button"));
        let img = doc.find_by_attr("data-icon-name", "search").unwrap();
        assert_eq!(doc.attr(img, "src"), Some("/icons/search.svg"));
    }

    #[test]
    fn richtext_carriers_become_editable() {
        let decorator = StandardDecorator::default();
        let mut doc = Document::parse(
            r#"<div id="s"><p data-richtext-resource="urn:t" data-richtext-prop="text">x</p></div>"#,
        );
        let s = doc.find_by_attr("id", "s").unwrap();
        decorator.decorate_richtext(&mut doc, s).unwrap();
        let p = doc.find_by_attr("data-aue-resource", "urn:t").unwrap();
        assert_eq!(doc.attr(p, "data-aue-type"), Some("richtext"));
        assert_eq!(doc.attr(p, "data-aue-prop"), Some("text"));
    }

    #[test]
    fn tab_clicks_switch_panels() {
        let mut doc = decorated(
            r#"<main><div><div><div class="tabs" data-aue-resource="urn:tabs">
                 <div role="tablist">
                   <button role="tab" id="t1" data-tab-id="one" aria-selected="true">One</button>
                   <button role="tab" id="t2" data-tab-id="two" aria-selected="false">Two</button>
                 </div>
                 <div class="tabpanel" id="p1" aria-labelledby="t1" aria-hidden="false"></div>
                 <div class="tabpanel" id="p2" aria-labelledby="t2" aria-hidden="true"></div>
               </div></div></div></main>"#,
        );
        let t2 = doc.find_by_attr("id", "t2").unwrap();
        doc.click(t2).unwrap();
        let at = |id: &str| doc.find_by_attr("id", id).unwrap();
        assert_eq!(doc.attr(at("t1"), "aria-selected"), Some("false"));
        assert_eq!(doc.attr(at("t2"), "aria-selected"), Some("true"));
        assert_eq!(doc.attr(at("p1"), "aria-hidden"), Some("true"));
        assert_eq!(doc.attr(at("p2"), "aria-hidden"), Some("false"));
    }
}
