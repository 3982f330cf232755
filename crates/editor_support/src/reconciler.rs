//! Splices re-rendered markup into the live document.
//!
//! Every path follows the same shape: import the replacement hidden, put it
//! next to what it replaces, let the decorator run, and only then remove the
//! old node and reveal the new one. The page never shows both, and never
//! shows neither.

use crate::config::SupportConfig;
use crate::decorate::Decorator;
use crate::dispatcher::attach_event_listeners;
use crate::error::Unapplied;
use crate::resolve::{Granularity, GranularityKind, classify, locate_target, resolve};
use crate::widget_state::WidgetRegistry;
use bus::ChangeEvent;
use core_types::{ListenerId, ResourceId};
use dom::{Document, NodeKey};

/// A patch that landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub resource: ResourceId,
    pub granularity: GranularityKind,
    /// New top-level nodes, in document order.
    pub inserted: Vec<NodeKey>,
    /// Listeners attached to a rebuilt main region.
    pub listeners: Vec<ListenerId>,
}

pub struct Reconciler<D> {
    decorator: D,
    config: SupportConfig,
    widgets: WidgetRegistry,
}

impl<D: Decorator> Reconciler<D> {
    pub fn new(decorator: D, config: SupportConfig) -> Self {
        Self {
            decorator,
            config,
            widgets: WidgetRegistry::standard(),
        }
    }

    pub fn with_widgets(mut self, widgets: WidgetRegistry) -> Self {
        self.widgets = widgets;
        self
    }

    pub fn decorator(&self) -> &D {
        &self.decorator
    }

    pub fn config(&self) -> &SupportConfig {
        &self.config
    }

    /// Applies one change event. Nothing in the document changes unless the
    /// event resolves and its target and replacement both exist.
    pub async fn apply(
        &self,
        doc: &mut Document,
        event: &ChangeEvent,
    ) -> Result<Applied, Unapplied> {
        let resolution = resolve(&event.detail)?;
        let resource = resolution.resource;
        let fragment = Document::parse(resolution.content);
        let target = locate_target(doc, &self.config, &resource)
            .ok_or_else(|| Unapplied::TargetNotFound(resource.clone()))?;

        let granularity = classify(doc, &fragment, &self.config, target, &resource);
        let kind = granularity.kind();
        let mut listeners = Vec::new();
        let inserted = match granularity {
            Granularity::MainDocument { main } => {
                let (new_main, ids) = self.replace_main(doc, &fragment, main, &resource).await?;
                listeners = ids;
                vec![new_main]
            }
            Granularity::Block { block } => {
                vec![self.replace_block(doc, &fragment, block, &resource).await?]
            }
            Granularity::Section { section } => {
                vec![self.replace_section(doc, &fragment, section, &resource).await?]
            }
            Granularity::MultiNode { live, replacements } => {
                self.replace_nodes(doc, &fragment, target, &live, &replacements, &resource)?
            }
        };
        log::debug!(
            target: "editor_support",
            "patched {resource} ({kind:?}), {} node(s) inserted",
            inserted.len()
        );
        Ok(Applied {
            resource,
            granularity: kind,
            inserted,
            listeners,
        })
    }

    async fn replace_main(
        &self,
        doc: &mut Document,
        fragment: &Document,
        main: NodeKey,
        resource: &ResourceId,
    ) -> Result<(NodeKey, Vec<ListenerId>), Unapplied> {
        let source = fragment
            .find_by_attr(&self.config.attributes.resource, resource.as_str())
            .ok_or_else(|| Unapplied::ReplacementNotFound(resource.clone()))?;
        let new_main = stage(doc, fragment, source, main)?;
        self.decorator.decorate_main(doc, new_main)?;
        self.decorator.decorate_richtext(doc, new_main)?;
        self.decorator.load_sections(doc, new_main).await?;
        doc.remove(main)?;
        doc.reveal(new_main)?;
        // listeners on the old main went away with it
        let listeners = attach_event_listeners(doc, new_main)?;
        Ok((new_main, listeners))
    }

    async fn replace_block(
        &self,
        doc: &mut Document,
        fragment: &Document,
        block: NodeKey,
        resource: &ResourceId,
    ) -> Result<NodeKey, Unapplied> {
        let block_resource =
            ResourceId::from(doc.attr(block, &self.config.attributes.resource).unwrap_or_default());
        let source = fragment
            .find_by_attr(&self.config.attributes.resource, block_resource.as_str())
            .ok_or_else(|| Unapplied::ReplacementNotFound(block_resource.clone()))?;
        if block_resource != *resource {
            log::debug!(
                target: "editor_support",
                "{resource} re-renders enclosing block {block_resource}"
            );
        }
        let state = self.widgets.capture(doc, &self.config, block);
        let new_block = stage(doc, fragment, source, block)?;
        self.decorator.decorate_buttons(doc, new_block)?;
        self.decorator.decorate_icons(doc, new_block)?;
        self.decorator.decorate_block(doc, new_block)?;
        self.decorator.decorate_richtext(doc, new_block)?;
        self.decorator.load_block(doc, new_block).await?;
        doc.remove(block)?;
        doc.reveal(new_block)?;
        self.widgets.restore(doc, &self.config, new_block, &state);
        Ok(new_block)
    }

    async fn replace_section(
        &self,
        doc: &mut Document,
        fragment: &Document,
        section: NodeKey,
        resource: &ResourceId,
    ) -> Result<NodeKey, Unapplied> {
        let source = crate::resolve::sharing_resource(fragment, &self.config, resource)
            .first()
            .copied()
            .ok_or_else(|| Unapplied::ReplacementNotFound(resource.clone()))?;
        let parent = doc.parent(section).ok_or(dom::DomError::Orphan(section))?;
        let new_section = stage(doc, fragment, source, section)?;
        self.decorator.decorate_buttons(doc, new_section)?;
        self.decorator.decorate_icons(doc, new_section)?;
        self.decorator.decorate_richtext(doc, new_section)?;
        // siblings are renumbered and regrouped, so the whole parent goes again
        self.decorator.decorate_sections(doc, parent)?;
        self.decorator.decorate_blocks(doc, parent)?;
        self.decorator.load_sections(doc, parent).await?;
        doc.remove(section)?;
        doc.reveal(new_section)?;
        Ok(new_section)
    }

    /// Swaps the first live node for every replacement and drops the other
    /// live nodes with the same resource, so exactly one copy remains.
    fn replace_nodes(
        &self,
        doc: &mut Document,
        fragment: &Document,
        target: NodeKey,
        live: &[NodeKey],
        replacements: &[NodeKey],
        resource: &ResourceId,
    ) -> Result<Vec<NodeKey>, Unapplied> {
        if replacements.is_empty() {
            return Err(Unapplied::ReplacementNotFound(resource.clone()));
        }
        let parent = doc.parent(target).ok_or(dom::DomError::Orphan(target))?;
        let imported = replacements
            .iter()
            .map(|&source| doc.import(fragment, source))
            .collect::<Result<Vec<_>, _>>()?;
        doc.replace_with(target, &imported)?;
        for &stale in live {
            if doc.is_live(stale) {
                doc.remove(stale)?;
            }
        }
        self.decorator.decorate_buttons(doc, parent)?;
        self.decorator.decorate_icons(doc, parent)?;
        self.decorator.decorate_richtext(doc, parent)?;
        Ok(imported)
    }
}

/// Imports `source` hidden and places it right after `anchor`.
fn stage(
    doc: &mut Document,
    fragment: &Document,
    source: NodeKey,
    anchor: NodeKey,
) -> Result<NodeKey, Unapplied> {
    let node = doc.import(fragment, source)?;
    doc.hide(node)?;
    doc.insert_after(anchor, node)?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::StandardDecorator;
    use bus::{ChangeDetail, ChangeKind};
    use pollster::block_on;

    const PAGE: &str = r#"<body><main data-aue-resource="urn:main">
        <div class="section" data-aue-resource="urn:s1">
          <p data-aue-resource="urn:text">old text</p>
          <div><div class="hero block" data-aue-resource="urn:hero"><h1 data-aue-resource="urn:title">Old</h1></div></div>
        </div>
      </main></body>"#;

    fn update(resource: &str, content: &str) -> ChangeEvent {
        ChangeEvent::new(ChangeKind::Update, ChangeDetail::targeting(resource).with_update(content))
    }

    fn reconciler() -> Reconciler<StandardDecorator> {
        Reconciler::new(StandardDecorator::default(), SupportConfig::default())
    }

    #[test]
    fn failures_leave_the_document_untouched() {
        let r = reconciler();
        let mut doc = Document::parse(PAGE);
        let before = doc.to_html();

        let missing = block_on(r.apply(&mut doc, &update("urn:nowhere", "<p>x</p>")));
        assert_eq!(missing, Err(Unapplied::TargetNotFound(ResourceId::from("urn:nowhere"))));
        let empty = block_on(r.apply(&mut doc, &update("urn:text", "")));
        assert_eq!(empty, Err(Unapplied::EmptyContent));
        let other = r#"<div data-aue-resource="urn:other"></div>"#;
        let unmatched = block_on(r.apply(&mut doc, &update("urn:title", other)));
        assert_eq!(unmatched, Err(Unapplied::ReplacementNotFound(ResourceId::from("urn:hero"))));

        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn block_patch_swaps_the_enclosing_block() {
        let r = reconciler();
        let mut doc = Document::parse(PAGE);
        let old = doc.find_by_attr("data-aue-resource", "urn:hero").unwrap();
        let applied = block_on(r.apply(
            &mut doc,
            &update(
                "urn:title",
                r#"<div class="hero" data-aue-resource="urn:hero"><h1 data-aue-resource="urn:title">New</h1></div>"#,
            ),
        ))
        .unwrap();

        assert_eq!(applied.granularity, GranularityKind::Block);
        let new = applied.inserted[0];
        assert!(!doc.is_live(old));
        assert!(doc.is_connected(new));
        assert!(!doc.is_hidden(new));
        assert_eq!(doc.attr(new, "data-block-status"), Some("loaded"));
        let title = doc.find_by_attr("data-aue-resource", "urn:title").unwrap();
        assert_eq!(doc.text_content(title), "New");
    }

    #[test]
    fn multi_node_patch_replaces_in_place() {
        let r = reconciler();
        let mut doc = Document::parse(PAGE);
        let applied = block_on(r.apply(
            &mut doc,
            &update(
                "urn:text",
                r#"<p data-richtext-resource="urn:text">one</p><p data-richtext-resource="urn:text">two</p>"#,
            ),
        ))
        .unwrap();
        assert_eq!(applied.granularity, GranularityKind::MultiNode);
        assert_eq!(applied.inserted.len(), 2);
        let section = doc.find_by_attr("data-aue-resource", "urn:s1").unwrap();
        let first = doc.element_children(section)[0];
        assert_eq!(first, applied.inserted[0]);
        assert_eq!(doc.text_content(first), "one");
    }
}
