//! From a change event to a patch plan: which resource changed, which markup
//! replaces it, and at what granularity the live document is spliced.

use crate::config::SupportConfig;
use crate::error::Unapplied;
use bus::ChangeDetail;
use core_types::ResourceId;
use dom::{Document, NodeKey};

/// A change event reduced to the two things a patch needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub resource: ResourceId,
    pub content: &'a str,
}

/// First non-empty resource among the target, the target's container and the
/// move destination's container.
pub fn resource_of(detail: &ChangeDetail) -> Option<ResourceId> {
    let request = detail.request.as_ref()?;
    let target = request.target.as_ref();
    let candidates = [
        target.and_then(|t| t.resource.as_deref()),
        target
            .and_then(|t| t.container.as_ref())
            .and_then(|c| c.resource.as_deref()),
        request
            .to
            .as_ref()
            .and_then(|to| to.container.as_ref())
            .and_then(|c| c.resource.as_deref()),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|r| !r.is_empty())
        .map(ResourceId::from)
}

pub fn resolve(detail: &ChangeDetail) -> Result<Resolution<'_>, Unapplied> {
    let resource = resource_of(detail).ok_or(Unapplied::NoResource)?;
    let first = detail.updates().first().ok_or(Unapplied::NoUpdates)?;
    match first.content.as_deref() {
        Some(content) if !content.is_empty() => Ok(Resolution { resource, content }),
        _ => Err(Unapplied::EmptyContent),
    }
}

/// How much of the live document a patch replaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// The target is `main`; the whole main region is rebuilt.
    MainDocument { main: NodeKey },
    /// The target is a block or sits inside one; that block is rebuilt.
    Block { block: NodeKey },
    Section { section: NodeKey },
    /// Default content: every live node carrying the resource, and every node
    /// of the updated markup carrying it.
    MultiNode {
        live: Vec<NodeKey>,
        replacements: Vec<NodeKey>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GranularityKind {
    MainDocument,
    Block,
    Section,
    MultiNode,
}

impl Granularity {
    pub fn kind(&self) -> GranularityKind {
        match self {
            Granularity::MainDocument { .. } => GranularityKind::MainDocument,
            Granularity::Block { .. } => GranularityKind::Block,
            Granularity::Section { .. } => GranularityKind::Section,
            Granularity::MultiNode { .. } => GranularityKind::MultiNode,
        }
    }
}

/// First live element annotated with `resource`.
pub fn locate_target(
    doc: &Document,
    config: &SupportConfig,
    resource: &ResourceId,
) -> Option<NodeKey> {
    doc.find_by_attr(&config.attributes.resource, resource.as_str())
}

fn is_annotated_block(doc: &Document, config: &SupportConfig, key: NodeKey) -> bool {
    doc.has_class(key, &config.classes.block) && doc.has_attr(key, &config.attributes.resource)
}

/// The block a target belongs to. An enclosing block wins over the target
/// itself, so a nested annotated block re-renders its outer block.
pub fn enclosing_block(doc: &Document, config: &SupportConfig, target: NodeKey) -> Option<NodeKey> {
    let is_block = |d: &Document, k: NodeKey| is_annotated_block(d, config, k);
    doc.parent(target)
        .and_then(|parent| doc.closest(parent, is_block))
        .or_else(|| doc.closest(target, is_block))
}

/// Outermost elements of `doc` carrying `resource` in either the resource or
/// the rich-text resource attribute, in document order. Matches nested inside
/// an earlier match are skipped: they travel with their ancestor.
pub fn sharing_resource(
    doc: &Document,
    config: &SupportConfig,
    resource: &ResourceId,
) -> Vec<NodeKey> {
    let id = resource.as_str();
    let mut hits: Vec<NodeKey> = Vec::new();
    for key in doc.descendants(doc.root()) {
        let carries = doc.attr(key, &config.attributes.resource) == Some(id)
            || doc.attr(key, &config.attributes.richtext_resource) == Some(id);
        if !doc.is_element(key) || !carries {
            continue;
        }
        // preorder: a containing match is always the last one kept
        if hits.last().is_some_and(|&outer| doc.contains(outer, key)) {
            continue;
        }
        hits.push(key);
    }
    hits
}

pub fn classify(
    doc: &Document,
    fragment: &Document,
    config: &SupportConfig,
    target: NodeKey,
    resource: &ResourceId,
) -> Granularity {
    let granularity = if doc.tag_name(target).is_some_and(|n| n.eq_ignore_ascii_case("main")) {
        Granularity::MainDocument { main: target }
    } else if let Some(block) = enclosing_block(doc, config, target) {
        Granularity::Block { block }
    } else if doc.has_class(target, &config.classes.section) {
        Granularity::Section { section: target }
    } else {
        Granularity::MultiNode {
            live: sharing_resource(doc, config, resource),
            replacements: sharing_resource(fragment, config, resource),
        }
    };
    log::debug!(target: "editor_support", "{resource} classified as {:?}", granularity.kind());
    granularity
}
