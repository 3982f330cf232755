//! Editor annotations that depend on page-level context: which components the
//! authoring tool may insert where, and the template banner.
//!
//! Runs once on load and again after every applied patch. Every pass rewrites
//! the same attributes, so repeated refreshes converge.

use crate::config::SupportConfig;
use dom::{Document, DomError, NodeKey, select};

/// What kind of page is being edited, read once per refresh from `body`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Template name when the page is a template.
    pub template: Option<String>,
    pub is_article: bool,
}

impl PageContext {
    pub fn from_document(doc: &Document, config: &SupportConfig) -> Self {
        let Some(body) = doc.body() else {
            return Self::default();
        };
        Self {
            template: doc.attr(body, &config.attributes.template).map(str::to_string),
            is_article: doc
                .attr(body, "class")
                .is_some_and(|class| class.starts_with(config.classes.article_prefix.as_str())),
        }
    }

    pub fn is_template(&self) -> bool {
        self.template.is_some()
    }
}

pub fn refresh(
    doc: &mut Document,
    config: &SupportConfig,
    ctx: &PageContext,
) -> Result<(), DomError> {
    let Some(main) = doc.main() else {
        log::debug!(target: "editor_support", "no main element, skipping annotations");
        return Ok(());
    };
    let filter = config.attributes.filter.as_str();
    doc.set_attr(main, filter, &config.filters.page)?;

    if let Some(name) = ctx.template.as_deref() {
        show_template_banner(doc, config, name)?;
    } else if ctx.is_article {
        for section in doc.query_all(main, select::class(&config.classes.section)) {
            doc.set_attr(section, filter, &config.filters.article_section)?;
            assign_heading_ids(doc, section)?;
        }
    }
    Ok(())
}

fn show_template_banner(
    doc: &mut Document,
    config: &SupportConfig,
    name: &str,
) -> Result<(), DomError> {
    let Some(body) = doc.body() else {
        return Ok(());
    };
    let text = format!("INFO: This is the initial content for template {name}");
    let banner_class = config.classes.template_banner.as_str();
    let existing = doc
        .element_children(body)
        .into_iter()
        .find(|&child| doc.has_class(child, banner_class));
    let banner = match existing {
        Some(existing) => existing,
        None => {
            let banner = doc.create_element("div");
            doc.add_class(banner, banner_class)?;
            doc.append_child(body, banner)?;
            banner
        }
    };
    doc.set_text_content(banner, &text)?;
    doc.set_attr(body, &config.attributes.model, &config.filters.template_model)
}

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Gives every heading under `scope` that lacks an `id` one derived from its
/// text, so rich-text titles can be linked to.
pub fn assign_heading_ids(doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
    let headings = doc.query_all(scope, |d: &Document, k| {
        !d.has_attr(k, "id") && d.tag_name(k).is_some_and(|n| HEADINGS.contains(&n))
    });
    for heading in headings {
        let anchor = heading_anchor(&doc.text_content(heading));
        if !anchor.is_empty() {
            doc.set_attr(heading, "id", &anchor)?;
        }
    }
    Ok(())
}

/// Lowercased text with every run of characters outside `[a-z0-9-]` folded
/// into single dashes, and no leading or trailing dash.
pub fn heading_anchor(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && (anchor.is_empty() || anchor.ends_with('-')) {
            continue;
        }
        anchor.push(c);
    }
    while anchor.ends_with('-') {
        anchor.pop();
    }
    anchor
}
