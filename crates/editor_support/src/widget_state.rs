//! Interactive state that survives a block re-render.
//!
//! Each widget kind is a predicate plus a capture and a restore function.
//! Capture reads the old block just before it is replaced; restore runs on the
//! new block after it is revealed.

use crate::config::SupportConfig;
use dom::{Document, DomError, NodeKey, select};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WidgetState {
    /// Tab id of the selected tab.
    pub active_tab_id: Option<String>,
    /// Horizontal offset of a carousel's panel container.
    pub scroll_left: Option<f64>,
    /// Free-form slots for kinds registered by the embedding page.
    pub extra: BTreeMap<String, String>,
}

impl WidgetState {
    pub fn is_empty(&self) -> bool {
        self.active_tab_id.is_none() && self.scroll_left.is_none() && self.extra.is_empty()
    }
}

pub type Applies = fn(&Document, &SupportConfig, NodeKey) -> bool;
pub type Capture = fn(&Document, &SupportConfig, NodeKey, &mut WidgetState);
pub type Restore = fn(&mut Document, &SupportConfig, NodeKey, &WidgetState) -> Result<(), DomError>;

#[derive(Clone, Copy)]
pub struct WidgetKind {
    pub name: &'static str,
    pub applies: Applies,
    pub capture: Capture,
    pub restore: Restore,
}

impl std::fmt::Debug for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetKind").field("name", &self.name).finish()
    }
}

#[derive(Clone, Debug)]
pub struct WidgetRegistry {
    kinds: Vec<WidgetKind>,
}

impl WidgetRegistry {
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Tabs and carousel.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(TABS);
        registry.register(CAROUSEL);
        registry
    }

    pub fn register(&mut self, kind: WidgetKind) {
        self.kinds.push(kind);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.iter().map(|k| k.name)
    }

    pub fn capture(&self, doc: &Document, config: &SupportConfig, block: NodeKey) -> WidgetState {
        let mut state = WidgetState::default();
        for kind in &self.kinds {
            if (kind.applies)(doc, config, block) {
                (kind.capture)(doc, config, block, &mut state);
            }
        }
        state
    }

    /// Restores into `block`. A kind that fails is logged and skipped; the
    /// remaining kinds still run.
    pub fn restore(
        &self,
        doc: &mut Document,
        config: &SupportConfig,
        block: NodeKey,
        state: &WidgetState,
    ) {
        for kind in &self.kinds {
            if !(kind.applies)(doc, config, block) {
                continue;
            }
            if let Err(err) = (kind.restore)(doc, config, block, state) {
                log::warn!(target: "editor_support", "restoring {} state failed: {err}", kind.name);
            }
        }
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

pub const TABS: WidgetKind = WidgetKind {
    name: "tabs",
    applies: |doc, config, block| doc.has_class(block, &config.classes.tabs),
    capture: capture_tabs,
    restore: restore_tabs,
};

pub const CAROUSEL: WidgetKind = WidgetKind {
    name: "carousel",
    applies: |doc, config, block| doc.has_class(block, &config.classes.carousel),
    capture: capture_carousel,
    restore: restore_carousel,
};

fn capture_tabs(doc: &Document, config: &SupportConfig, block: NodeKey, state: &mut WidgetState) {
    state.active_tab_id = doc
        .query(block, select::attr_eq("aria-selected", "true"))
        .and_then(|tab| doc.attr(tab, &config.attributes.tab_id))
        .map(str::to_string);
}

fn restore_tabs(
    doc: &mut Document,
    config: &SupportConfig,
    block: NodeKey,
    state: &WidgetState,
) -> Result<(), DomError> {
    let Some(id) = state.active_tab_id.as_deref() else {
        return Ok(());
    };
    match doc.query(block, select::attr_eq(&config.attributes.tab_id, id)) {
        Some(tab) => doc.click(tab),
        None => {
            log::debug!(target: "editor_support", "tab {id} no longer exists");
            Ok(())
        }
    }
}

fn capture_carousel(
    doc: &Document,
    config: &SupportConfig,
    block: NodeKey,
    state: &mut WidgetState,
) {
    state.scroll_left = doc
        .query(block, select::class(&config.classes.panel_container))
        .map(|panel| doc.scroll_left(panel));
}

fn restore_carousel(
    doc: &mut Document,
    config: &SupportConfig,
    block: NodeKey,
    state: &WidgetState,
) -> Result<(), DomError> {
    // zero means "at the start", which a fresh carousel already is
    let Some(offset) = state.scroll_left.filter(|&o| o != 0.0) else {
        return Ok(());
    };
    match doc.query(block, select::class(&config.classes.panel_container)) {
        Some(panel) => doc.set_scroll_left(panel, offset),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABS_HTML: &str = r#"<div class="tabs block" id="b">
        <div role="tablist">
          <button role="tab" data-tab-id="one" aria-selected="false">One</button>
          <button role="tab" data-tab-id="two" aria-selected="true">Two</button>
        </div>
      </div>"#;

    #[test]
    fn captures_selected_tab_and_clicks_it_on_restore() {
        let config = SupportConfig::default();
        let registry = WidgetRegistry::standard();
        let mut doc = Document::parse(TABS_HTML);
        let block = doc.find_by_attr("id", "b").unwrap();

        let state = registry.capture(&doc, &config, block);
        assert_eq!(state.active_tab_id.as_deref(), Some("two"));
        assert_eq!(state.scroll_left, None);

        registry.restore(&mut doc, &config, block, &state);
        let two = doc.find_by_attr("data-tab-id", "two").unwrap();
        assert_eq!(doc.activation_log(), &[two]);
    }

    #[test]
    fn carousel_offset_is_restored_only_when_nonzero() {
        let config = SupportConfig::default();
        let registry = WidgetRegistry::standard();
        let mut doc = Document::parse(
            r#"<div class="carousel block" id="b"><div class="panel-container"></div></div>"#,
        );
        let block = doc.find_by_attr("id", "b").unwrap();
        let panel = doc.query(block, select::class("panel-container")).unwrap();

        doc.set_scroll_left(panel, 240.0).unwrap();
        let state = registry.capture(&doc, &config, block);
        assert_eq!(state.scroll_left, Some(240.0));

        doc.set_scroll_left(panel, 0.0).unwrap();
        registry.restore(&mut doc, &config, block, &state);
        assert_eq!(doc.scroll_left(panel), 240.0);

        let at_start = WidgetState {
            scroll_left: Some(0.0),
            ..WidgetState::default()
        };
        doc.set_scroll_left(panel, 50.0).unwrap();
        registry.restore(&mut doc, &config, block, &at_start);
        assert_eq!(doc.scroll_left(panel), 50.0);
    }

    #[test]
    fn unknown_blocks_capture_nothing() {
        let config = SupportConfig::default();
        let doc = Document::parse(r#"<div class="hero block" id="b"></div>"#);
        let block = doc.find_by_attr("id", "b").unwrap();
        assert!(WidgetRegistry::standard().capture(&doc, &config, block).is_empty());
    }

    #[test]
    fn registered_kinds_use_extra_slots() {
        const ACCORDION: WidgetKind = WidgetKind {
            name: "accordion",
            applies: |doc, _, block| doc.has_class(block, "accordion"),
            capture: |doc, _, block, state| {
                if let Some(open) = doc.query(block, select::has_attr("open")) {
                    let id = doc.attr(open, "id").unwrap_or_default().to_string();
                    state.extra.insert("open".to_string(), id);
                }
            },
            restore: |doc, _, block, state| {
                let Some(id) = state.extra.get("open") else {
                    return Ok(());
                };
                match doc.query(block, select::attr_eq("id", id)) {
                    Some(item) => doc.set_attr(item, "open", ""),
                    None => Ok(()),
                }
            },
        };
        let config = SupportConfig::default();
        let mut registry = WidgetRegistry::standard();
        registry.register(ACCORDION);
        assert_eq!(registry.kinds().collect::<Vec<_>>(), ["tabs", "carousel", "accordion"]);

        let old = Document::parse(
            r#"<div class="accordion block" id="b"><details id="d2" open></details></div>"#,
        );
        let state = registry.capture(&old, &config, old.find_by_attr("id", "b").unwrap());

        let mut new = Document::parse(
            r#"<div class="accordion block" id="b"><details id="d2"></details></div>"#,
        );
        let block = new.find_by_attr("id", "b").unwrap();
        registry.restore(&mut new, &config, block, &state);
        let d2 = new.find_by_attr("id", "d2").unwrap();
        assert!(new.has_attr(d2, "open"));
    }

    #[test]
    fn a_failing_kind_does_not_stop_the_others() {
        const BROKEN: WidgetKind = WidgetKind {
            name: "broken",
            applies: |_, _, _| true,
            capture: |_, _, _, _| {},
            restore: |_, _, _, _| Err(DomError::Root),
        };
        let config = SupportConfig::default();
        let mut registry = WidgetRegistry::empty();
        registry.register(BROKEN);
        registry.register(TABS);

        let mut doc = Document::parse(TABS_HTML);
        let block = doc.find_by_attr("id", "b").unwrap();
        let state = registry.capture(&doc, &config, block);
        registry.restore(&mut doc, &config, block, &state);

        let two = doc.find_by_attr("data-tab-id", "two").unwrap();
        assert_eq!(doc.activation_log(), &[two]);
    }
}
