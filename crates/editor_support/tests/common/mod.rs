#![allow(dead_code)]

use bus::{ChangeDetail, ChangeEvent, ChangeKind, EditorEvent};
use dom::{Document, DomError, NodeKey};
use editor_support::{Decorator, StandardDecorator};
use std::cell::RefCell;
use std::sync::mpsc::Sender;

/// One decorator call: the pass name, the node it ran on, and whether that
/// node was hidden at the time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub pass: &'static str,
    pub node: NodeKey,
    pub hidden: bool,
}

/// Standard decoration that also records every pass it runs and can raise
/// an event from inside `load_block`.
#[derive(Default)]
pub struct Recorder {
    inner: StandardDecorator,
    calls: RefCell<Vec<Call>>,
    raise_on_load: RefCell<Option<(Sender<EditorEvent>, EditorEvent)>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn passes(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|c| c.pass).collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Posts `event` the next time a block loads.
    pub fn raise_during_load(&self, sender: Sender<EditorEvent>, event: EditorEvent) {
        *self.raise_on_load.borrow_mut() = Some((sender, event));
    }

    fn note(&self, doc: &Document, pass: &'static str, node: NodeKey) {
        self.calls.borrow_mut().push(Call {
            pass,
            node,
            hidden: doc.is_hidden(node),
        });
    }
}

impl Decorator for Recorder {
    fn decorate_buttons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        self.note(doc, "buttons", scope);
        self.inner.decorate_buttons(doc, scope)
    }

    fn decorate_icons(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        self.note(doc, "icons", scope);
        self.inner.decorate_icons(doc, scope)
    }

    fn decorate_richtext(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        self.note(doc, "richtext", scope);
        self.inner.decorate_richtext(doc, scope)
    }

    fn decorate_sections(&self, doc: &mut Document, parent: NodeKey) -> Result<(), DomError> {
        self.note(doc, "sections", parent);
        self.inner.decorate_sections(doc, parent)
    }

    fn decorate_block(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError> {
        self.note(doc, "block", block);
        self.inner.decorate_block(doc, block)
    }

    fn decorate_blocks(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        self.note(doc, "blocks", scope);
        self.inner.decorate_blocks(doc, scope)
    }

    fn decorate_main(&self, doc: &mut Document, main: NodeKey) -> Result<(), DomError> {
        self.note(doc, "main", main);
        self.inner.decorate_main(doc, main)
    }

    async fn load_block(&self, doc: &mut Document, block: NodeKey) -> Result<(), DomError> {
        self.note(doc, "load_block", block);
        if let Some((sender, event)) = self.raise_on_load.borrow_mut().take() {
            sender.send(event).expect("dispatcher alive");
        }
        self.inner.load_block(doc, block).await
    }

    async fn load_sections(&self, doc: &mut Document, scope: NodeKey) -> Result<(), DomError> {
        self.note(doc, "load_sections", scope);
        self.inner.load_sections(doc, scope).await
    }
}

pub fn update(resource: &str, content: &str) -> ChangeEvent {
    ChangeEvent::new(ChangeKind::Update, ChangeDetail::targeting(resource).with_update(content))
}

pub fn change(kind: ChangeKind, detail: ChangeDetail) -> EditorEvent {
    EditorEvent::Change(ChangeEvent::new(kind, detail))
}

/// A rendered page: decorated and loaded the way the page scripts leave it.
pub fn rendered(html: &str) -> Document {
    let decorator = StandardDecorator::default();
    let mut doc = Document::parse(html);
    if let Some(main) = doc.main() {
        decorator.decorate_main(&mut doc, main).unwrap();
        decorator.decorate_richtext(&mut doc, main).unwrap();
        pollster::block_on(decorator.load_sections(&mut doc, main)).unwrap();
    }
    doc
}

pub fn by_resource(doc: &Document, resource: &str) -> NodeKey {
    doc.find_by_attr("data-aue-resource", resource)
        .unwrap_or_else(|| panic!("no node for {resource}"))
}

pub fn count_resource(doc: &Document, resource: &str) -> usize {
    doc.query_all(doc.root(), |d: &Document, k| {
        d.attr(k, "data-aue-resource") == Some(resource)
            || d.attr(k, "data-richtext-resource") == Some(resource)
    })
    .len()
}

pub const TABS_PAGE: &str = r#"<html><body><main data-aue-resource="urn:main">
  <div data-aue-resource="urn:s1">
    <div>
      <div class="tabs" data-aue-resource="urn:tabs">
        <div role="tablist">
          <button role="tab" id="btn-1" data-tab-id="a" aria-selected="true">A</button>
          <button role="tab" id="btn-2" data-tab-id="b" aria-selected="false">B</button>
        </div>
        <div class="tabpanel" id="panel-1" aria-labelledby="btn-1" aria-hidden="false">
          <p data-aue-resource="urn:a-text">first</p>
        </div>
        <div class="tabpanel" id="panel-2" aria-labelledby="btn-2" aria-hidden="true">
          <p data-aue-resource="urn:b-text">second</p>
        </div>
      </div>
    </div>
  </div>
</main></body></html>"#;

/// The tabs block as the authoring tool re-renders it: first tab selected.
pub const TABS_RERENDER: &str = r#"<div class="tabs" data-aue-resource="urn:tabs">
  <div role="tablist">
    <button role="tab" id="btn-1" data-tab-id="a" aria-selected="true">A</button>
    <button role="tab" id="btn-2" data-tab-id="b" aria-selected="false">B edited</button>
  </div>
  <div class="tabpanel" id="panel-1" aria-labelledby="btn-1" aria-hidden="false">
    <p data-aue-resource="urn:a-text">first</p>
  </div>
  <div class="tabpanel" id="panel-2" aria-labelledby="btn-2" aria-hidden="true">
    <p data-aue-resource="urn:b-text">second</p>
  </div>
</div>"#;

/// Reloads by rendering `page` from scratch, counting how often it did.
pub struct Reloader {
    pub page: String,
    pub reloads: usize,
}

impl Reloader {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            reloads: 0,
        }
    }
}

impl editor_support::Host for Reloader {
    fn reload(&mut self, doc: &mut Document) {
        *doc = rendered(&self.page);
        self.reloads += 1;
    }
}
