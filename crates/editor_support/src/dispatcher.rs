//! Event intake: routes authoring-tool events to the reconciler and the
//! selection handler, and decides when the page has to reload instead.

use crate::annotations::{self, PageContext};
use crate::decorate::Decorator;
use crate::error::Unapplied;
use crate::reconciler::{Applied, Reconciler};
use crate::resolve::resource_of;
use bus::{Bus, EditorEvent, SelectDetail};
use core_types::{EventType, ListenerId};
use dom::{Document, DomError, NodeKey, select};
use std::sync::mpsc::Sender;

/// The page's environment. The only thing the engine asks of it is a reload.
pub trait Host {
    /// Replaces `doc` with a freshly loaded and rendered page.
    fn reload(&mut self, doc: &mut Document);
}

impl<F: FnMut(&mut Document)> Host for F {
    fn reload(&mut self, doc: &mut Document) {
        self(doc)
    }
}

/// What handling one event amounted to.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Applied(Applied),
    /// The patch could not be applied in place; the page was reloaded.
    Reloaded(Unapplied),
    /// No listener was reachable from the event target; the default action
    /// reloaded the page.
    Unhandled(EventType),
    /// A tab panel was selected and its tab button clicked.
    Selected { tab: NodeKey },
    Ignored,
}

/// Registers the content-change listeners and the selection listener on `main`.
pub fn attach_event_listeners(
    doc: &mut Document,
    main: NodeKey,
) -> Result<Vec<ListenerId>, DomError> {
    EventType::CONTENT_CHANGES
        .into_iter()
        .chain([EventType::UiSelect])
        .map(|ty| doc.add_event_listener(main, ty))
        .collect()
}

pub struct Dispatcher<D, H> {
    reconciler: Reconciler<D>,
    host: H,
    bus: Bus,
    /// The change event whose patch is being applied. Holds at most one:
    /// events arriving meanwhile wait on the bus.
    in_flight: Option<EventType>,
}

impl<D: Decorator, H: Host> Dispatcher<D, H> {
    pub fn new(reconciler: Reconciler<D>, host: H) -> Self {
        Self {
            reconciler,
            host,
            bus: Bus::new(),
            in_flight: None,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<D> {
        &self.reconciler
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// For collaborators that raise events while a patch is running.
    pub fn sender(&self) -> Sender<EditorEvent> {
        self.bus.sender()
    }

    pub fn in_flight(&self) -> Option<EventType> {
        self.in_flight
    }

    /// Page-load wiring: listeners on `main`, then a first annotation pass.
    pub fn install(&mut self, doc: &mut Document) {
        match doc.main() {
            Some(main) => {
                if let Err(err) = attach_event_listeners(doc, main) {
                    log::warn!(target: "editor_support", "attaching listeners failed: {err}");
                }
            }
            None => {
                log::warn!(target: "editor_support", "page has no main element, edits will reload")
            }
        }
        self.refresh(doc);
    }

    /// Handles `event` at the node its resource points to, after anything
    /// already queued, then whatever was queued while it ran.
    pub async fn dispatch(&mut self, doc: &mut Document, event: EditorEvent) -> Vec<Outcome> {
        self.dispatch_from(doc, None, event).await
    }

    /// Like [`dispatch`](Self::dispatch), with an explicit event target.
    pub async fn dispatch_at(
        &mut self,
        doc: &mut Document,
        target: NodeKey,
        event: EditorEvent,
    ) -> Vec<Outcome> {
        self.dispatch_from(doc, Some(target), event).await
    }

    /// Handles every queued event in arrival order.
    pub async fn drain(&mut self, doc: &mut Document) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.bus.try_next() {
            outcomes.push(self.deliver(doc, None, event).await);
        }
        outcomes
    }

    async fn dispatch_from(
        &mut self,
        doc: &mut Document,
        target: Option<NodeKey>,
        event: EditorEvent,
    ) -> Vec<Outcome> {
        let mut outcomes = self.drain(doc).await;
        outcomes.push(self.deliver(doc, target, event).await);
        outcomes.extend(self.drain(doc).await);
        outcomes
    }

    async fn deliver(
        &mut self,
        doc: &mut Document,
        target: Option<NodeKey>,
        event: EditorEvent,
    ) -> Outcome {
        let event_type = event.event_type();
        let target = target
            .filter(|&t| doc.is_connected(t))
            .or_else(|| self.route(doc, &event));
        let handled = target.is_some_and(|t| doc.find_listener(t, event_type).is_some());

        match event {
            EditorEvent::Change(_) if !handled => {
                log::warn!(target: "editor_support", "{event_type} reached no listener, reloading");
                self.reload(doc);
                Outcome::Unhandled(event_type)
            }
            EditorEvent::Change(change) => {
                self.in_flight = Some(event_type);
                let result = self.reconciler.apply(doc, &change).await;
                self.in_flight = None;
                match result {
                    Ok(applied) => {
                        self.refresh(doc);
                        Outcome::Applied(applied)
                    }
                    Err(reason) => {
                        log::warn!(
                            target: "editor_support",
                            "{event_type} not applied ({reason}), reloading"
                        );
                        self.reload(doc);
                        Outcome::Reloaded(reason)
                    }
                }
            }
            EditorEvent::Select(detail) => match target {
                Some(target) if handled => self.on_select(doc, target, &detail),
                _ => Outcome::Ignored,
            },
        }
    }

    /// The node carrying the event's resource, else `main`.
    fn route(&self, doc: &Document, event: &EditorEvent) -> Option<NodeKey> {
        let resource_attr = &self.reconciler.config().attributes.resource;
        let resource = match event {
            EditorEvent::Change(change) => resource_of(&change.detail).map(|r| r.0),
            EditorEvent::Select(detail) => detail.resource.clone(),
        };
        resource
            .and_then(|r| doc.find_by_attr(resource_attr, &r))
            .or_else(|| doc.main())
    }

    fn on_select(&self, doc: &mut Document, target: NodeKey, detail: &SelectDetail) -> Outcome {
        if !detail.selected {
            return Outcome::Ignored;
        }
        match self.select_tab(doc, target) {
            Ok(Some(tab)) => Outcome::Selected { tab },
            Ok(None) => Outcome::Ignored,
            Err(err) => {
                log::warn!(target: "editor_support", "switching tabs failed: {err}");
                Outcome::Ignored
            }
        }
    }

    /// Clicks the tab button labelling the panel that contains `target`.
    fn select_tab(&self, doc: &mut Document, target: NodeKey) -> Result<Option<NodeKey>, DomError> {
        let classes = &self.reconciler.config().classes;
        let Some(panel) = doc.closest(target, select::class(&classes.tabpanel)) else {
            return Ok(None);
        };
        let Some(button_id) = doc.attr(panel, "aria-labelledby").map(str::to_string) else {
            return Ok(None);
        };
        let tabs_block = [classes.tabs.as_str(), classes.block.as_str()];
        let Some(tabs) = doc.closest(panel, select::classes(&tabs_block)) else {
            return Ok(None);
        };
        let button = doc.query(tabs, |d: &Document, k| {
            d.matches(k, select::tag("button")) && d.attr(k, "id") == Some(button_id.as_str())
        });
        match button {
            Some(button) => {
                doc.click(button)?;
                Ok(Some(button))
            }
            None => Ok(None),
        }
    }

    fn reload(&mut self, doc: &mut Document) {
        self.host.reload(doc);
        self.install(doc);
    }

    fn refresh(&self, doc: &mut Document) {
        let config = self.reconciler.config();
        let ctx = PageContext::from_document(doc, config);
        if let Err(err) = annotations::refresh(doc, config, &ctx) {
            log::warn!(target: "editor_support", "annotation refresh failed: {err}");
        }
    }
}
