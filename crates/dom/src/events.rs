//! Listener registry and simulated activation.
//!
//! The document only records who listens for what; what a listener does is
//! decided by whoever registered it. Activation handlers stand in for the
//! click behavior that block decoration installs on interactive elements.

use crate::{Document, DomError, NodeKey};
use core_types::{EventType, ListenerId};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Listener {
    pub id: ListenerId,
    pub event: EventType,
}

pub type ActivationHandler = Rc<dyn Fn(&mut Document, NodeKey)>;

impl Document {
    pub fn add_event_listener(
        &mut self,
        node: NodeKey,
        event: EventType,
    ) -> Result<ListenerId, DomError> {
        self.record(node)?;
        let id = self.allocate_listener_id();
        self.listeners
            .entry(node)
            .or_default()
            .push(Listener { id, event });
        Ok(id)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for list in self.listeners.values_mut() {
            let before = list.len();
            list.retain(|l| l.id != id);
            removed |= list.len() != before;
        }
        removed
    }

    pub fn listeners_on(&self, node: NodeKey) -> &[Listener] {
        self.listeners.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Target followed by its ancestors: the order an event bubbles in.
    pub fn propagation_path(&self, target: NodeKey) -> Vec<NodeKey> {
        let mut path = Vec::new();
        let mut current = self.is_live(target).then_some(target);
        while let Some(k) = current {
            path.push(k);
            current = self.parent(k);
        }
        path
    }

    /// First listener for `event` met while bubbling from `target`.
    pub fn find_listener(
        &self,
        target: NodeKey,
        event: EventType,
    ) -> Option<(NodeKey, ListenerId)> {
        self.propagation_path(target).into_iter().find_map(|node| {
            self.listeners_on(node)
                .iter()
                .find(|l| l.event == event)
                .map(|l| (node, l.id))
        })
    }

    pub fn set_activation<F>(&mut self, node: NodeKey, handler: F) -> Result<(), DomError>
    where
        F: Fn(&mut Document, NodeKey) + 'static,
    {
        self.record(node)?;
        self.activations.insert(node, Rc::new(handler));
        Ok(())
    }

    /// Simulates a click on `node`: logs it, then runs the activation handlers
    /// found on the node and its ancestors, innermost first.
    pub fn click(&mut self, node: NodeKey) -> Result<(), DomError> {
        self.record(node)?;
        self.activation_log.push(node);
        for k in self.propagation_path(node) {
            let Some(handler) = self.activations.get(&k).cloned() else {
                continue;
            };
            // A previous handler may have removed this node.
            if self.is_live(k) {
                handler(self, node);
            }
        }
        Ok(())
    }

    /// Every node clicked so far, in order.
    pub fn activation_log(&self) -> &[NodeKey] {
        &self.activation_log
    }

    pub fn clear_activation_log(&mut self) {
        self.activation_log.clear();
    }
}
