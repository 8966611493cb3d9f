//! Node events and the document that dispatches them.

use super::node::Node;
use crate::subscription::{ListenerId, Subscription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// An event listener attached to a node or to the document.
pub type Handler = Arc<dyn Fn(&DomEvent) -> crate::Result<()> + Send + Sync>;

/// A dispatched event.
pub struct DomEvent {
    kind: String,
    target: Node,
    key: Option<String>,
    current_target: Mutex<Option<Node>>,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>, target: Node) -> Self {
        Self {
            kind: kind.into(),
            target,
            key: None,
            current_target: Mutex::new(None),
            default_prevented: AtomicBool::new(false),
            propagation_stopped: AtomicBool::new(false),
        }
    }

    /// Attach a key name (`"Escape"`, `"Enter"`, ...) for keyboard events.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> &Node {
        &self.target
    }

    /// The node whose listener is currently running; `None` for document listeners.
    pub fn current_target(&self) -> Option<Node> {
        self.current_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    fn set_current_target(&self, node: Option<Node>) {
        *self
            .current_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = node;
    }
}

impl std::fmt::Debug for DomEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomEvent")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("key", &self.key)
            .field("default_prevented", &self.default_prevented())
            .finish()
    }
}

struct DocumentInner {
    body: Node,
    root: Node,
    listeners: Mutex<Vec<(String, ListenerId, Handler)>>,
}

/// Owner of the node tree and of document-level listeners.
///
/// A fresh document holds `<body><div id="app"></div></body>`; `root()` is the
/// `#app` element views are mounted into.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let body = Node::element("body");
        let root = Node::element("div");
        root.set_attribute("id", "app");
        body.append_child(root.clone());
        Self {
            inner: Arc::new(DocumentInner {
                body,
                root,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn body(&self) -> &Node {
        &self.inner.body
    }

    /// The `#app` mount point.
    pub fn root(&self) -> &Node {
        &self.inner.root
    }

    /// Listen for `event` after it has bubbled through the node tree.
    pub fn add_event_listener<F>(&self, event: impl Into<String>, handler: F) -> crate::Result<Subscription>
    where
        F: Fn(&DomEvent) -> crate::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        {
            let mut listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
            listeners.push((event.into(), id, Arc::new(handler)));
        }
        let weak = Arc::downgrade(&self.inner);
        Ok(Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut listeners) = inner.listeners.lock() {
                    listeners.retain(|(_, l, _)| *l != id);
                }
            }
        }))
    }

    pub fn listener_count(&self, event: &str) -> crate::Result<usize> {
        let listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(listeners.iter().filter(|(name, _, _)| name == event).count())
    }

    /// Dispatch `event` at its target, bubbling through ancestors and then to
    /// document listeners.
    ///
    /// The first handler error stops dispatch and is returned.
    pub fn dispatch(&self, event: DomEvent) -> crate::Result<DomEvent> {
        trace!(kind = event.kind(), target = ?event.target(), "dispatch");
        let mut current = Some(event.target().clone());
        while let Some(node) = current {
            let handlers = node.handlers(event.kind());
            if !handlers.is_empty() {
                event.set_current_target(Some(node.clone()));
                for handler in handlers {
                    handler(&event)?;
                }
            }
            if event.propagation_stopped.load(Ordering::SeqCst) {
                event.set_current_target(None);
                return Ok(event);
            }
            current = node.parent();
        }
        event.set_current_target(None);
        self.notify_document(&event)?;
        Ok(event)
    }

    /// Deliver `event` to document listeners only (keyboard shortcuts and the like).
    pub fn dispatch_global(&self, event: DomEvent) -> crate::Result<DomEvent> {
        self.notify_document(&event)?;
        Ok(event)
    }

    fn notify_document(&self, event: &DomEvent) -> crate::Result<()> {
        let handlers: Vec<Handler> = {
            let listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
            listeners
                .iter()
                .filter(|(name, _, _)| name == event.kind())
                .map(|(_, _, h)| Arc::clone(h))
                .collect()
        };
        for handler in handlers {
            handler(event)?;
        }
        Ok(())
    }
}
