//! Retained node tree.

use super::event::{DomEvent, Handler};
use crate::subscription::ListenerId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LockResult, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::warn;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
    Fragment,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) style: Vec<(String, String)>,
}

pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    parent: Weak<NodeInner>,
    pub(crate) children: Vec<Node>,
    listeners: Vec<(String, ListenerId, Handler)>,
}

pub(crate) struct NodeInner {
    id: NodeId,
    data: RwLock<NodeData>,
}

// Node locks are only held for plain field access, never across handler calls, so
// a poisoned lock still guards a consistent tree.
fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

/// A shared handle to an element, text node or fragment.
///
/// Cloning the handle does not copy the node; equality is identity.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self(Arc::new(NodeInner {
            id: NodeId::next(),
            data: RwLock::new(NodeData {
                kind,
                parent: Weak::new(),
                children: Vec::new(),
                listeners: Vec::new(),
            }),
        }))
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(ElementData {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    /// A fragment: appending it moves its children into the new parent.
    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, NodeData> {
        recover(self.0.data.read())
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeData> {
        recover(self.0.data.write())
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Lowercase tag name, for elements.
    pub fn tag(&self) -> Option<String> {
        match &self.read().kind {
            NodeKind::Element(e) => Some(e.tag.clone()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.read().kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.read().kind, NodeKind::Text(_))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.read().kind, NodeKind::Fragment)
    }

    // Attributes ----------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.read().kind {
            NodeKind::Element(e) => e
                .attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute, keeping its original position if it already exists.
    /// Ignored on text nodes and fragments.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        if let NodeKind::Element(e) = &mut self.write().kind {
            match e.attributes.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => e.attributes.push((name, value)),
            }
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element(e) = &mut self.write().kind {
            e.attributes.retain(|(k, _)| k != name);
        }
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        match &self.read().kind {
            NodeKind::Element(e) => e.attributes.clone(),
            _ => Vec::new(),
        }
    }

    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }

    pub fn set_class_name(&self, class: impl Into<String>) {
        self.set_attribute("class", class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    pub fn style(&self, property: &str) -> Option<String> {
        match &self.read().kind {
            NodeKind::Element(e) => e
                .style
                .iter()
                .find(|(k, _)| k == property)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn set_style(&self, property: impl Into<String>, value: impl Into<String>) {
        let (property, value) = (property.into(), value.into());
        if let NodeKind::Element(e) = &mut self.write().kind {
            match e.style.iter_mut().find(|(k, _)| *k == property) {
                Some(slot) => slot.1 = value,
                None => e.style.push((property, value)),
            }
        }
    }

    /// Set a `data-*` attribute. `camelCase` keys become `data-camel-case`.
    pub fn set_data(&self, key: &str, value: impl Into<String>) {
        self.set_attribute(data_attribute(key), value);
    }

    pub fn data(&self, key: &str) -> Option<String> {
        self.attribute(&data_attribute(key))
    }

    /// Form control value (the `value` attribute).
    pub fn value(&self) -> String {
        self.attribute("value").unwrap_or_default()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.set_attribute("value", value);
    }

    /// Boolean `checked` attribute.
    pub fn checked(&self) -> bool {
        self.has_attribute("checked")
    }

    pub fn set_checked(&self, checked: bool) {
        if checked {
            self.set_attribute("checked", "");
        } else {
            self.remove_attribute("checked");
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let data = self.read();
        match &data.kind {
            NodeKind::Text(t) => t.clone(),
            _ => data.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Replace the text of a text node, or the children of an element with one text node.
    pub fn set_text(&self, content: impl Into<String>) {
        let content = content.into();
        {
            let mut data = self.write();
            if let NodeKind::Text(t) = &mut data.kind {
                *t = content;
                return;
            }
        }
        self.replace_children([Node::text(content)]);
    }

    // Tree ----------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.read().parent.upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.read().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.read().children.len()
    }

    /// Append `child`, detaching it from its current parent first. Appending a
    /// fragment moves the fragment's children instead.
    ///
    /// A node cannot become its own descendant: appending this node or one of its
    /// ancestors is ignored.
    pub fn append_child(&self, child: Node) {
        if child.contains(self) {
            warn!(parent = self.id().as_u64(), child = child.id().as_u64(), "refusing to append an ancestor");
            return;
        }
        if child.is_fragment() {
            let moved = std::mem::take(&mut child.write().children);
            for grandchild in moved {
                grandchild.write().parent = Weak::new();
                self.append_child(grandchild);
            }
            return;
        }
        child.remove();
        child.write().parent = Arc::downgrade(&self.0);
        self.write().children.push(child);
    }

    /// Detach this node from its parent.
    pub fn remove(&self) {
        let parent = {
            let mut data = self.write();
            std::mem::replace(&mut data.parent, Weak::new())
        };
        if let Some(parent) = parent.upgrade() {
            recover(parent.data.write())
                .children
                .retain(|c| !Arc::ptr_eq(&c.0, &self.0));
        }
    }

    /// Remove every child.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut self.write().children);
        for child in removed {
            child.write().parent = Weak::new();
        }
    }

    pub fn replace_children<I>(&self, children: I)
    where
        I: IntoIterator<Item = Node>,
    {
        self.clear();
        for child in children {
            self.append_child(child);
        }
    }

    /// Put `replacement` where this node is in its parent. Returns false if this node
    /// has no parent.
    pub fn replace_with(&self, replacement: Node) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        if replacement == *self {
            return true;
        }
        if replacement.contains(&parent) {
            warn!(node = replacement.id().as_u64(), "refusing to replace with an ancestor");
            return false;
        }
        replacement.remove();
        {
            let mut data = parent.write();
            let Some(index) = data.children.iter().position(|c| c == self) else {
                return false;
            };
            data.children[index] = replacement.clone();
        }
        self.write().parent = Weak::new();
        replacement.write().parent = Arc::downgrade(&parent.0);
        true
    }

    /// This node or the nearest ancestor matching `predicate`.
    pub fn closest<P>(&self, predicate: P) -> Option<Node>
    where
        P: Fn(&Node) -> bool,
    {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if predicate(&node) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        other.closest(|n| n == self).is_some()
    }

    /// Depth-first, document-order search of descendants (excluding this node).
    pub fn find_all<P>(&self, predicate: P) -> Vec<Node>
    where
        P: Fn(&Node) -> bool,
    {
        fn walk<P: Fn(&Node) -> bool>(node: &Node, predicate: &P, out: &mut Vec<Node>) {
            for child in node.children() {
                if predicate(&child) {
                    out.push(child.clone());
                }
                walk(&child, predicate, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &predicate, &mut out);
        out
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<Node> {
        self.find_all(|n| n.tag().as_deref() == Some(tag))
    }

    // Listeners -----------------------------------------------------------

    pub fn add_event_listener<F>(&self, event: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&DomEvent) -> crate::Result<()> + Send + Sync + 'static,
    {
        self.add_handler(event.into(), Arc::new(handler))
    }

    pub(crate) fn add_handler(&self, event: String, handler: Handler) -> ListenerId {
        let id = ListenerId::next();
        self.write().listeners.push((event, id, handler));
        id
    }

    pub fn remove_event_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut data = self.write();
        let before = data.listeners.len();
        data.listeners.retain(|(name, l, _)| !(name == event && *l == id));
        data.listeners.len() != before
    }

    /// Snapshot of the handlers registered for `event`, in registration order.
    pub(crate) fn handlers(&self, event: &str) -> Vec<Handler> {
        self.read()
            .listeners
            .iter()
            .filter(|(name, _, _)| name == event)
            .map(|(_, _, h)| Arc::clone(h))
            .collect()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.read().listeners.iter().filter(|(name, _, _)| name == event).count()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.read().kind {
            NodeKind::Element(e) => write!(f, "<{}#{}>", e.tag, self.id().as_u64()),
            NodeKind::Text(t) => write!(f, "{t:?}"),
            NodeKind::Fragment => write!(f, "#fragment{}", self.id().as_u64()),
        }
    }
}

fn data_attribute(key: &str) -> String {
    let mut name = String::from("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}
