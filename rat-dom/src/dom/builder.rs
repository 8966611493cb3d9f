//! Helpers for building node trees from a tag/attributes/children description.

use super::event::{DomEvent, Handler};
use super::node::Node;
use std::sync::Arc;
use tracing::warn;

/// One entry of an element's attribute description.
pub enum Attr {
    /// Replaces the `class` attribute.
    Class(String),
    /// Merged into the inline style.
    Style(Vec<(String, String)>),
    /// Written as `data-*` attributes.
    Dataset(Vec<(String, String)>),
    /// Event listener; `onClick` and `click` both listen for `click`.
    On(String, Handler),
    /// Boolean attribute: present when true, absent when false.
    Flag(String, bool),
    /// Any other attribute.
    Plain(String, String),
}

impl Attr {
    pub fn class(class: impl Into<String>) -> Self {
        Attr::Class(class.into())
    }

    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attr::Plain(name.into(), value.into())
    }

    pub fn flag(name: impl Into<String>, on: bool) -> Self {
        Attr::Flag(name.into(), on)
    }

    pub fn style<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Attr::Style(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn dataset<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Attr::Dataset(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn on<F>(event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&DomEvent) -> crate::Result<()> + Send + Sync + 'static,
    {
        Attr::On(event.into(), Arc::new(handler))
    }

    fn apply(self, node: &Node) {
        match self {
            Attr::Class(class) => node.set_class_name(class),
            Attr::Style(entries) => {
                for (property, value) in entries {
                    node.set_style(property, value);
                }
            }
            Attr::Dataset(entries) => {
                for (key, value) in entries {
                    node.set_data(&key, value);
                }
            }
            Attr::On(event, handler) => {
                node.add_handler(event_name(&event), handler);
            }
            Attr::Flag(name, on) => {
                if on {
                    node.set_attribute(name, "");
                } else {
                    node.remove_attribute(&name);
                }
            }
            Attr::Plain(name, value) => node.set_attribute(name, value),
        }
    }
}

impl std::fmt::Debug for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attr::Class(c) => f.debug_tuple("Class").field(c).finish(),
            Attr::Style(s) => f.debug_tuple("Style").field(s).finish(),
            Attr::Dataset(d) => f.debug_tuple("Dataset").field(d).finish(),
            Attr::On(e, _) => f.debug_tuple("On").field(e).finish(),
            Attr::Flag(n, on) => f.debug_tuple("Flag").field(n).field(on).finish(),
            Attr::Plain(n, v) => f.debug_tuple("Plain").field(n).field(v).finish(),
        }
    }
}

/// `onClick` -> `click`, `input` -> `input`.
fn event_name(name: &str) -> String {
    match name.strip_prefix("on") {
        Some(rest) if !rest.is_empty() => rest.to_lowercase(),
        _ => name.to_lowercase(),
    }
}

/// One entry of an element's children description.
#[derive(Debug)]
pub enum Child {
    Text(String),
    Node(Node),
    /// Flattened one level into the parent; nested lists are dropped.
    List(Vec<Child>),
    /// Skipped.
    Empty,
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&Node> for Child {
    fn from(node: &Node) -> Self {
        Child::Node(node.clone())
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Child::Empty, Child::Node)
    }
}

impl From<Vec<Node>> for Child {
    fn from(nodes: Vec<Node>) -> Self {
        Child::List(nodes.into_iter().map(Child::Node).collect())
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::List(children)
    }
}

/// Build a `Vec<Child>` from mixed strings, nodes, options and vectors.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        ::std::vec![$($crate::dom::Child::from($child)),*]
    };
}

/// Create an element.
///
/// # Example
/// ```ignore
/// let link = el("a", [Attr::attr("href", "/todo"), Attr::flag("data-link", true)], children!["Try it"]);
/// ```
pub fn el<A, C>(tag: &str, attrs: A, children: C) -> Node
where
    A: IntoIterator<Item = Attr>,
    C: IntoIterator<Item = Child>,
{
    let element = Node::element(tag);
    for attr in attrs {
        attr.apply(&element);
    }
    for child in children {
        append(&element, child, true);
    }
    element
}

fn append(parent: &Node, child: Child, flatten: bool) {
    match child {
        Child::Text(t) => parent.append_child(Node::text(t)),
        Child::Node(n) => parent.append_child(n),
        Child::List(nested) if flatten => {
            for inner in nested {
                append(parent, inner, false);
            }
        }
        Child::List(_) => warn!(tag = ?parent.tag(), "dropping doubly nested child list"),
        Child::Empty => {}
    }
}

/// Fluent alternative to [`el`].
///
/// # Example
/// ```ignore
/// let item = Element::new("li").class("todo-item").data("id", "3").child("Buy milk").build();
/// ```
#[derive(Debug)]
pub struct Element {
    node: Node,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self { node: Node::element(tag) }
    }

    fn with(self, attr: Attr) -> Self {
        attr.apply(&self.node);
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.with(Attr::class(class))
    }

    pub fn attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Attr::attr(name, value))
    }

    pub fn flag(self, name: impl Into<String>, on: bool) -> Self {
        self.with(Attr::flag(name, on))
    }

    pub fn style(self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Attr::style([(property, value)]))
    }

    pub fn data(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Attr::dataset([(key, value)]))
    }

    pub fn on<F>(self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&DomEvent) -> crate::Result<()> + Send + Sync + 'static,
    {
        self.with(Attr::on(event, handler))
    }

    pub fn child(self, child: impl Into<Child>) -> Self {
        append(&self.node, child.into(), true);
        self
    }

    pub fn children<C>(self, children: C) -> Self
    where
        C: IntoIterator<Item = Child>,
    {
        for child in children {
            append(&self.node, child, true);
        }
        self
    }

    pub fn build(self) -> Node {
        self.node
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        element.node
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Node(element.node)
    }
}

/// Create a text node.
pub fn text(content: impl Into<String>) -> Node {
    Node::text(content)
}

/// Create a fragment from strings and nodes; lists are ignored.
pub fn fragment<C>(children: C) -> Node
where
    C: IntoIterator<Item = Child>,
{
    let frag = Node::fragment();
    for child in children {
        match child {
            Child::Text(t) => frag.append_child(Node::text(t)),
            Child::Node(n) => frag.append_child(n),
            Child::List(_) | Child::Empty => {}
        }
    }
    frag
}

/// Remove every child of `node`.
pub fn clear(node: &Node) {
    node.clear();
}

/// Replace the children of `node` with strings and nodes.
pub fn replace<C>(node: &Node, children: C)
where
    C: IntoIterator<Item = Child>,
{
    node.clear();
    node.append_child(fragment(children));
}
