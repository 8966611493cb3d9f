//! Route table entries and the views they produce.

use crate::dom::Node;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Path of the fallback route.
pub const WILDCARD: &str = "*";

/// Teardown callback returned alongside a view.
pub type Cleanup = Box<dyn FnOnce() + Send + Sync>;

/// What a route factory produces: a bare node, or a node plus its teardown.
pub enum View {
    Node(Node),
    WithCleanup { el: Node, cleanup: Cleanup },
}

impl View {
    pub fn with_cleanup<F>(el: Node, cleanup: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        View::WithCleanup {
            el,
            cleanup: Box::new(cleanup),
        }
    }

    pub fn el(&self) -> &Node {
        match self {
            View::Node(node) => node,
            View::WithCleanup { el, .. } => el,
        }
    }

    pub fn into_parts(self) -> (Node, Option<Cleanup>) {
        match self {
            View::Node(node) => (node, None),
            View::WithCleanup { el, cleanup } => (el, Some(cleanup)),
        }
    }
}

impl From<Node> for View {
    fn from(node: Node) -> Self {
        View::Node(node)
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Node(node) => f.debug_tuple("Node").field(node).finish(),
            View::WithCleanup { el, .. } => f.debug_struct("WithCleanup").field("el", el).finish_non_exhaustive(),
        }
    }
}

pub type ViewFuture = BoxFuture<'static, crate::Result<View>>;
pub type ViewFactory = Arc<dyn Fn() -> ViewFuture + Send + Sync>;

/// A static `{path, factory}` entry. Paths match exactly and case-sensitively;
/// `"*"` is the fallback.
#[derive(Clone)]
pub struct Route {
    path: String,
    factory: ViewFactory,
}

impl Route {
    /// A route whose view loads asynchronously.
    pub fn new<F, Fut>(path: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<View>> + Send + 'static,
    {
        Self {
            path: path.into(),
            factory: Arc::new(move || Box::pin(factory())),
        }
    }

    /// A route whose view is built synchronously.
    pub fn page<F, V>(path: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> crate::Result<V> + Send + Sync + 'static,
        V: Into<View>,
    {
        Self::new(path, move || {
            let view: crate::Result<View> = factory().map(Into::into);
            async move { view }
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_wildcard(&self) -> bool {
        self.path == WILDCARD
    }

    pub(crate) fn load(&self) -> ViewFuture {
        (self.factory)()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Payload of the `router:change` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    /// The path that was resolved.
    pub path: String,
    /// The path of the route that matched it (`"*"` for the fallback).
    pub route: String,
}

/// Build a route table.
///
/// # Example
/// ```ignore
/// use rat_dom::routes;
///
/// let table = routes! {
///     "/" => || home_page(),
///     "/todo" => || todo_list(),
///     "*" => || not_found(),
/// };
/// ```
#[macro_export]
macro_rules! routes {
    ($($path:expr => $factory:expr),* $(,)?) => {
        ::std::vec![$($crate::router::Route::page($path, $factory)),*]
    };
}
