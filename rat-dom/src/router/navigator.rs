//! Path-based router: resolves the current history entry to a view and mounts it.

use super::route::{Cleanup, Route, RouteChange, View};
use crate::dom::{Document, DomEvent, Node};
use crate::events::{names, EventBus};
use crate::platform::History;
use crate::subscription::Subscription;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Attribute that marks anchors handled by the router instead of the host.
pub const LINK_ATTRIBUTE: &str = "data-link";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    /// At least one view factory is still loading.
    Resolving,
}

struct RouterInner<P> {
    routes: Vec<Route>,
    mount: Node,
    history: Arc<dyn History>,
    bus: EventBus<P>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    cleanup: Mutex<Option<Cleanup>>,
    current: Mutex<Option<RouteChange>>,
}

/// Matches paths against a static route table and mounts the resulting views.
///
/// Each `resolve` takes a generation token before awaiting the view factory. When
/// navigations overlap, only the most recently requested one mounts its view; a
/// view that finishes loading after a newer request started is discarded and its
/// cleanup runs.
pub struct Router<P> {
    inner: Arc<RouterInner<P>>,
}

impl<P> Clone for Router<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Router<P>
where
    P: From<RouteChange> + Send + Sync + 'static,
{
    /// Create a router mounting into `mount`. At most one `"*"` route is allowed.
    pub fn new(routes: Vec<Route>, mount: Node, history: Arc<dyn History>, bus: EventBus<P>) -> crate::Result<Self> {
        let wildcards = routes.iter().filter(|r| r.is_wildcard()).count();
        if wildcards > 1 {
            return Err(crate::Error::DuplicateWildcard { count: wildcards });
        }
        Ok(Self {
            inner: Arc::new(RouterInner {
                routes,
                mount,
                history,
                bus,
                generation: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                cleanup: Mutex::new(None),
                current: Mutex::new(None),
            }),
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.inner.routes
    }

    pub fn mount(&self) -> &Node {
        &self.inner.mount
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.inner.history
    }

    pub fn bus(&self) -> &EventBus<P> {
        &self.inner.bus
    }

    pub fn state(&self) -> RouterState {
        if self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            RouterState::Resolving
        } else {
            RouterState::Idle
        }
    }

    /// The last navigation that mounted a view.
    pub fn current(&self) -> Option<RouteChange> {
        self.inner.current.lock().ok().and_then(|c| c.clone())
    }

    /// Exact match first, then the wildcard route.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.inner
            .routes
            .iter()
            .find(|r| r.path() == path)
            .or_else(|| self.inner.routes.iter().find(|r| r.is_wildcard()))
    }

    /// Push `path` onto the history and resolve it.
    pub async fn navigate(&self, path: &str) -> crate::Result<Option<RouteChange>> {
        info!(path, "navigate");
        self.inner.history.push_state(path);
        self.resolve().await
    }

    /// Go back one history entry and resolve it, like the browser's back button.
    pub async fn pop_state(&self) -> crate::Result<Option<RouteChange>> {
        if !self.inner.history.back() {
            debug!("no history entry to go back to");
            return Ok(None);
        }
        self.resolve().await
    }

    /// Go forward one history entry and resolve it.
    pub async fn forward(&self) -> crate::Result<Option<RouteChange>> {
        if !self.inner.history.forward() {
            return Ok(None);
        }
        self.resolve().await
    }

    /// Mount the view for the current history entry.
    ///
    /// Returns `Ok(None)` without touching the mount point when no route matches,
    /// and when a newer navigation superseded this one while its view was loading.
    pub async fn resolve(&self) -> crate::Result<Option<RouteChange>> {
        let path = self.inner.history.pathname();
        let Some(route) = self.match_path(&path).cloned() else {
            warn!(path = path.as_str(), "no route matches");
            return Ok(None);
        };
        let token = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(path = path.as_str(), route = route.path(), token, "resolving");

        self.teardown()?;

        let loaded = {
            let _loading = InFlight::enter(&self.inner.in_flight);
            route.load().await
        };
        let view = loaded?;

        if self.inner.generation.load(Ordering::SeqCst) != token {
            debug!(path = path.as_str(), token, "discarding superseded view");
            if let (_, Some(cleanup)) = view.into_parts() {
                cleanup();
            }
            return Ok(None);
        }

        self.mount_view(view)?;
        let change = RouteChange {
            path,
            route: route.path().to_string(),
        };
        *self.inner.current.lock().map_err(|_| crate::Error::LockPoisoned)? = Some(change.clone());
        self.inner.bus.emit(names::ROUTER_CHANGE, &P::from(change.clone()))?;
        Ok(Some(change))
    }

    /// If the event came from inside a `data-link` anchor, cancel the host
    /// navigation and return the anchor's `href`.
    pub fn intercept_link_click(&self, event: &DomEvent) -> Option<String> {
        let link = event.target().closest(|n| n.has_attribute(LINK_ATTRIBUTE))?;
        event.prevent_default();
        link.attribute("href")
    }

    /// Route clicks on `data-link` anchors anywhere in `document` through this router.
    ///
    /// Navigation is spawned on the current tokio runtime.
    pub fn install(&self, document: &Document) -> crate::Result<Subscription> {
        let router = self.clone();
        document.add_event_listener("click", move |event| {
            let Some(href) = router.intercept_link_click(event) else {
                return Ok(());
            };
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let router = router.clone();
                    handle.spawn(async move {
                        if let Err(e) = router.navigate(&href).await {
                            error!(error = %e, href = href.as_str(), "navigation failed");
                        }
                    });
                }
                Err(_) => warn!(href = href.as_str(), "no runtime to navigate on"),
            }
            Ok(())
        })
    }

    fn teardown(&self) -> crate::Result<()> {
        let previous = self.inner.cleanup.lock().map_err(|_| crate::Error::LockPoisoned)?.take();
        if let Some(cleanup) = previous {
            cleanup();
        }
        self.inner.mount.clear();
        Ok(())
    }

    fn mount_view(&self, view: View) -> crate::Result<()> {
        let (el, cleanup) = view.into_parts();
        // A superseded load may have been torn down in between; start clean.
        self.inner.mount.clear();
        self.inner.mount.append_child(el);
        let previous = {
            let mut slot = self.inner.cleanup.lock().map_err(|_| crate::Error::LockPoisoned)?;
            std::mem::replace(&mut *slot, cleanup)
        };
        if let Some(cleanup) = previous {
            cleanup();
        }
        Ok(())
    }
}

/// Counts one loading view for as long as it lives, including when the `resolve`
/// future is dropped mid-load.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
