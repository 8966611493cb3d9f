//! Subscription handles shared by the event bus, stores, signals and the document.
//!
//! Provides `Subscription` for detaching a single listener and `SubscriptionSet` for
//! detaching several listeners together (e.g., when a view is cleaned up).

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique listener IDs.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one registered listener, callback or effect.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(NonZeroU64);

impl ListenerId {
    /// Generate a new unique ListenerId.
    ///
    /// # Panics
    /// Panics if more than 2^64-1 listeners are registered.
    pub(crate) fn next() -> Self {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        // We start at 1 and only increment, so it's never zero.
        Self(NonZeroU64::new(id).unwrap_or_else(|| {
            panic!("ListenerId overflow: registered more than 2^64-1 listeners")
        }))
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Detach = Box<dyn FnOnce() + Send + Sync>;

/// A handle to a registered listener that can be detached.
///
/// Dropping a `Subscription` does NOT detach the listener; the framework never
/// removes a subscriber on its own. Call [`Subscription::unsubscribe`] or hand the
/// handle to a [`SubscriptionSet`].
pub struct Subscription {
    id: ListenerId,
    detach: Option<Detach>,
}

impl Subscription {
    pub(crate) fn new<F>(id: ListenerId, detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    /// The id of the listener this handle detaches.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener from whatever it was registered on.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A collection of subscriptions that are detached together.
///
/// # Example
/// ```ignore
/// let mut subs = SubscriptionSet::new();
/// subs.track(store.subscribe(|_, change| println!("{change:?}"))?);
/// subs.track(bus.on("router:change", |_| {})?);
/// // later, in the view's cleanup:
/// subs.unsubscribe_all();
/// ```
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    handles: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create a new empty SubscriptionSet.
    pub fn new() -> Self {
        Self { handles: Vec::new() }
    }

    /// Track a subscription. It is detached when `unsubscribe_all` is called.
    pub fn track(&mut self, handle: Subscription) {
        self.handles.push(handle);
    }

    /// Detach all tracked subscriptions.
    pub fn unsubscribe_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.unsubscribe();
        }
    }

    /// Number of tracked subscriptions.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        // The owner of the set is going away, so are its listeners
        self.unsubscribe_all();
    }
}
