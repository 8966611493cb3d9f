//! Derived signals.

use super::signal::{Signal, Trackable};
use crate::subscription::{Subscription, SubscriptionSet};
use std::sync::Arc;

/// A read-only signal whose value is recomputed from `getter` whenever one of its
/// sources changes.
///
/// Every source change triggers a recomputation; simultaneous changes of several
/// sources are not coalesced. The source links are released when the last clone of
/// the computed value is dropped.
pub struct Computed<T> {
    value: Signal<T>,
    _links: Arc<SubscriptionSet>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _links: Arc::clone(&self._links),
        }
    }
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new<F>(getter: F, sources: &[&dyn Trackable]) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let getter = Arc::new(getter);
        let value = Signal::new(getter());
        let mut links = SubscriptionSet::new();
        for source in sources {
            let value = value.clone();
            let getter = Arc::clone(&getter);
            links.track(source.track(Arc::new(move || {
                value.set(getter());
            })));
        }
        Self {
            value,
            _links: Arc::new(links),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Run `effect` now with the derived value, then after every change of it.
    pub fn effect<F>(&self, effect: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.value.effect(effect)
    }
}

impl<T> Trackable for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn track(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.value.track(on_change)
    }
}
