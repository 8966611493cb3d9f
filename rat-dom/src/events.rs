//! Named-channel publish/subscribe bus.
//!
//! Listeners are grouped by event name and invoked synchronously, in the order they
//! subscribed. Callbacks run outside the registry lock, so a callback may subscribe,
//! unsubscribe or emit again without deadlocking.

use crate::subscription::{ListenerId, Subscription};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

/// Well-known event names.
pub mod names {
    pub const TOAST_SHOW: &str = "toast:show";
    pub const TOAST_HIDE: &str = "toast:hide";
    pub const MODAL_OPEN: &str = "modal:open";
    pub const MODAL_CLOSE: &str = "modal:close";
    pub const ROUTER_CHANGE: &str = "router:change";
    pub const STATE_UPDATE: &str = "state:update";
}

type Callback<P> = Arc<dyn Fn(&P) + Send + Sync>;
type Registry<P> = HashMap<String, Vec<(ListenerId, Callback<P>)>>;

/// Publish/subscribe registry carrying payloads of type `P`.
pub struct EventBus<P> {
    events: Arc<Mutex<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<P: 'static> EventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`. The returned handle removes it again.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> crate::Result<Subscription>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.insert(event.into(), id, Arc::new(callback))
    }

    /// Register `callback` for `event`, removing it after its first invocation.
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> crate::Result<Subscription>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let event = event.into();
        let id = ListenerId::next();
        let fired = AtomicBool::new(false);
        let registry = Arc::downgrade(&self.events);
        let name = event.clone();
        let wrapper = move |data: &P| {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            // Detach first so a panicking callback is not left registered.
            detach(&registry, &name, id);
            callback(data);
        };
        self.insert(event, id, Arc::new(wrapper))
    }

    /// Remove the listener `id` from `event`. Returns whether anything was removed.
    pub fn off(&self, event: &str, id: ListenerId) -> crate::Result<bool> {
        let mut events = self.events.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(remove(&mut events, event, id))
    }

    /// Invoke every current listener of `event` with `data`.
    ///
    /// Returns how many listeners were invoked. A panicking listener is not caught;
    /// listeners after it are skipped.
    pub fn emit(&self, event: &str, data: &P) -> crate::Result<usize> {
        let listeners: Vec<Callback<P>> = {
            let events = self.events.lock().map_err(|_| crate::Error::LockPoisoned)?;
            match events.get(event) {
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => return Ok(0),
            }
        };
        debug!(event, listeners = listeners.len(), "emit");
        for callback in &listeners {
            callback(data);
        }
        Ok(listeners.len())
    }

    /// Drop every registration.
    pub fn clear(&self) -> crate::Result<()> {
        let mut events = self.events.lock().map_err(|_| crate::Error::LockPoisoned)?;
        events.clear();
        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> crate::Result<usize> {
        let events = self.events.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(events.get(event).map_or(0, Vec::len))
    }

    fn insert(&self, event: String, id: ListenerId, callback: Callback<P>) -> crate::Result<Subscription> {
        {
            let mut events = self.events.lock().map_err(|_| crate::Error::LockPoisoned)?;
            events.entry(event.clone()).or_default().push((id, callback));
        }
        debug!(event = event.as_str(), %id, "listener added");
        let registry = Arc::downgrade(&self.events);
        Ok(Subscription::new(id, move || detach(&registry, &event, id)))
    }
}

fn remove<P>(events: &mut Registry<P>, event: &str, id: ListenerId) -> bool {
    let Some(list) = events.get_mut(event) else {
        return false;
    };
    let before = list.len();
    list.retain(|(listener, _)| *listener != id);
    let removed = list.len() != before;
    if list.is_empty() {
        events.remove(event);
    }
    removed
}

fn detach<P>(registry: &Weak<Mutex<Registry<P>>>, event: &str, id: ListenerId) {
    if let Some(events) = registry.upgrade() {
        if let Ok(mut events) = events.lock() {
            remove(&mut events, event, id);
        }
    }
}
