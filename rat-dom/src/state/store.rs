//! Key-value stores with per-write change notification.

use super::context::UpdateContext;
use crate::subscription::{ListenerId, Subscription};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::debug;

/// A state record whose fields can be addressed by key.
///
/// Usually generated with [`define_record!`](crate::define_record).
pub trait Record: Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;
    type Value: Clone + Debug + Send + Sync + 'static;

    /// The field a value belongs to.
    fn key_of(value: &Self::Value) -> Self::Key;

    /// Read one field.
    fn get(&self, key: Self::Key) -> Self::Value;

    /// Overwrite the field `value` belongs to, returning its previous value.
    fn replace(&mut self, value: Self::Value) -> Self::Value;
}

/// One observed write.
pub struct Change<S: Record> {
    pub key: S::Key,
    pub value: S::Value,
    pub old: S::Value,
}

impl<S: Record> Clone for Change<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            value: self.value.clone(),
            old: self.old.clone(),
        }
    }
}

impl<S: Record> Debug for Change<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Change")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("old", &self.old)
            .finish()
    }
}

type Listener<S> = Arc<dyn Fn(&Store<S>, &Change<S>) + Send + Sync>;

struct StoreInner<S: Record> {
    state: RwLock<S>,
    listeners: Mutex<Vec<(ListenerId, Listener<S>)>>,
    context: UpdateContext,
}

/// Observable state record.
///
/// Every write goes through [`Store::set`], which mutates and then synchronously
/// notifies every listener in subscription order. Listeners receive the store itself
/// (so they see live state), the changed key, and the new and previous values.
pub struct Store<S: Record> {
    inner: Arc<StoreInner<S>>,
}

impl<S: Record> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Record> Store<S> {
    /// Create a store with its own private update context.
    pub fn new(initial: S) -> Self {
        Self::with_context(initial, &UpdateContext::new())
    }

    /// Create a store that defers notifications while `cx` is batching.
    pub fn with_context(initial: S, cx: &UpdateContext) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                context: cx.clone(),
            }),
        }
    }

    pub fn context(&self) -> &UpdateContext {
        &self.inner.context
    }

    /// Read the state using a closure.
    pub fn read<F, R>(&self, f: F) -> crate::Result<R>
    where
        F: FnOnce(&S) -> R,
    {
        let guard = self.inner.state.read().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(f(&*guard))
    }

    /// Read a single field.
    pub fn get(&self, key: S::Key) -> crate::Result<S::Value> {
        self.read(|s| s.get(key))
    }

    /// Write one field and notify listeners. Returns the previous value.
    ///
    /// Writing a value equal to the current one still notifies. A panicking
    /// listener aborts the rest of the notification chain for this write.
    pub fn set(&self, value: S::Value) -> crate::Result<S::Value> {
        let key = S::key_of(&value);
        let old = {
            let mut guard = self.inner.state.write().map_err(|_| crate::Error::LockPoisoned)?;
            guard.replace(value.clone())
        };
        let change = Change::<S> {
            key,
            value,
            old: old.clone(),
        };

        let listeners = self.snapshot()?;
        if self.inner.context.is_batching() {
            debug!(?key, listeners = listeners.len(), "queueing store notification");
            for listener in listeners {
                let store = self.clone();
                let change = change.clone();
                self.inner
                    .context
                    .defer(Box::new(move || listener(&store, &change)))?;
            }
        } else {
            for listener in &listeners {
                listener(self, &change);
            }
        }
        Ok(old)
    }

    /// Read-modify-write of the field `key`.
    pub fn update<F>(&self, key: S::Key, f: F) -> crate::Result<S::Value>
    where
        F: FnOnce(S::Value) -> S::Value,
    {
        let current = self.get(key)?;
        self.set(f(current))
    }

    /// Add a listener. The returned handle removes it.
    pub fn subscribe<F>(&self, listener: F) -> crate::Result<Subscription>
    where
        F: Fn(&Store<S>, &Change<S>) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        {
            let mut listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
            listeners.push((id, Arc::new(listener)));
        }
        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut listeners) = inner.listeners.lock() {
                    listeners.retain(|(listener, _)| *listener != id);
                }
            }
        }))
    }

    pub fn listener_count(&self) -> crate::Result<usize> {
        let listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(listeners.len())
    }

    fn snapshot(&self) -> crate::Result<Vec<Listener<S>>> {
        let listeners = self.inner.listeners.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
    }
}

/// Define a [`Record`] struct together with its key and value enums.
///
/// # Example
/// ```ignore
/// use rat_dom::define_record;
///
/// define_record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Counter {
///         count: i64,
///         label: String,
///     }
/// }
///
/// // Generates:
/// // - `pub struct Counter { pub count: i64, pub label: String }`
/// // - `pub enum CounterKey { Count, Label }`
/// // - `pub enum CounterValue { Count(i64), Label(String) }`
/// // - `impl Record for Counter`
///
/// let store = Store::new(Counter::default());
/// store.set(CounterValue::Count(3))?;
/// ```
#[macro_export]
macro_rules! define_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::paste::paste! {
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$fmeta])*
                    pub $field: $ty
                ),*
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            $vis enum [<$name Key>] {
                $([<$field:camel>]),*
            }

            impl ::std::fmt::Display for [<$name Key>] {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    match self {
                        $(Self::[<$field:camel>] => f.write_str(stringify!($field))),*
                    }
                }
            }

            #[derive(Debug, Clone)]
            $vis enum [<$name Value>] {
                $([<$field:camel>]($ty)),*
            }

            impl $crate::state::Record for $name {
                type Key = [<$name Key>];
                type Value = [<$name Value>];

                fn key_of(value: &Self::Value) -> Self::Key {
                    match value {
                        $([<$name Value>]::[<$field:camel>](_) => [<$name Key>]::[<$field:camel>]),*
                    }
                }

                fn get(&self, key: Self::Key) -> Self::Value {
                    match key {
                        $([<$name Key>]::[<$field:camel>] => {
                            [<$name Value>]::[<$field:camel>](::std::clone::Clone::clone(&self.$field))
                        }),*
                    }
                }

                fn replace(&mut self, value: Self::Value) -> Self::Value {
                    match value {
                        $([<$name Value>]::[<$field:camel>](v) => {
                            [<$name Value>]::[<$field:camel>](::std::mem::replace(&mut self.$field, v))
                        }),*
                    }
                }
            }
        }
    };
}
