//! Single-value reactive cells.

use crate::subscription::{ListenerId, Subscription};
use std::sync::{Arc, LockResult, Mutex, PoisonError, RwLock};

type Effect<T> = Arc<dyn Fn(&T) + Send + Sync>;

// Effects never run while a cell lock is held, so a poisoned lock still guards a
// consistent value.
fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

struct SignalInner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<(ListenerId, Effect<T>)>>,
}

/// A mutable value cell that notifies its effects when the value changes.
///
/// `set` compares with `PartialEq`: writing a value equal to the current one is a
/// no-op, replacing it with an unequal one runs every effect with the new value.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(initial),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        recover(self.inner.value.read()).clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let value = recover(self.inner.value.read());
        f(&value)
    }

    /// Store `value` and run the effects if it differs from the current value.
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = recover(self.inner.value.write());
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        let effects: Vec<Effect<T>> = recover(self.inner.subscribers.lock())
            .iter()
            .map(|(_, e)| Arc::clone(e))
            .collect();
        for effect in &effects {
            effect(&value);
        }
        true
    }

    /// Compute a new value from the current one and `set` it.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with(f);
        self.set(next)
    }

    /// Run `effect` now with the current value, then again after every change.
    pub fn effect<F>(&self, effect: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        let effect: Effect<T> = Arc::new(effect);
        recover(self.inner.subscribers.lock()).push((id, Arc::clone(&effect)));
        effect(&self.get());

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                recover(inner.subscribers.lock()).retain(|(e, _)| *e != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        recover(self.inner.subscribers.lock()).len()
    }

    /// A handle that can only read and observe.
    pub fn reader(&self) -> ReadSignal<T> {
        ReadSignal(self.clone())
    }

    /// A handle that can only write.
    pub fn writer(&self) -> WriteSignal<T> {
        WriteSignal(self.clone())
    }
}

impl<T> std::fmt::Debug for Signal<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal")
            .field(&*recover(self.inner.value.read()))
            .finish()
    }
}

/// Read half of a signal: `get` and `effect`.
#[derive(Clone)]
pub struct ReadSignal<T>(Signal<T>);

impl<T> ReadSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn effect<F>(&self, effect: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.effect(effect)
    }
}

/// Write half of a signal.
#[derive(Clone)]
pub struct WriteSignal<T>(Signal<T>);

impl<T> WriteSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn set(&self, value: T) -> bool {
        self.0.set(value)
    }
}

/// Split a fresh signal into its read and write halves.
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let signal = Signal::new(initial);
    (signal.reader(), signal.writer())
}

/// Anything a [`Computed`](super::Computed) can depend on.
pub trait Trackable: Send + Sync {
    /// Call `on_change` now and after every change of this source.
    fn track(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

impl<T> Trackable for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn track(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.effect(move |_| on_change())
    }
}

impl<T> Trackable for ReadSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn track(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.0.track(on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting<T: Send + Sync + 'static>(calls: &Arc<AtomicUsize>) -> impl Fn(&T) + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_effect_runs_eagerly_with_current_value() {
        let signal = Signal::new(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        signal.effect(move |v| sink.lock().unwrap().push(*v));
        assert_eq!(*seen.lock().unwrap(), vec![3]);

        signal.set(4);
        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_with_borrows_and_update_derives() {
        let signal = Signal::new(vec![1, 2, 3]);
        assert_eq!(signal.with(|v| v.len()), 3);
        assert!(signal.update(|v| v.iter().map(|n| n * 2).collect()));
        assert_eq!(signal.with(|v| v.iter().sum::<i32>()), 12);
    }

    #[test]
    fn test_same_value_twice_fires_once() {
        let signal = Signal::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        signal.effect(counting(&calls));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(signal.set(7));
        assert!(!signal.set(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replacing_collection_with_unequal_value_notifies() {
        let signal = Signal::new(vec![1, 2]);
        let calls = Arc::new(AtomicUsize::new(0));
        signal.effect(counting(&calls));

        signal.set(vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        signal.update(|v| v.iter().chain(&[3]).copied().collect());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(signal.get(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribed_effect_stops() {
        let signal = Signal::new("a".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let sub = signal.effect(counting(&calls));
        sub.unsubscribe();
        signal.set("b".to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_create_signal_halves_share_value() {
        let (read, write) = create_signal(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        read.effect(move |v| sink.lock().unwrap().push(*v));
        write.set(2);
        assert_eq!(read.get(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_effect_may_write_other_signal() {
        let source = Signal::new(1);
        let mirror = Signal::new(0);
        let target = mirror.clone();
        source.effect(move |v| {
            target.set(v * 10);
        });
        source.set(2);
        assert_eq!(mirror.get(), 20);
    }

    proptest! {
        #[test]
        fn prop_effects_fire_iff_value_changes(writes in proptest::collection::vec(0u8..4, 0..50)) {
            let signal = Signal::new(0u8);
            let calls = Arc::new(AtomicUsize::new(0));
            signal.effect(counting(&calls));

            let mut expected = 1;
            let mut current = 0u8;
            for w in &writes {
                if *w != current {
                    expected += 1;
                    current = *w;
                }
                signal.set(*w);
            }
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            prop_assert_eq!(signal.get(), current);
        }
    }
}
