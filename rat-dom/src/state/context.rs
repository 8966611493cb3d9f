//! Explicit update context for batching store notifications.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

type Pending = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ContextInner {
    depth: AtomicUsize,
    pending: Mutex<Vec<Pending>>,
}

/// Shared by every store constructed with it. While a [`UpdateContext::batch`] call
/// is running, those stores queue their notifications here; the queue is flushed in
/// order when the outermost batch returns.
#[derive(Clone, Default)]
pub struct UpdateContext {
    inner: Arc<ContextInner>,
}

impl UpdateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether notifications are currently being deferred.
    pub fn is_batching(&self) -> bool {
        self.inner.depth.load(Ordering::SeqCst) > 0
    }

    /// Run `f` with notifications deferred, then flush them.
    ///
    /// Nested batches flush once, when the outermost one returns. If `f` panics the
    /// queued notifications are dropped and the context goes back to firing
    /// immediately.
    pub fn batch<F, R>(&self, f: F) -> crate::Result<R>
    where
        F: FnOnce() -> R,
    {
        self.inner.depth.fetch_add(1, Ordering::SeqCst);
        let guard = BatchGuard { cx: self };
        let out = f();
        std::mem::forget(guard);

        if self.inner.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.flush()?;
        }
        Ok(out)
    }

    /// Number of queued notifications.
    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub(crate) fn defer(&self, notify: Pending) -> crate::Result<()> {
        let mut pending = self.inner.pending.lock().map_err(|_| crate::Error::LockPoisoned)?;
        pending.push(notify);
        Ok(())
    }

    fn flush(&self) -> crate::Result<()> {
        let queued = {
            let mut pending = self.inner.pending.lock().map_err(|_| crate::Error::LockPoisoned)?;
            std::mem::take(&mut *pending)
        };
        if !queued.is_empty() {
            debug!(count = queued.len(), "flushing batched notifications");
        }
        for notify in queued {
            notify();
        }
        Ok(())
    }
}

impl std::fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateContext")
            .field("depth", &self.inner.depth.load(Ordering::SeqCst))
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Only dropped while unwinding out of a batch.
struct BatchGuard<'a> {
    cx: &'a UpdateContext,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.cx.inner.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Ok(mut pending) = self.cx.inner.pending.lock() {
                pending.clear();
            }
        }
    }
}
