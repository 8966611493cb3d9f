//! Navigation history.

use std::sync::{Mutex, PoisonError};

/// Session history the router navigates through.
pub trait History: Send + Sync {
    /// Path of the current entry.
    fn pathname(&self) -> String;

    /// Push a new entry and make it current. Forward entries are discarded.
    fn push_state(&self, path: &str);

    /// Step back one entry. Returns false when already at the first entry.
    fn back(&self) -> bool;

    /// Step forward one entry. Returns false when there is nothing ahead.
    fn forward(&self) -> bool;
}

#[derive(Debug, Clone)]
struct Entries {
    current: String,
    back: Vec<String>,
    forward: Vec<String>,
}

/// In-memory session history.
///
/// # Example
/// ```ignore
/// let history = MemoryHistory::new("/");
/// history.push_state("/todo");
/// assert_eq!(history.pathname(), "/todo");
/// history.back();
/// assert_eq!(history.pathname(), "/");
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                current: initial.into(),
                back: Vec::new(),
                forward: Vec::new(),
            }),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if there's history to go back to.
    pub fn can_go_back(&self) -> bool {
        !self.entries().back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.entries().forward.is_empty()
    }

    /// Number of entries behind the current one.
    pub fn history_len(&self) -> usize {
        self.entries().back.len()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn pathname(&self) -> String {
        self.entries().current.clone()
    }

    fn push_state(&self, path: &str) {
        let mut entries = self.entries();
        let previous = std::mem::replace(&mut entries.current, path.to_string());
        entries.back.push(previous);
        entries.forward.clear();
    }

    fn back(&self) -> bool {
        let mut entries = self.entries();
        if let Some(prev) = entries.back.pop() {
            let current = std::mem::replace(&mut entries.current, prev);
            entries.forward.push(current);
            true
        } else {
            false
        }
    }

    fn forward(&self) -> bool {
        let mut entries = self.entries();
        if let Some(next) = entries.forward.pop() {
            let current = std::mem::replace(&mut entries.current, next);
            entries.back.push(current);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_navigation() {
        let history = MemoryHistory::new("/");

        assert_eq!(history.pathname(), "/");
        assert!(!history.can_go_back());

        history.push_state("/todo");
        assert_eq!(history.pathname(), "/todo");
        assert!(history.can_go_back());

        history.push_state("/about");
        assert_eq!(history.history_len(), 2);

        assert!(history.back());
        assert_eq!(history.pathname(), "/todo");
        assert!(history.can_go_forward());

        assert!(history.back());
        assert_eq!(history.pathname(), "/");
        assert!(!history.back());

        assert!(history.forward());
        assert_eq!(history.pathname(), "/todo");
    }

    #[test]
    fn test_push_discards_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push_state("/a");
        history.back();
        history.push_state("/b");
        assert!(!history.forward());
        assert_eq!(history.pathname(), "/b");
    }

    #[test]
    fn test_same_path_is_pushed_again() {
        let history = MemoryHistory::new("/");
        history.push_state("/");
        assert_eq!(history.history_len(), 1);
    }
}
