//! State management.
//!
//! Provides the observable containers views build on: `Store` for key-value
//! records, `Signal` for single values, `Computed` for derived values, and
//! `UpdateContext` for batching store notifications.

pub mod computed;
pub mod context;
pub mod signal;
pub mod store;

pub use computed::Computed;
pub use context::UpdateContext;
pub use signal::{create_signal, ReadSignal, Signal, Trackable, WriteSignal};
pub use store::{Change, Record, Store};
