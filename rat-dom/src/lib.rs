pub mod application;
pub mod dom;
pub mod error;
pub mod events;
pub mod platform;
pub mod render;
pub mod router;
pub mod state;
pub mod subscription;

pub use error::{Error, Result};

// Re-export common types for convenience
pub use application::{Application, Browser, Flow};
pub use dom::{el, fragment, text, Attr, Child, Document, DomEvent, Element, Node};
pub use events::EventBus;
pub use platform::{FileStorage, History, MemoryHistory, MemoryStorage, Storage};
pub use router::{Route, RouteChange, Router, RouterState, View};
pub use state::{create_signal, Change, Computed, ReadSignal, Record, Signal, Store, Trackable, UpdateContext, WriteSignal};
pub use subscription::{ListenerId, Subscription, SubscriptionSet};

#[doc(hidden)]
pub use paste;
