//! Router module.
//!
//! Provides `Route` table entries, the `routes!` macro, and the `Router` that
//! resolves history entries to mounted views.

pub mod navigator;
pub mod route;

pub use navigator::{Router, RouterState, LINK_ATTRIBUTE};
pub use route::{Cleanup, Route, RouteChange, View, ViewFactory, ViewFuture, WILDCARD};
