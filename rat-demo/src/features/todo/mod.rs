//! The todo feature: service, store and page.

pub mod service;
pub mod store;
pub mod view;

pub use service::{MockTodoService, Todo, TodoService};
pub use store::{Filter, Stats, TodoStore};
