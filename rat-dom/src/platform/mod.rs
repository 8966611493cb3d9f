//! Host services the router and views rely on: session history and local storage.

pub mod history;
pub mod storage;

pub use history::{History, MemoryHistory};
pub use storage::{FileStorage, MemoryStorage, Storage};
