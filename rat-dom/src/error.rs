use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to lock mutex: poisoned"))]
    LockPoisoned,

    #[snafu(display("Terminal error: {source}"))]
    Terminal { source: std::io::Error },

    #[snafu(display("Storage error at {}: {source}", path.display()))]
    Storage { path: PathBuf, source: std::io::Error },

    #[snafu(display("Serialization error: {source}"))]
    Serialization { source: serde_json::Error },

    #[snafu(display("Only one wildcard route is permitted, found {count}"))]
    DuplicateWildcard { count: usize },

    #[snafu(display("View failed to load: {message}"))]
    ViewLoad { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
