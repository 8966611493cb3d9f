use anyhow::Context as _;
use clap::Parser;
use rat_dom::{FileStorage, MemoryStorage, Storage};
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "rat_dom=info,rat_demo=info";

/// Home page and todo list in the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "rat-demo", version, about)]
pub struct Config {
    /// Route to open first.
    #[arg(long, default_value = "/")]
    pub path: String,

    /// JSON file backing local storage.
    #[arg(long, default_value = "rat-demo-storage.json")]
    pub storage: PathBuf,

    /// Keep local storage in memory only.
    #[arg(long)]
    pub ephemeral: bool,

    /// Where log output goes; the terminal belongs to the UI.
    #[arg(long, default_value = "rat-demo.log")]
    pub log_file: PathBuf,

    /// Input poll interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,
}

impl Config {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Install the global tracing subscriber, writing to `log_file`.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let file = File::create(&self.log_file)
            .with_context(|| format!("failed to create log file {}", self.log_file.display()))?;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
        Ok(())
    }

    pub fn open_storage(&self) -> anyhow::Result<Arc<dyn Storage>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStorage::new()));
        }
        let storage = FileStorage::open(&self.storage)
            .with_context(|| format!("failed to open storage {}", self.storage.display()))?;
        Ok(Arc::new(storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["rat-demo"]);
        assert_eq!(config.path, "/");
        assert_eq!(config.storage, PathBuf::from("rat-demo-storage.json"));
        assert!(!config.ephemeral);
        assert_eq!(config.log_file, PathBuf::from("rat-demo.log"));
        assert_eq!(config.tick_rate(), Duration::from_millis(100));
    }

    #[test]
    fn test_flags() {
        let config = Config::parse_from(["rat-demo", "--path", "/todo", "--ephemeral", "--tick-ms", "0"]);
        assert_eq!(config.path, "/todo");
        assert!(config.ephemeral);
        assert_eq!(config.tick_rate(), Duration::from_millis(1));
        assert!(config.open_storage().unwrap().get_item("todos").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_is_opened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let config = Config::parse_from(["rat-demo", "--storage", path.to_str().unwrap()]);
        let storage = config.open_storage().unwrap();
        storage.set_item("todos", "[]").unwrap();
        assert!(path.exists());
    }
}
