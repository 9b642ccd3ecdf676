//! Command implementations.

pub mod calendar;
pub mod config;
pub mod resolve;

use std::path::Path;
use std::sync::Arc;

use booksmart_engine::EngineConfig;
use booksmart_store::{CalendarStore, HttpStore, Snapshot, StaticStore};

use crate::error::{CliError, CliResult};

/// Opens the store a command reads from.
///
/// A snapshot file wins over the configured base URL.
pub fn open_store(
    snapshot: Option<&Path>,
    config: &EngineConfig,
) -> CliResult<Arc<dyn CalendarStore>> {
    if let Some(path) = snapshot {
        tracing::debug!(path = %path.display(), "reading snapshot");
        let snapshot = Snapshot::from_file(path)?;
        return Ok(Arc::new(StaticStore::from_snapshot(snapshot)));
    }

    if config.store.base_url.is_none() {
        return Err(CliError::config(
            "no store configured: set store.base_url, --base-url or --snapshot",
        ));
    }
    let store = HttpStore::new(config.http_store_config()?)?;
    Ok(Arc::new(store))
}
