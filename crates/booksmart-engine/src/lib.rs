//! Calendar aggregation engine.
//!
//! - [`AggregationPipeline`] - one fetch/normalize/expand/dedupe/filter/merge pass
//! - [`RequestTokens`] - stale-result discarding for overlapping refreshes
//! - [`Diagnostics`] - what each pass skipped, and why
//! - [`EngineConfig`] - TOML configuration

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod token;

pub use config::{EngineConfig, EngineSettings, StoreSettings};
pub use diagnostics::{Diagnostics, SourceFailure};
pub use error::{EngineError, EngineResult};
pub use pipeline::{AggregationPipeline, CalendarView, RefreshOutcome};
pub use token::{RequestToken, RequestTokens};
