//! The default command: build and print one user's calendar.

use std::sync::Arc;

use booksmart_core::Horizon;
use booksmart_engine::{AggregationPipeline, CalendarView, EngineConfig};
use booksmart_store::CalendarStore;

use crate::error::{CliError, CliResult};
use crate::render::{render_json, render_text, render_warnings};

/// Runs one aggregation pass for `user`.
pub async fn build(
    store: Arc<dyn CalendarStore>,
    config: &EngineConfig,
    user: &str,
    horizon: Option<Horizon>,
) -> CliResult<CalendarView> {
    if user.trim().is_empty() {
        return Err(CliError::config("--user is required"));
    }
    let pipeline = AggregationPipeline::with_settings(store, &config.engine);
    Ok(pipeline.build_calendar(user, horizon).await?)
}

/// Builds the calendar and prints it to stdout, warnings to stderr.
pub async fn show(
    store: Arc<dyn CalendarStore>,
    config: &EngineConfig,
    user: &str,
    horizon: Option<Horizon>,
    json: bool,
) -> CliResult<()> {
    let view = build(store, config, user, horizon).await?;

    for warning in render_warnings(&view) {
        eprintln!("warning: {}", warning);
    }
    if json {
        println!("{}", render_json(&view)?);
    } else {
        println!("{}", render_text(&view, user));
    }
    Ok(())
}
