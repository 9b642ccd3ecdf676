//! Resolve participant emails to store ids.

use std::sync::Arc;

use booksmart_engine::AggregationPipeline;
use booksmart_store::CalendarStore;

use crate::error::CliResult;

/// Resolves every email, failing if any is unknown.
pub async fn resolve_ids(
    store: Arc<dyn CalendarStore>,
    emails: &[String],
) -> CliResult<Vec<(String, i64)>> {
    let directory = AggregationPipeline::new(store).participant_directory().await?;
    let participants = directory.resolve(emails)?;
    Ok(participants
        .iter()
        .map(|p| (p.email.clone(), p.id))
        .collect())
}

/// Prints one `email<TAB>id` line per participant.
pub async fn run(store: Arc<dyn CalendarStore>, emails: &[String]) -> CliResult<()> {
    for (email, id) in resolve_ids(store, emails).await? {
        println!("{}\t{}", email, id);
    }
    Ok(())
}
