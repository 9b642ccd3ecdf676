//! The aggregation pipeline.
//!
//! One pass reads meetings, tasks and recurrence rules concurrently, then:
//!
//! ```text
//! normalize ──► expand rules ──► drop occurrences taken by real meetings
//!           ──► keep the user's events ──► sort ──► drop repeated ids
//! ```
//!
//! A failed source degrades the pass instead of failing it; only the
//! failure of all three sources is an error.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use booksmart_core::{
    CalendarEvent, Expander, Horizon, ParticipantDirectory, RecurrenceRule, dedupe,
    filter_for_user, sort_for_display,
};
use booksmart_store::{
    CalendarStore, RawMeeting, RawRecurrence, RawTask, Source, StoreError, StoreResult,
    normalize_meetings, normalize_participants, normalize_recurrences, normalize_tasks,
};

use crate::config::EngineSettings;
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, EngineResult};
use crate::token::{RequestToken, RequestTokens};

/// The result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    /// Visible events in display order, unique by id.
    pub events: Vec<CalendarEvent>,
    pub diagnostics: Diagnostics,
    /// The horizon recurrences were expanded to.
    pub horizon: Horizon,
}

impl CalendarView {
    /// Returns true if at least one source failed during the pass.
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.is_degraded()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// What happened to a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The pass was the latest request; its view should be shown.
    Applied(CalendarView),
    /// A newer request was issued while this pass ran; the result was dropped.
    Stale { token: RequestToken },
}

impl RefreshOutcome {
    /// Returns the view if the refresh was applied.
    pub fn into_view(self) -> Option<CalendarView> {
        match self {
            Self::Applied(view) => Some(view),
            Self::Stale { .. } => None,
        }
    }
}

/// Raw listings of one pass, one result per source.
struct Fetched {
    meetings: StoreResult<Vec<RawMeeting>>,
    tasks: StoreResult<Vec<RawTask>>,
    rules: StoreResult<Vec<RawRecurrence>>,
}

/// Builds calendar views from a store.
///
/// The pipeline only takes `&self`; several passes may run at once.
pub struct AggregationPipeline {
    store: Arc<dyn CalendarStore>,
    horizon_months: u32,
    max_occurrences: usize,
    fetch_timeout: Option<Duration>,
    tokens: RequestTokens,
}

impl AggregationPipeline {
    /// Creates a pipeline with default settings.
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self::with_settings(store, &EngineSettings::default())
    }

    /// Creates a pipeline from configured settings.
    pub fn with_settings(store: Arc<dyn CalendarStore>, settings: &EngineSettings) -> Self {
        Self {
            store,
            horizon_months: settings.horizon_months,
            max_occurrences: settings.max_occurrences_per_rule.max(1),
            fetch_timeout: settings.fetch_timeout(),
            tokens: RequestTokens::new(),
        }
    }

    /// Builder: set the per-rule occurrence cap.
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max.max(1);
        self
    }

    /// Builder: set the per-source fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Returns the token issuer used by [`AggregationPipeline::refresh`].
    pub fn tokens(&self) -> &RequestTokens {
        &self.tokens
    }

    /// Returns the horizon used when the caller does not pass one.
    pub fn default_horizon(&self) -> Horizon {
        Horizon::from_now(self.horizon_months)
    }

    /// Runs one aggregation pass for `user_email`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CalendarUnavailable`] if meetings, tasks and
    /// recurrence rules all failed to load.
    #[tracing::instrument(skip(self), fields(store = %self.store.name()))]
    pub async fn build_calendar(
        &self,
        user_email: &str,
        horizon: Option<Horizon>,
    ) -> EngineResult<CalendarView> {
        let horizon = horizon.unwrap_or_else(|| self.default_horizon());
        let fetched = self.fetch_all().await;

        if let (Err(meetings), Err(tasks), Err(rules)) =
            (&fetched.meetings, &fetched.tasks, &fetched.rules)
        {
            let mut diagnostics = Diagnostics::default();
            diagnostics.record_failure(Source::Meetings, meetings);
            diagnostics.record_failure(Source::Tasks, tasks);
            diagnostics.record_failure(Source::Recurrences, rules);
            warn!("Every calendar source failed");
            return Err(EngineError::CalendarUnavailable {
                failures: diagnostics.failed_sources,
            });
        }

        let view = self.assemble(fetched, user_email, horizon);
        info!(
            events = view.events.len(),
            degraded = view.is_degraded(),
            malformed = view.diagnostics.total_malformed(),
            suppressed = view.diagnostics.suppressed_occurrences,
            hidden = view.diagnostics.hidden_by_filter,
            "Aggregation pass complete"
        );
        Ok(view)
    }

    /// Runs a pass for a refresh request and drops the result if a newer
    /// request was issued before it finished.
    ///
    /// In-flight passes are never cancelled.
    ///
    /// # Errors
    ///
    /// See [`AggregationPipeline::build_calendar`]. Errors of stale passes
    /// are dropped as well.
    pub async fn refresh(
        &self,
        token: RequestToken,
        user_email: &str,
        horizon: Option<Horizon>,
    ) -> EngineResult<RefreshOutcome> {
        let result = self.build_calendar(user_email, horizon).await;
        if !self.tokens.is_current(token) {
            debug!(token = token.value(), "Discarding stale result");
            return Ok(RefreshOutcome::Stale { token });
        }
        result.map(RefreshOutcome::Applied)
    }

    /// Loads the participant directory, for resolving emails to ids.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the participant listing fails.
    #[tracing::instrument(skip(self))]
    pub async fn participant_directory(&self) -> EngineResult<ParticipantDirectory> {
        let raws = self
            .with_timeout(Source::Participants, self.store.list_participants())
            .await?;
        let normalized = normalize_participants(&raws);
        if !normalized.malformed.is_empty() {
            warn!(count = normalized.malformed.len(), "Skipped malformed participants");
        }
        Ok(ParticipantDirectory::new(normalized.items))
    }

    async fn fetch_all(&self) -> Fetched {
        let (meetings, tasks, rules) = tokio::join!(
            self.with_timeout(Source::Meetings, self.store.list_meetings()),
            self.with_timeout(Source::Tasks, self.store.list_tasks()),
            self.with_timeout(Source::Recurrences, self.store.list_recurrence_rules()),
        );
        Fetched {
            meetings,
            tasks,
            rules,
        }
    }

    async fn with_timeout<T>(
        &self,
        source: Source,
        fetch: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let result = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                Err(StoreError::timeout(format!(
                    "{} did not respond within {}s",
                    source,
                    limit.as_secs_f64()
                ))
                .with_store(self.store.name()))
            }),
            None => fetch.await,
        };
        match result {
            Ok(records) => {
                debug!(source = %source, "Fetched source");
                Ok(records)
            }
            Err(e) => {
                warn!(source = %source, error = %e, "Source fetch failed");
                Err(e)
            }
        }
    }

    fn assemble(&self, fetched: Fetched, user_email: &str, horizon: Horizon) -> CalendarView {
        let mut diagnostics = Diagnostics::default();

        let meetings = match fetched.meetings {
            Ok(raws) => {
                let normalized = normalize_meetings(&raws);
                diagnostics.record_malformed(Source::Meetings, normalized.malformed.len());
                normalized.items
            }
            Err(e) => {
                diagnostics.record_failure(Source::Meetings, &e);
                Vec::new()
            }
        };
        let tasks = match fetched.tasks {
            Ok(raws) => {
                let normalized = normalize_tasks(&raws);
                diagnostics.record_malformed(Source::Tasks, normalized.malformed.len());
                normalized.items
            }
            Err(e) => {
                diagnostics.record_failure(Source::Tasks, &e);
                Vec::new()
            }
        };
        let rules = match fetched.rules {
            Ok(raws) => {
                let normalized = normalize_recurrences(&raws);
                diagnostics.record_malformed(Source::Recurrences, normalized.malformed.len());
                normalized.items
            }
            Err(e) => {
                diagnostics.record_failure(Source::Recurrences, &e);
                Vec::new()
            }
        };

        let occurrences = self.expand_rules(&rules, horizon, &mut diagnostics);
        let expanded = occurrences.len();
        let occurrences = dedupe(occurrences, &meetings);
        diagnostics.suppressed_occurrences = expanded - occurrences.len();

        let mut events = meetings;
        events.extend(tasks);
        events.extend(occurrences);

        let total = events.len();
        let mut events = filter_for_user(events, user_email);
        diagnostics.hidden_by_filter = total - events.len();

        sort_for_display(&mut events);
        let before = events.len();
        let mut seen = HashSet::new();
        events.retain(|event| seen.insert(event.id.clone()));
        diagnostics.duplicate_ids = before - events.len();
        if diagnostics.duplicate_ids > 0 {
            warn!(count = diagnostics.duplicate_ids, "Dropped events with repeated ids");
        }

        CalendarView {
            events,
            diagnostics,
            horizon,
        }
    }

    fn expand_rules(
        &self,
        rules: &[RecurrenceRule],
        horizon: Horizon,
        diagnostics: &mut Diagnostics,
    ) -> Vec<CalendarEvent> {
        let expander = Expander::new(horizon).with_max_occurrences(self.max_occurrences);
        let mut occurrences = Vec::new();
        for rule in rules {
            match expander.expand(rule) {
                Ok(expansion) => {
                    if expansion.truncated {
                        diagnostics.truncated_rules.push(rule.recurrence_id);
                    }
                    occurrences.extend(expansion.occurrences);
                }
                Err(e) => {
                    warn!(recurrence_id = rule.recurrence_id, error = %e, "Rejected recurrence rule");
                    diagnostics.non_advancing_rules.push(rule.recurrence_id);
                }
            }
        }
        occurrences
    }
}
