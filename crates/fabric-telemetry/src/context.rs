//! Activity context for user-visible operations.
//!
//! An activity is one operation a user triggered (saving a file, deleting a
//! folder). Its context carries correlation ids and free-form properties and
//! produces the span the operation runs under.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation and property bag for a single activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityContext {
    /// Unique activity identifier.
    pub activity_id: Uuid,
    /// Correlation ID shared by related activities.
    pub correlation_id: Uuid,
    /// Parent activity, if this one was started by another.
    pub parent_id: Option<Uuid>,
    /// When the activity started.
    pub started_at: DateTime<Utc>,
    /// Component that started the activity.
    pub source: String,
    /// Operation name, e.g. `write_file`.
    pub operation: String,
    /// Properties attached to the activity's outcome event.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ActivityContext {
    /// Start a new root activity.
    #[must_use]
    pub fn new(source: impl Into<String>, operation: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            activity_id: id,
            correlation_id: id,
            parent_id: None,
            started_at: Utc::now(),
            source: source.into(),
            operation: operation.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Start a child activity sharing this one's correlation ID and metadata.
    #[must_use]
    pub fn child(&self, operation: impl Into<String>) -> Self {
        Self {
            activity_id: Uuid::new_v4(),
            correlation_id: self.correlation_id,
            parent_id: Some(self.activity_id),
            started_at: Utc::now(),
            source: self.source.clone(),
            operation: operation.into(),
            metadata: self.metadata.clone(),
        }
    }

    /// Set the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    /// Add a property.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Time since the activity started, in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Span the activity's work should run under.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "activity",
            activity_id = %self.activity_id,
            correlation_id = %self.correlation_id,
            source = %self.source,
            operation = %self.operation,
            properties = ?self.metadata,
        )
    }

    /// Emit the outcome event for `result`: info on success, error on failure.
    pub fn record_outcome<T, E: Display>(&self, result: &Result<T, E>) {
        let elapsed_ms = self.elapsed_ms();
        match result {
            Ok(_) => tracing::info!(
                operation = %self.operation,
                elapsed_ms,
                "activity succeeded"
            ),
            Err(e) => tracing::error!(
                operation = %self.operation,
                elapsed_ms,
                error = %e,
                "activity failed"
            ),
        }
    }

    /// First eight characters of the activity ID.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.activity_id.simple().to_string().chars().take(8).collect()
    }
}

/// Enters an activity's span for the guard's lifetime and logs completion
/// when dropped. Intended for synchronous sections.
pub struct ActivityGuard {
    context: ActivityContext,
    _span: tracing::span::EnteredSpan,
}

impl ActivityGuard {
    /// Enter `context`'s span.
    #[must_use]
    pub fn new(context: ActivityContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("activity started");
        Self {
            context,
            _span: span,
        }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &ActivityContext {
        &self.context
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "activity completed");
    }
}
