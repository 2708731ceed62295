//! Preference learning from user-to-user interactions.
//!
//! Interactions are appended to a per-viewer event log and aggregated on
//! demand into a preference boost per (viewer, author) pair. The log is
//! append-only; events are never updated or deleted. Writes are
//! fire-and-forget from the caller's perspective and never fail the
//! triggering action.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PreferenceFactors;
use crate::error::RankingError;
use crate::models::{InteractionEvent, InteractionSummary, InteractionType};

/// Upper bound on one viewer's event log. The log is append-only, so a
/// runaway writer is capped rather than trimmed; over-cap events are
/// dropped with a logged tracking error that never reaches the caller.
const MAX_EVENTS_PER_VIEWER: usize = 10_000;

/// In-memory append-only interaction log keyed by viewer.
///
/// Concurrent writers need no coordination beyond the shard locks DashMap
/// already provides; the derived preference score is recomputed per request
/// as a read-only aggregation.
#[derive(Default)]
pub struct InteractionTracker {
    events: DashMap<Uuid, Vec<InteractionEvent>>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one interaction from `viewer_id` toward `author_id`.
    ///
    /// Self-interactions are dropped: hearting your own post says nothing
    /// about author preference.
    pub fn track(
        &self,
        viewer_id: Uuid,
        author_id: Uuid,
        kind: InteractionType,
        factors: &PreferenceFactors,
    ) {
        self.track_at(viewer_id, author_id, kind, factors, Utc::now());
    }

    /// `track` with an explicit timestamp.
    pub fn track_at(
        &self,
        viewer_id: Uuid,
        author_id: Uuid,
        kind: InteractionType,
        factors: &PreferenceFactors,
        occurred_at: DateTime<Utc>,
    ) {
        if viewer_id == author_id {
            debug!(viewer_id = %viewer_id, kind = kind.as_str(), "skipping self-interaction");
            return;
        }

        let event = InteractionEvent {
            viewer_id,
            author_id,
            kind,
            weight: factors.weight_for(kind),
            occurred_at,
        };

        let mut log = self.events.entry(viewer_id).or_default();
        if log.len() >= MAX_EVENTS_PER_VIEWER {
            let err = RankingError::Tracking(format!(
                "event log for viewer {} is at capacity ({})",
                viewer_id, MAX_EVENTS_PER_VIEWER
            ));
            warn!(viewer_id = %viewer_id, error = %err, "dropping interaction event");
            return;
        }
        log.push(event);
    }

    /// Preference multiplier for posts by `author_id` in `viewer_id`'s feed.
    ///
    /// Stays at 1.0 until the viewer has at least `interaction_threshold`
    /// events with that author. Above the threshold each event contributes
    /// its weight decayed exponentially over `preference_decay_days`, and
    /// the aggregate saturates toward `frequent_user_boost` so one very
    /// active pair cannot dominate the feed.
    pub fn get_preference_boost(
        &self,
        viewer_id: Uuid,
        author_id: Uuid,
        factors: &PreferenceFactors,
        now: DateTime<Utc>,
    ) -> f64 {
        let Some(events) = self.events.get(&viewer_id) else {
            return 1.0;
        };

        let with_author: Vec<&InteractionEvent> = events
            .iter()
            .filter(|e| e.author_id == author_id)
            .collect();

        if with_author.len() < factors.interaction_threshold {
            return 1.0;
        }

        let aggregate: f64 = with_author
            .iter()
            .map(|e| {
                let age_days =
                    (now - e.occurred_at).num_seconds().max(0) as f64 / 86_400.0;
                e.weight * (-age_days / factors.preference_decay_days).exp()
            })
            .sum();

        let saturation = aggregate / (aggregate + factors.interaction_threshold as f64);
        let headroom = (factors.frequent_user_boost - 1.0).max(0.0);

        1.0 + headroom * saturation
    }

    /// Diagnostic aggregation of one viewer's interaction history.
    pub fn get_interaction_summary(
        &self,
        viewer_id: Uuid,
        factors: &PreferenceFactors,
        now: DateTime<Utc>,
    ) -> InteractionSummary {
        let Some(events) = self.events.get(&viewer_id) else {
            return InteractionSummary::default();
        };

        let week_ago = now - Duration::days(7);
        let mut summary = InteractionSummary::default();
        let mut per_author: HashMap<Uuid, usize> = HashMap::new();

        for event in events.iter() {
            summary.total += 1;
            if event.occurred_at >= week_ago {
                summary.recent += 1;
            }
            match event.kind {
                InteractionType::Heart => summary.hearts += 1,
                InteractionType::Reaction => summary.reactions += 1,
                InteractionType::Share => summary.shares += 1,
                InteractionType::Follow => summary.follows += 1,
            }
            *per_author.entry(event.author_id).or_insert(0) += 1;
        }

        summary.frequent_author_count = per_author
            .values()
            .filter(|&&count| count >= factors.interaction_threshold)
            .count();

        summary
    }
}
