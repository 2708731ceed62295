//! Per-viewer read marks.
//!
//! A viewer owns their own set of marks; there is no cross-viewer
//! visibility. The store is process-lifetime by default with an optional
//! TTL pruned lazily on lookup. The scoring contract only needs
//! point-in-time set membership, so a durable backend could be swapped in
//! behind the same methods.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::ReadSummary;

pub struct ReadStatusTracker {
    marks: DashMap<Uuid, HashMap<Uuid, DateTime<Utc>>>,
    /// Marks older than this read as unread and are pruned.
    ttl: Option<Duration>,
}

impl Default for ReadStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadStatusTracker {
    pub fn new() -> Self {
        Self {
            marks: DashMap::new(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Mark a batch of posts read for one viewer.
    pub fn mark_read(&self, viewer_id: Uuid, post_ids: &[Uuid]) {
        self.mark_read_at(viewer_id, post_ids, Utc::now());
    }

    /// `mark_read` with an explicit timestamp.
    pub fn mark_read_at(&self, viewer_id: Uuid, post_ids: &[Uuid], read_at: DateTime<Utc>) {
        if post_ids.is_empty() {
            return;
        }

        let mut entry = self.marks.entry(viewer_id).or_default();
        for post_id in post_ids {
            entry.insert(*post_id, read_at);
        }

        debug!(
            viewer_id = %viewer_id,
            marked = post_ids.len(),
            total = entry.len(),
            "read marks recorded"
        );
    }

    /// Point-in-time membership check used by the scorer.
    pub fn is_read(&self, viewer_id: Uuid, post_id: Uuid, now: DateTime<Utc>) -> bool {
        let Some(mut entry) = self.marks.get_mut(&viewer_id) else {
            return false;
        };

        let Some(read_at) = entry.get(&post_id).copied() else {
            return false;
        };

        if let Some(ttl) = self.ttl {
            if now - read_at > ttl {
                entry.remove(&post_id);
                return false;
            }
        }

        true
    }

    pub fn get_summary(&self, viewer_id: Uuid, now: DateTime<Utc>) -> ReadSummary {
        let Some(entry) = self.marks.get(&viewer_id) else {
            return ReadSummary::default();
        };

        let hour_ago = now - Duration::hours(1);
        let live = |read_at: DateTime<Utc>| match self.ttl {
            Some(ttl) => now - read_at <= ttl,
            None => true,
        };

        ReadSummary {
            read_count: entry.values().filter(|at| live(**at)).count(),
            recent_reads: entry
                .values()
                .filter(|at| live(**at) && **at >= hour_ago)
                .count(),
        }
    }

    /// Remove every mark for one viewer. Other viewers are unaffected.
    pub fn clear(&self, viewer_id: Uuid) {
        if self.marks.remove(&viewer_id).is_some() {
            debug!(viewer_id = %viewer_id, "read marks cleared");
        }
    }
}
