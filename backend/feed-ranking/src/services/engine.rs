//! Engine facade tying config, trackers, and assembly together.
//!
//! One instance serves all viewers; per-request work is a pure computation
//! over an `Arc` config snapshot, so concurrent feed requests need no
//! coordination. Interaction and read-status writes are fire-and-forget:
//! they log failures and never fail the action that triggered them.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::ConfigProvider;
use crate::models::{
    CandidatePost, FeedPage, InteractionSummary, InteractionType, ReadSummary,
};
use crate::services::assembler::FeedAssembler;
use crate::services::interactions::InteractionTracker;
use crate::services::read_status::ReadStatusTracker;

pub struct FeedRankingEngine {
    config_provider: Arc<ConfigProvider>,
    interactions: Arc<InteractionTracker>,
    read_status: Arc<ReadStatusTracker>,
}

impl FeedRankingEngine {
    pub fn new(environment: impl Into<String>) -> Self {
        let config_provider = Arc::new(ConfigProvider::new(environment));
        info!(environment = config_provider.environment(), "feed ranking engine initialized");

        Self {
            config_provider,
            interactions: Arc::new(InteractionTracker::new()),
            read_status: Arc::new(ReadStatusTracker::new()),
        }
    }

    /// Replace the read-status store, e.g. to add a TTL.
    pub fn with_read_status(mut self, read_status: ReadStatusTracker) -> Self {
        self.read_status = Arc::new(read_status);
        self
    }

    pub fn config_provider(&self) -> &ConfigProvider {
        &self.config_provider
    }

    /// Build an assembler over the current config snapshot. A concurrent
    /// reload does not affect an assembler already constructed.
    fn assembler(&self) -> FeedAssembler {
        FeedAssembler::new(
            self.config_provider.config(),
            Arc::clone(&self.interactions),
            Arc::clone(&self.read_status),
        )
    }

    /// Assemble one page of a viewer's feed. Never errors; degraded modes
    /// fall back to chronological ordering inside the assembler.
    pub async fn assemble_feed(
        &self,
        candidates: Vec<CandidatePost>,
        viewer_id: Uuid,
        page_size: usize,
        offset: usize,
        algorithm_enabled: bool,
        read_status_enabled: bool,
    ) -> FeedPage {
        self.assembler()
            .assemble(
                candidates,
                viewer_id,
                page_size,
                offset,
                algorithm_enabled,
                read_status_enabled,
            )
            .await
    }

    /// Record a viewer-to-author interaction for preference learning.
    pub fn track_interaction(&self, viewer_id: Uuid, author_id: Uuid, kind: InteractionType) {
        let config = self.config_provider.config();
        self.interactions
            .track(viewer_id, author_id, kind, &config.preference_factors);
    }

    pub fn mark_read(&self, viewer_id: Uuid, post_ids: &[Uuid]) {
        self.read_status.mark_read(viewer_id, post_ids);
    }

    pub fn clear_read_status(&self, viewer_id: Uuid) {
        self.read_status.clear(viewer_id);
    }

    pub fn interaction_summary(&self, viewer_id: Uuid) -> InteractionSummary {
        let config = self.config_provider.config();
        self.interactions
            .get_interaction_summary(viewer_id, &config.preference_factors, Utc::now())
    }

    pub fn read_summary(&self, viewer_id: Uuid, now: DateTime<Utc>) -> ReadSummary {
        self.read_status.get_summary(viewer_id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementCounts, FollowFacts, PostType};
    use chrono::Duration;

    fn candidate(author_id: Uuid, hours_old: i64) -> CandidatePost {
        CandidatePost {
            id: Uuid::new_v4(),
            author_id,
            post_type: PostType::Spontaneous,
            created_at: Utc::now() - Duration::hours(hours_old),
            counts: EngagementCounts::default(),
            mentions_viewer: false,
            follow: FollowFacts::default(),
        }
    }

    #[tokio::test]
    async fn test_engine_serves_a_feed_end_to_end() {
        let engine = FeedRankingEngine::new("production");
        let viewer = Uuid::new_v4();

        let candidates = vec![
            candidate(Uuid::new_v4(), 1),
            candidate(Uuid::new_v4(), 5),
            candidate(Uuid::new_v4(), 30),
        ];

        let page = engine
            .assemble_feed(candidates, viewer, 10, 0, true, true)
            .await;

        assert_eq!(page.posts.len(), 3);
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn test_tracked_interactions_show_in_summary() {
        let engine = FeedRankingEngine::new("production");
        let viewer = Uuid::new_v4();
        let author = Uuid::new_v4();

        engine.track_interaction(viewer, author, InteractionType::Heart);
        engine.track_interaction(viewer, author, InteractionType::Share);
        // Self-interaction, silently dropped.
        engine.track_interaction(viewer, viewer, InteractionType::Heart);

        let summary = engine.interaction_summary(viewer);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.hearts, 1);
        assert_eq!(summary.shares, 1);
    }

    #[tokio::test]
    async fn test_mark_and_clear_read_status() {
        let engine = FeedRankingEngine::new("production");
        let viewer = Uuid::new_v4();
        let posts = [Uuid::new_v4(), Uuid::new_v4()];

        engine.mark_read(viewer, &posts);
        assert_eq!(engine.read_summary(viewer, Utc::now()).read_count, 2);

        engine.clear_read_status(viewer);
        assert_eq!(engine.read_summary(viewer, Utc::now()).read_count, 0);
    }

    #[tokio::test]
    async fn test_config_reload_does_not_disturb_serving() {
        let engine = FeedRankingEngine::new("development");
        let before = engine.config_provider().config();

        engine.config_provider().reload();

        // Old snapshot still intact, new snapshot live.
        assert_eq!(before.scoring_weights.hearts, 1.2);
        assert_eq!(engine.config_provider().config().scoring_weights.hearts, 1.2);
    }
}
