//! Multi-factor post scoring.
//!
//! Every factor is an independent multiplier on a base of 1.0 so each
//! tunable can be adjusted without touching the others:
//!
//! ```text
//! score = engagement × content_type × mention × relationship
//!       × preference × own_post × read_status × time_decay
//! ```
//!
//! Scoring is pure over its inputs: all engagement counts and follow facts
//! arrive on the `CandidatePost`, preference and read state come from the
//! trackers' point-in-time lookups, and `now` is passed in explicitly. A
//! post that fails to score gets the floor score and a warning, never a
//! batch failure.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::config::AlgorithmConfig;
use crate::error::RankingError;
use crate::models::{CandidatePost, PostType, RankedPost};
use crate::services::interactions::InteractionTracker;
use crate::services::read_status::ReadStatusTracker;

/// Lowest score any post can receive. Keeps ordering stable and ratio
/// displays free of divide-by-zero.
pub const MIN_SCORE: f64 = 0.01;

pub struct ScoreCalculator {
    config: Arc<AlgorithmConfig>,
    interactions: Arc<InteractionTracker>,
    read_status: Arc<ReadStatusTracker>,
}

impl ScoreCalculator {
    pub fn new(
        config: Arc<AlgorithmConfig>,
        interactions: Arc<InteractionTracker>,
        read_status: Arc<ReadStatusTracker>,
    ) -> Self {
        Self {
            config,
            interactions,
            read_status,
        }
    }

    /// Score one candidate post for a viewer.
    pub fn score(
        &self,
        post: &CandidatePost,
        viewer_id: Uuid,
        now: DateTime<Utc>,
        read_status_enabled: bool,
    ) -> f64 {
        let score = self.engagement_multiplier(post)
            * self.content_type_multiplier(post)
            * self.mention_multiplier(post, viewer_id)
            * self.relationship_multiplier(post, viewer_id, now)
            * self.preference_multiplier(post, viewer_id, now)
            * self.own_post_multiplier(post, viewer_id, now)
            * self.read_status_multiplier(post, viewer_id, now, read_status_enabled)
            * self.time_decay_multiplier(post, now);

        if !score.is_finite() {
            let err = RankingError::Scoring {
                post_id: post.id,
                reason: format!("non-finite score {}", score),
            };
            warn!(viewer_id = %viewer_id, error = %err, "substituting floor score");
            return MIN_SCORE;
        }

        score.max(MIN_SCORE)
    }

    /// Score a whole candidate set, sorted by score descending with
    /// creation time (newest first) breaking ties.
    pub fn score_batch(
        &self,
        candidates: &[CandidatePost],
        viewer_id: Uuid,
        now: DateTime<Utc>,
        read_status_enabled: bool,
    ) -> Vec<RankedPost> {
        let mut ranked: Vec<RankedPost> = candidates
            .iter()
            .map(|post| RankedPost {
                algorithm_score: self.score(post, viewer_id, now, read_status_enabled),
                post: post.clone(),
            })
            .collect();

        // NaN cannot occur past the finiteness check above, but partial_cmp
        // still needs a total-order fallback.
        ranked.sort_by(|a, b| {
            b.algorithm_score
                .partial_cmp(&a.algorithm_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.post.created_at.cmp(&a.post.created_at))
        });

        ranked
    }

    /// `1 + hearts·w + reactions·w + shares·w`; exactly 1.0 at zero counts.
    fn engagement_multiplier(&self, post: &CandidatePost) -> f64 {
        let w = &self.config.scoring_weights;
        let boost = post.counts.hearts as f64 * w.hearts
            + post.counts.reactions as f64 * w.reactions
            + post.counts.shares as f64 * w.shares;

        (1.0 + boost).max(1.0)
    }

    fn content_type_multiplier(&self, post: &CandidatePost) -> f64 {
        let w = &self.config.scoring_weights;
        match post.post_type {
            PostType::Photo => w.photo_bonus,
            PostType::DailyGratitude => w.daily_gratitude_bonus,
            PostType::Spontaneous => 1.0,
        }
    }

    /// Direct mentions boost the post, but never for the author viewing
    /// their own post.
    fn mention_multiplier(&self, post: &CandidatePost, viewer_id: Uuid) -> f64 {
        if post.mentions_viewer && viewer_id != post.author_id {
            1.0 + self.config.scoring_weights.direct_mention_bonus
        } else {
            1.0
        }
    }

    /// Follow-graph multiplier. Mutual dominates new/established; a
    /// second-tier relationship only applies without a direct follow.
    fn relationship_multiplier(
        &self,
        post: &CandidatePost,
        viewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> f64 {
        if viewer_id == post.author_id {
            return 1.0;
        }

        let b = &self.config.follow_bonuses;
        let facts = &post.follow;

        if facts.mutual {
            return b.mutual_follow_bonus * b.base_multiplier;
        }

        if facts.following {
            let is_new = facts
                .followed_since
                .map(|since| since > now - chrono::Duration::days(b.recent_follow_days))
                .unwrap_or(false);

            return if is_new {
                b.new_follow_bonus * b.base_multiplier * b.recent_follow_boost
            } else {
                b.established_follow_bonus * b.base_multiplier
            };
        }

        if facts.second_tier {
            return b.second_tier_multiplier;
        }

        1.0
    }

    fn preference_multiplier(
        &self,
        post: &CandidatePost,
        viewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> f64 {
        if viewer_id == post.author_id {
            return 1.0;
        }

        self.interactions.get_preference_boost(
            viewer_id,
            post.author_id,
            &self.config.preference_factors,
            now,
        )
    }

    /// Authors briefly see their own fresh post at the top: the boost holds
    /// at its peak for `max_visibility_minutes`, then decays linearly to a
    /// modest permanent advantage over `decay_duration_minutes`.
    fn own_post_multiplier(&self, post: &CandidatePost, viewer_id: Uuid, now: DateTime<Utc>) -> f64 {
        if viewer_id != post.author_id {
            return 1.0;
        }

        let f = &self.config.own_post_factors;
        let age_minutes = (now - post.created_at).num_seconds().max(0) as f64 / 60.0;
        let peak_until = f.max_visibility_minutes as f64;
        let decay_over = f.decay_duration_minutes as f64;

        if age_minutes <= peak_until {
            f.max_bonus_multiplier
        } else if age_minutes < peak_until + decay_over {
            let progress = (age_minutes - peak_until) / decay_over;
            f.max_bonus_multiplier - (f.max_bonus_multiplier - f.base_multiplier) * progress
        } else {
            f.base_multiplier
        }
    }

    /// Unread posts multiply by `unread_boost`, read ones divide by it.
    /// Identity when the flag is off or the viewer is the author.
    fn read_status_multiplier(
        &self,
        post: &CandidatePost,
        viewer_id: Uuid,
        now: DateTime<Utc>,
        enabled: bool,
    ) -> f64 {
        if !enabled || viewer_id == post.author_id {
            return 1.0;
        }

        let boost = self.config.scoring_weights.unread_boost;
        if self.read_status.is_read(viewer_id, post.id, now) {
            1.0 / boost
        } else {
            boost
        }
    }

    /// Tiered recency boost with a floored long-tail decay. A post never
    /// decays to zero; old posts stay orderable rather than excluded.
    fn time_decay_multiplier(&self, post: &CandidatePost, now: DateTime<Utc>) -> f64 {
        let t = &self.config.time_factors;
        let age_hours = (now - post.created_at).num_seconds().max(0) as f64 / 3600.0;

        if age_hours < 1.0 {
            t.recent_boost_1hr
        } else if age_hours < 6.0 {
            t.recent_boost_6hr
        } else if age_hours < 24.0 {
            t.recent_boost_24hr
        } else {
            let decayed = t.recent_boost_24hr * (-(age_hours - 24.0) / t.decay_hours).exp();
            decayed.max(t.decay_floor)
        }
    }
}
