//! Ranking algorithm configuration.
//!
//! Every tunable lives in one immutable `AlgorithmConfig` record built from
//! hard-coded defaults, a per-environment override table, and optional
//! `FEED_RANKING_*` environment variables. Reload replaces the whole record
//! behind an `Arc` swap; snapshots already handed out never change.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config field {field}: {value} ({reason})")]
    InvalidField {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Per-engagement-type score multipliers plus the flat content bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub hearts: f64,
    pub reactions: f64,
    pub shares: f64,
    /// Multiplier for photo posts.
    pub photo_bonus: f64,
    /// Multiplier for daily-gratitude posts.
    pub daily_gratitude_bonus: f64,
    /// Added to 1.0 when the post mentions the viewer.
    pub direct_mention_bonus: f64,
    /// Unread posts multiply by this; read posts divide by it.
    pub unread_boost: f64,
}

/// Recency tiers and the long-tail decay curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFactors {
    pub decay_hours: f64,
    pub recent_boost_1hr: f64,
    pub recent_boost_6hr: f64,
    pub recent_boost_24hr: f64,
    /// Decayed posts never fall below this multiplier.
    pub decay_floor: f64,
}

/// Relationship multipliers derived from the follow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowBonuses {
    pub base_multiplier: f64,
    pub new_follow_bonus: f64,
    pub established_follow_bonus: f64,
    pub mutual_follow_bonus: f64,
    pub second_tier_multiplier: f64,
    /// A follow younger than this counts as new.
    pub recent_follow_days: i64,
    pub recent_follow_boost: f64,
}

/// Temporary visibility boost for an author viewing their own post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnPostFactors {
    pub max_bonus_multiplier: f64,
    pub base_multiplier: f64,
    /// Minutes the boost holds at its peak.
    pub max_visibility_minutes: i64,
    /// Minutes over which the boost decays linearly to base.
    pub decay_duration_minutes: i64,
}

/// Feed-window diversity constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityLimits {
    pub max_posts_per_author: usize,
    /// Fraction of the emitted window one post type may occupy.
    pub max_type_share: f64,
    /// Relative magnitude of the bounded score perturbation, 0..=1.
    pub randomization_factor: f64,
}

/// Preference-learning tunables for the interaction tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceFactors {
    /// Interactions with one author before any boost applies.
    pub interaction_threshold: usize,
    /// Boost ceiling for frequently-engaged authors.
    pub frequent_user_boost: f64,
    pub preference_decay_days: f64,
    pub heart_weight: f64,
    pub reaction_weight: f64,
    pub share_weight: f64,
    pub follow_weight: f64,
}

impl PreferenceFactors {
    pub fn weight_for(&self, kind: crate::models::InteractionType) -> f64 {
        use crate::models::InteractionType::*;
        match kind {
            Heart => self.heart_weight,
            Reaction => self.reaction_weight,
            Share => self.share_weight,
            Follow => self.follow_weight,
        }
    }
}

/// Immutable record of all ranking tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub scoring_weights: ScoringWeights,
    pub time_factors: TimeFactors,
    pub follow_bonuses: FollowBonuses,
    pub own_post_factors: OwnPostFactors,
    pub diversity_limits: DiversityLimits,
    pub preference_factors: PreferenceFactors,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            scoring_weights: ScoringWeights {
                hearts: 1.0,
                reactions: 0.8,
                shares: 1.5,
                photo_bonus: 1.2,
                daily_gratitude_bonus: 1.1,
                direct_mention_bonus: 0.5,
                unread_boost: 1.25,
            },
            time_factors: TimeFactors {
                decay_hours: 24.0,
                recent_boost_1hr: 2.0,
                recent_boost_6hr: 1.5,
                recent_boost_24hr: 1.2,
                decay_floor: 0.05,
            },
            follow_bonuses: FollowBonuses {
                base_multiplier: 1.2,
                new_follow_bonus: 1.5,
                established_follow_bonus: 1.3,
                mutual_follow_bonus: 1.8,
                second_tier_multiplier: 1.1,
                recent_follow_days: 7,
                recent_follow_boost: 1.2,
            },
            own_post_factors: OwnPostFactors {
                max_bonus_multiplier: 3.0,
                base_multiplier: 1.5,
                max_visibility_minutes: 10,
                decay_duration_minutes: 60,
            },
            diversity_limits: DiversityLimits {
                max_posts_per_author: 3,
                max_type_share: 0.6,
                randomization_factor: 0.1,
            },
            preference_factors: PreferenceFactors {
                interaction_threshold: 5,
                frequent_user_boost: 1.5,
                preference_decay_days: 30.0,
                heart_weight: 1.0,
                reaction_weight: 1.0,
                share_weight: 2.0,
                follow_weight: 3.0,
            },
        }
    }
}

impl AlgorithmConfig {
    /// Defaults deep-merged with the override table for `environment`.
    /// Unknown environments use the defaults unchanged.
    pub fn for_environment(environment: &str) -> Self {
        let mut config = Self::default();

        match environment {
            "development" => {
                config.scoring_weights.hearts = 1.2;
                config.diversity_limits.randomization_factor = 0.05;
                config.own_post_factors.max_visibility_minutes = 2;
            }
            "staging" => {
                config.diversity_limits.randomization_factor = 0.08;
            }
            "production" => {}
            other => {
                debug!(environment = other, "unknown environment, using defaults");
            }
        }

        config
    }

    /// Apply `FEED_RANKING_*` environment-variable overrides in place.
    fn apply_env_overrides(&mut self) {
        dotenvy::dotenv().ok();

        override_f64(&mut self.scoring_weights.hearts, "FEED_RANKING_HEARTS_WEIGHT");
        override_f64(
            &mut self.scoring_weights.reactions,
            "FEED_RANKING_REACTIONS_WEIGHT",
        );
        override_f64(&mut self.scoring_weights.shares, "FEED_RANKING_SHARES_WEIGHT");
        override_f64(
            &mut self.scoring_weights.unread_boost,
            "FEED_RANKING_UNREAD_BOOST",
        );
        override_f64(&mut self.time_factors.decay_hours, "FEED_RANKING_DECAY_HOURS");
        override_f64(
            &mut self.diversity_limits.randomization_factor,
            "FEED_RANKING_RANDOMIZATION_FACTOR",
        );
        override_usize(
            &mut self.diversity_limits.max_posts_per_author,
            "FEED_RANKING_MAX_POSTS_PER_AUTHOR",
        );
        override_usize(
            &mut self.preference_factors.interaction_threshold,
            "FEED_RANKING_INTERACTION_THRESHOLD",
        );
    }

    /// Validate every tunable, naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.scoring_weights;
        let checks: [(&'static str, f64, bool); 14] = [
            ("scoring_weights.hearts", w.hearts, w.hearts >= 0.0),
            ("scoring_weights.reactions", w.reactions, w.reactions >= 0.0),
            ("scoring_weights.shares", w.shares, w.shares >= 0.0),
            ("scoring_weights.photo_bonus", w.photo_bonus, w.photo_bonus >= 0.0),
            (
                "scoring_weights.daily_gratitude_bonus",
                w.daily_gratitude_bonus,
                w.daily_gratitude_bonus >= 0.0,
            ),
            (
                "scoring_weights.direct_mention_bonus",
                w.direct_mention_bonus,
                w.direct_mention_bonus >= 0.0,
            ),
            ("scoring_weights.unread_boost", w.unread_boost, w.unread_boost > 0.0),
            (
                "time_factors.decay_hours",
                self.time_factors.decay_hours,
                self.time_factors.decay_hours > 0.0,
            ),
            (
                "time_factors.decay_floor",
                self.time_factors.decay_floor,
                self.time_factors.decay_floor > 0.0,
            ),
            (
                "follow_bonuses.base_multiplier",
                self.follow_bonuses.base_multiplier,
                self.follow_bonuses.base_multiplier >= 0.0,
            ),
            (
                "follow_bonuses.mutual_follow_bonus",
                self.follow_bonuses.mutual_follow_bonus,
                self.follow_bonuses.mutual_follow_bonus >= 0.0,
            ),
            (
                "diversity_limits.randomization_factor",
                self.diversity_limits.randomization_factor,
                (0.0..=1.0).contains(&self.diversity_limits.randomization_factor),
            ),
            (
                "diversity_limits.max_type_share",
                self.diversity_limits.max_type_share,
                self.diversity_limits.max_type_share > 0.0
                    && self.diversity_limits.max_type_share <= 1.0,
            ),
            (
                "preference_factors.preference_decay_days",
                self.preference_factors.preference_decay_days,
                self.preference_factors.preference_decay_days > 0.0,
            ),
        ];

        for (field, value, ok) in checks {
            if !ok {
                return Err(ConfigError::InvalidField {
                    field,
                    value,
                    reason: "out of allowed range",
                });
            }
        }

        if self.diversity_limits.max_posts_per_author == 0 {
            return Err(ConfigError::InvalidField {
                field: "diversity_limits.max_posts_per_author",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        let b = &self.follow_bonuses;
        for (field, value) in [
            ("follow_bonuses.new_follow_bonus", b.new_follow_bonus),
            ("follow_bonuses.established_follow_bonus", b.established_follow_bonus),
            ("follow_bonuses.second_tier_multiplier", b.second_tier_multiplier),
            ("follow_bonuses.recent_follow_boost", b.recent_follow_boost),
            (
                "own_post_factors.max_bonus_multiplier",
                self.own_post_factors.max_bonus_multiplier,
            ),
            ("own_post_factors.base_multiplier", self.own_post_factors.base_multiplier),
            (
                "preference_factors.frequent_user_boost",
                self.preference_factors.frequent_user_boost,
            ),
        ] {
            if value < 0.0 {
                return Err(ConfigError::InvalidField {
                    field,
                    value,
                    reason: "must not be negative",
                });
            }
        }

        Ok(())
    }
}

fn override_f64(field: &mut f64, key: &str) {
    if let Ok(raw) = env::var(key) {
        match raw.parse::<f64>() {
            Ok(value) => *field = value,
            Err(_) => warn!(key, raw = %raw, "ignoring unparseable config override"),
        }
    }
}

fn override_usize(field: &mut usize, key: &str) {
    if let Ok(raw) = env::var(key) {
        match raw.parse::<usize>() {
            Ok(value) => *field = value,
            Err(_) => warn!(key, raw = %raw, "ignoring unparseable config override"),
        }
    }
}

/// Build and validate the config for `environment`.
///
/// A validation failure logs a warning and substitutes the default record;
/// it never propagates, so the service keeps serving feeds.
pub fn get_config(environment: &str) -> AlgorithmConfig {
    let mut config = AlgorithmConfig::for_environment(environment);
    config.apply_env_overrides();

    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            let err = crate::error::RankingError::ConfigValidation(e);
            warn!(environment, error = %err, "invalid algorithm config, falling back to defaults");
            AlgorithmConfig::default()
        }
    }
}

/// Handle that owns the current config and swaps it atomically on reload.
///
/// `config()` hands out an `Arc` snapshot; in-flight scoring that already
/// fetched a snapshot is unaffected by a concurrent reload.
pub struct ConfigProvider {
    environment: String,
    current: RwLock<Arc<AlgorithmConfig>>,
}

impl ConfigProvider {
    pub fn new(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let config = Arc::new(get_config(&environment));
        Self {
            environment,
            current: RwLock::new(config),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Current config snapshot.
    pub fn config(&self) -> Arc<AlgorithmConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Rebuild from environment + overrides and swap the snapshot.
    pub fn reload(&self) -> Arc<AlgorithmConfig> {
        let fresh = Arc::new(get_config(&self.environment));
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&fresh),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&fresh),
        }
        debug!(environment = %self.environment, "algorithm config reloaded");
        fresh
    }
}
