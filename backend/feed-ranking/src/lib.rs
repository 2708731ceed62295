//! Feed-ranking engine for the gratitude journal backend.
//!
//! Pure, multi-factor feed ranking: engagement and recency scoring,
//! follow-graph and mention bonuses, preference learning from past
//! interactions, read-status signals, and post-hoc diversity reshuffling.
//! Storage, transport, and auth live in other services; this crate only
//! consumes their facts (counts, follow edges, mentions) and emits an
//! ordered page of `(post id, score)` pairs.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{AlgorithmConfig, ConfigError, ConfigProvider};
pub use error::{RankingError, Result};
pub use models::{
    CandidatePost, EngagementCounts, FeedPage, FollowFacts, InteractionEvent,
    InteractionSummary, InteractionType, PostType, RankedPost, ReadSummary,
};
pub use services::{
    FeedAssembler, FeedRankingEngine, InteractionTracker, ReadStatusTracker, ScoreCalculator,
};
