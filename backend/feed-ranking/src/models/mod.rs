use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content type of a gratitude post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PostType {
    Photo,
    DailyGratitude,
    Spontaneous,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Photo => "photo",
            PostType::DailyGratitude => "daily_gratitude",
            PostType::Spontaneous => "spontaneous",
        }
    }
}

/// Raw engagement counts for a post, supplied by storage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub hearts: u32,
    pub reactions: u32,
    pub shares: u32,
}

/// Follow-graph facts between the viewer and a post's author,
/// resolved by the graph layer before ranking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FollowFacts {
    /// Viewer directly follows the author.
    pub following: bool,
    /// When the follow was created, if known.
    pub followed_since: Option<DateTime<Utc>>,
    /// Both directions of the follow edge exist.
    pub mutual: bool,
    /// Author is followed by someone the viewer follows,
    /// without a direct follow edge.
    pub second_tier: bool,
}

/// Read-only view of a post for scoring.
///
/// Everything the scorer needs is resolved up front; scoring itself
/// performs no data access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_type: PostType,
    pub created_at: DateTime<Utc>,
    pub counts: EngagementCounts,
    /// Post body mentions the viewer.
    pub mentions_viewer: bool,
    pub follow: FollowFacts,
}

/// Candidate post plus its computed score. Ephemeral, recomputed on
/// every feed request and never persisted.
#[derive(Debug, Clone)]
pub struct RankedPost {
    pub post: CandidatePost,
    pub algorithm_score: f64,
}

impl RankedPost {
    /// The (post id, score) pair consumed by the response layer.
    pub fn id_and_score(&self) -> (Uuid, f64) {
        (self.post.id, self.algorithm_score)
    }
}

/// One page of an assembled feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<RankedPost>,
    /// Candidate count before pagination.
    pub total_count: usize,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            total_count: 0,
        }
    }
}

/// User-to-user interaction kinds tracked for preference learning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InteractionType {
    Heart,
    Reaction,
    Share,
    Follow,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Heart => "heart",
            InteractionType::Reaction => "reaction",
            InteractionType::Share => "share",
            InteractionType::Follow => "follow",
        }
    }
}

/// Append-only interaction record. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub viewer_id: Uuid,
    pub author_id: Uuid,
    pub kind: InteractionType,
    pub weight: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Per-viewer interaction aggregation for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionSummary {
    pub total: usize,
    /// Events within the last 7 days.
    pub recent: usize,
    pub hearts: usize,
    pub reactions: usize,
    pub shares: usize,
    pub follows: usize,
    /// Authors the viewer has interacted with at or above the
    /// preference threshold.
    pub frequent_author_count: usize,
}

/// Per-viewer read-mark aggregation for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadSummary {
    pub read_count: usize,
    /// Marks created within the last hour.
    pub recent_reads: usize,
}
