//! Feed assembly pipeline.
//!
//! Orchestrates scoring and the reorder stages into a paginated feed:
//! score + sort, author-diversity cap, content-type balancing, bounded
//! randomization, same-author spacing, then pagination. Assembly never
//! fails its caller: a systemic error degrades to chronological order and
//! an empty candidate set yields an empty page with total 0.

pub mod diversity;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AlgorithmConfig;
use crate::error::{RankingError, Result};
use crate::models::{CandidatePost, FeedPage, RankedPost};
use crate::services::interactions::InteractionTracker;
use crate::services::read_status::ReadStatusTracker;
use crate::services::scoring::{ScoreCalculator, MIN_SCORE};

use diversity::{apply_author_diversity, apply_spacing, apply_type_balance};

pub struct FeedAssembler {
    config: Arc<AlgorithmConfig>,
    scorer: ScoreCalculator,
    /// Fixed RNG seed for reproducible tests; production uses entropy.
    rng_seed: Option<u64>,
}

impl FeedAssembler {
    pub fn new(
        config: Arc<AlgorithmConfig>,
        interactions: Arc<InteractionTracker>,
        read_status: Arc<ReadStatusTracker>,
    ) -> Self {
        let scorer = ScoreCalculator::new(Arc::clone(&config), interactions, read_status);
        Self {
            config,
            scorer,
            rng_seed: None,
        }
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Assemble one page of a viewer's feed.
    ///
    /// Returns the requested page plus the candidate count before
    /// pagination. With `algorithm_enabled` off, candidates are ordered
    /// chronologically and every other stage is bypassed.
    pub async fn assemble(
        &self,
        candidates: Vec<CandidatePost>,
        viewer_id: Uuid,
        page_size: usize,
        offset: usize,
        algorithm_enabled: bool,
        read_status_enabled: bool,
    ) -> FeedPage {
        if candidates.is_empty() {
            return FeedPage::empty();
        }

        let total_count = candidates.len();
        let now = Utc::now();

        let ordered = if algorithm_enabled {
            match self.ranked_pipeline(&candidates, viewer_id, now, read_status_enabled) {
                Ok(ranked) => ranked,
                Err(e) => {
                    warn!(
                        viewer_id = %viewer_id,
                        error = %e,
                        "ranking pipeline failed, falling back to chronological order"
                    );
                    chronological(candidates)
                }
            }
        } else {
            chronological(candidates)
        };

        debug!(
            viewer_id = %viewer_id,
            total = total_count,
            page_size,
            offset,
            algorithm_enabled,
            "feed assembled"
        );

        let posts = ordered.into_iter().skip(offset).take(page_size).collect();

        FeedPage { posts, total_count }
    }

    fn ranked_pipeline(
        &self,
        candidates: &[CandidatePost],
        viewer_id: Uuid,
        now: DateTime<Utc>,
        read_status_enabled: bool,
    ) -> Result<Vec<RankedPost>> {
        let limits = &self.config.diversity_limits;

        let ranked = self
            .scorer
            .score_batch(candidates, viewer_id, now, read_status_enabled);
        if ranked.is_empty() {
            return Err(RankingError::Assembly(
                "scoring produced no ranked posts".into(),
            ));
        }

        let mut ordered = apply_type_balance(
            apply_author_diversity(ranked, limits.max_posts_per_author),
            limits.max_type_share,
        );
        self.apply_randomization(&mut ordered, limits.randomization_factor);

        Ok(apply_spacing(ordered))
    }

    /// Perturb each score by ±`factor` (uniform) and swap neighbors whose
    /// perturbed keys land out of order. A pair is only considered when its
    /// unperturbed scores are true near-ties, i.e. close enough that the
    /// jitter could order them either way; larger gaps keep their slots,
    /// which also leaves the diversity stages' deferrals where they were
    /// placed. Stored scores stay untouched.
    fn apply_randomization(&self, posts: &mut [RankedPost], factor: f64) {
        if factor <= 0.0 || posts.len() < 2 {
            return;
        }

        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        for i in 0..posts.len() - 1 {
            let a = posts[i].algorithm_score;
            let b = posts[i + 1].algorithm_score;
            if (a - b).abs() > factor * a.max(b) {
                continue;
            }

            let key_a = a * (1.0 + rng.gen_range(-factor..=factor));
            let key_b = b * (1.0 + rng.gen_range(-factor..=factor));
            if key_b > key_a {
                posts.swap(i, i + 1);
            }
        }
    }
}

/// Strict creation-time ordering, newest first. Used both as the
/// `algorithm_enabled = false` path and as the degraded mode when ranking
/// fails outright.
fn chronological(candidates: Vec<CandidatePost>) -> Vec<RankedPost> {
    let mut posts: Vec<RankedPost> = candidates
        .into_iter()
        .map(|post| RankedPost {
            post,
            algorithm_score: MIN_SCORE,
        })
        .collect();

    posts.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
    posts
}
