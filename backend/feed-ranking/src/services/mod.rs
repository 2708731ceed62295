pub mod assembler;
pub mod engine;
pub mod interactions;
pub mod read_status;
pub mod scoring;

pub use assembler::FeedAssembler;
pub use engine::FeedRankingEngine;
pub use interactions::InteractionTracker;
pub use read_status::ReadStatusTracker;
pub use scoring::ScoreCalculator;
