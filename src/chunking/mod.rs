//! Document chunking: token estimation, linearization and planning.

pub mod linearizer;
pub mod planner;
mod tokens;

pub use linearizer::{
    join_segments, BoundaryType, DocumentLinearizer, LinearProjection, Segment, BLOCK_SEPARATOR,
};
pub use planner::{complexity_penalty, ChunkPlan, ChunkPlanner};
pub use tokens::{estimate_tokens, HeuristicTokenCounter, TokenCounter};
