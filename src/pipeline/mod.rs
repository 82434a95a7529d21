//! Translation pipeline: orchestration, merging and the translator seam.

pub mod merger;
pub mod orchestrator;
pub mod progress;
pub mod translator;

pub use merger::ChunkMerger;
pub use orchestrator::{PipelineRun, TranslationOrchestrator};
pub use progress::{CancellationToken, NoopProgress, ProgressEvent, ProgressObserver, ProgressStatus};
pub use translator::{ChunkTranslator, TranslateChunkParams, TranslatedChunk, TranslationContext};
