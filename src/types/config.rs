//! Configuration types for chunking and the service.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{
    DEFAULT_EXPANSION_FACTOR, DEFAULT_MAX_CHUNK_TOKENS, DEFAULT_MIN_CHUNK_TOKENS,
    DEFAULT_OVERHEAD_PER_CHUNK, DEFAULT_TARGET_CHUNK_TOKENS,
};

/// Token budgets for splitting a document into chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Documents below this size are never split
    pub min_chunk_tokens: usize,

    /// Hard cap per chunk (may only be exceeded by a single unsplittable node)
    pub max_chunk_tokens: usize,

    /// Preferred chunk size
    pub target_chunk_tokens: usize,

    /// Tokens reserved per request for instructions and context
    pub overhead_per_chunk: usize,

    /// Multiplier budgeting for target-language text expansion
    pub expansion_factor: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_chunk_tokens: DEFAULT_MIN_CHUNK_TOKENS,
            max_chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            target_chunk_tokens: DEFAULT_TARGET_CHUNK_TOKENS,
            overhead_per_chunk: DEFAULT_OVERHEAD_PER_CHUNK,
            expansion_factor: DEFAULT_EXPANSION_FACTOR,
        }
    }
}

impl ChunkConfig {
    /// Create a config with the given target and max sizes.
    pub fn with_bounds(target: usize, max: usize) -> Self {
        Self {
            target_chunk_tokens: target,
            max_chunk_tokens: max,
            ..Default::default()
        }
    }

    /// Set the minimum size.
    pub fn with_min(mut self, min: usize) -> Self {
        self.min_chunk_tokens = min;
        self
    }

    /// Set the per-chunk overhead.
    pub fn with_overhead(mut self, overhead: usize) -> Self {
        self.overhead_per_chunk = overhead;
        self
    }

    /// Set the expansion factor.
    pub fn with_expansion(mut self, factor: f64) -> Self {
        self.expansion_factor = factor;
        self
    }

    /// Check `0 < min <= target <= max` and a sane expansion factor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_chunk_tokens == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if self.min_chunk_tokens > self.target_chunk_tokens
            || self.target_chunk_tokens > self.max_chunk_tokens
        {
            return Err(ConfigError::BoundsOutOfOrder {
                min: self.min_chunk_tokens,
                target: self.target_chunk_tokens,
                max: self.max_chunk_tokens,
            });
        }
        if !(self.expansion_factor >= 1.0) {
            return Err(ConfigError::ExpansionFactor(self.expansion_factor));
        }
        Ok(())
    }

    /// Token budget for a span of `raw_tokens` source tokens sent as one request.
    pub fn budget(&self, raw_tokens: usize) -> usize {
        ((raw_tokens + self.overhead_per_chunk) as f64 * self.expansion_factor).ceil() as usize
    }
}

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port the HTTP API listens on
    pub port: u16,

    /// Base URL of the translation service
    pub translator_url: Option<String>,

    /// Default chunk budgets for jobs that do not override them
    pub chunk: ChunkConfig,

    /// Maximum concurrently running jobs
    pub max_concurrent_jobs: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3020,
            translator_url: None,
            chunk: ChunkConfig::default(),
            max_concurrent_jobs: 4,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            translator_url: std::env::var("TRANSLATOR_URL").ok(),
            chunk: ChunkConfig {
                min_chunk_tokens: env_or("MIN_CHUNK_TOKENS", DEFAULT_MIN_CHUNK_TOKENS),
                max_chunk_tokens: env_or("MAX_CHUNK_TOKENS", DEFAULT_MAX_CHUNK_TOKENS),
                target_chunk_tokens: env_or("TARGET_CHUNK_TOKENS", DEFAULT_TARGET_CHUNK_TOKENS),
                overhead_per_chunk: env_or("CHUNK_OVERHEAD_TOKENS", DEFAULT_OVERHEAD_PER_CHUNK),
                expansion_factor: env_or("EXPANSION_FACTOR", DEFAULT_EXPANSION_FACTOR),
            },
            max_concurrent_jobs: env_or("MAX_CONCURRENT_JOBS", defaults.max_concurrent_jobs),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
