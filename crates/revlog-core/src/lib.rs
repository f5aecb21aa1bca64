//! revlog-core - Turn FSRS review logs into training data.
//!
//! This crate reads a review log, groups it into per-card timelines, trims
//! each timeline to its last learning block, expands the result into
//! training sequences and hands the batch to an FSRS engine.
//!
//! # Example
//!
//! ```ignore
//! use revlog_core::{read_revlog_file, FsrsEngine, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let log = read_revlog_file("revlog.csv", &config).await?;
//!
//! let mut engine = FsrsEngine::from_config(&[], &config)?;
//! let report = Pipeline::new(config).run(log, &mut engine)?;
//! println!("{}", revlog_core::format_parameters(&report.parameters));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod scheduler;
pub mod sequence;
pub mod time;
pub mod timeline;
pub mod types;

// Re-export commonly used types
pub use config::{default_config_path, PipelineConfig};
pub use engine::{format_parameters, FsrsEngine, ParameterFile, SchedulingEngine};
pub use error::{ErrorCode, RevlogError, RevlogResult};
pub use ingest::{parse_revlog_str, read_revlog, read_revlog_file, IngestStats, ParsedLog};
pub use pipeline::{Pipeline, PipelineStage, PreparationSummary, PreparedBatch, TrainingReport};
pub use scheduler::{ScheduledReview, Scheduler};
pub use sequence::{BatchCollector, ReviewStep, TrainingBatch, TrainingSequence};
pub use time::DayBoundary;
pub use timeline::{build_timelines, trim_to_last_learning, Timeline, TimelineSet};
pub use types::{Grade, ItemState, MemoryState, NextStates, Phase, ReviewEvent};
