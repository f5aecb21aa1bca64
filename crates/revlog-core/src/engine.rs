//! Boundary to the external scheduling engine.
//!
//! The memory model and its optimizer live in the `fsrs` crate. This module
//! only converts between our types and theirs and maps failures into
//! [`RevlogError::Engine`]; failures are never replaced with defaults.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{ErrorCode, RevlogError, RevlogResult};
use crate::sequence::TrainingBatch;
use crate::types::{MemoryState, NextStates};

/// Scheduling engine used for parameter fitting and next-state inference.
pub trait SchedulingEngine {
    /// Fit model parameters to a training batch.
    fn compute_parameters(&mut self, batch: &TrainingBatch) -> RevlogResult<Vec<f32>>;

    /// Candidate states after the next review, one per grade.
    ///
    /// `memory` is `None` for a card that has never been reviewed.
    fn next_states(
        &self,
        memory: Option<MemoryState>,
        desired_retention: f32,
        elapsed_days: u32,
    ) -> RevlogResult<NextStates>;
}

/// [`SchedulingEngine`] backed by `fsrs::FSRS`.
pub struct FsrsEngine {
    inner: fsrs::FSRS,
    enable_short_term: bool,
    num_relearning_steps: Option<usize>,
}

impl std::fmt::Debug for FsrsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsrsEngine")
            .field("enable_short_term", &self.enable_short_term)
            .field("num_relearning_steps", &self.num_relearning_steps)
            .finish_non_exhaustive()
    }
}

impl FsrsEngine {
    /// Create an engine. An empty slice requests the engine's default state,
    /// which is what parameter fitting starts from.
    pub fn new(parameters: &[f32]) -> RevlogResult<Self> {
        let params = if parameters.is_empty() {
            None
        } else {
            Some(parameters)
        };
        let inner = fsrs::FSRS::new(params)
            .map_err(|e| RevlogError::engine(ErrorCode::EngInitFailed, e))?;

        debug!(parameters = parameters.len(), "Created FSRS engine");
        Ok(Self {
            inner,
            enable_short_term: true,
            num_relearning_steps: None,
        })
    }

    /// Create an engine with the crate's published default parameters.
    pub fn with_default_parameters() -> RevlogResult<Self> {
        Self::new(&fsrs::DEFAULT_PARAMETERS)
    }

    /// Create an engine and take the training options from `config`.
    pub fn from_config(parameters: &[f32], config: &PipelineConfig) -> RevlogResult<Self> {
        Ok(Self::new(parameters)?
            .with_short_term(config.enable_short_term)
            .with_relearning_steps(config.num_relearning_steps))
    }

    pub fn with_short_term(mut self, enable: bool) -> Self {
        self.enable_short_term = enable;
        self
    }

    pub fn with_relearning_steps(mut self, steps: Option<usize>) -> Self {
        self.num_relearning_steps = steps;
        self
    }
}

impl SchedulingEngine for FsrsEngine {
    fn compute_parameters(&mut self, batch: &TrainingBatch) -> RevlogResult<Vec<f32>> {
        if batch.is_empty() {
            return Err(RevlogError::engine_message(
                ErrorCode::EngTrainingFailed,
                "training batch is empty",
            ));
        }

        info!(items = batch.len(), "Optimizing FSRS parameters");
        let input = fsrs::ComputeParametersInput {
            train_set: batch.to_fsrs_items(),
            progress: None,
            enable_short_term: self.enable_short_term,
            num_relearning_steps: self.num_relearning_steps,
        };

        self.inner
            .compute_parameters(input)
            .map_err(|e| RevlogError::engine(ErrorCode::EngTrainingFailed, e))
    }

    fn next_states(
        &self,
        memory: Option<MemoryState>,
        desired_retention: f32,
        elapsed_days: u32,
    ) -> RevlogResult<NextStates> {
        if !(desired_retention > 0.0 && desired_retention <= 1.0) {
            return Err(RevlogError::engine_message(
                ErrorCode::EngInferenceFailed,
                format!("desired retention {desired_retention} is outside (0, 1]"),
            ));
        }

        self.inner
            .next_states(memory.map(MemoryState::to_fsrs), desired_retention, elapsed_days)
            .map(NextStates::from_fsrs)
            .map_err(|e| RevlogError::engine(ErrorCode::EngInferenceFailed, e))
    }
}

/// Format parameters as `[0.40255, 1.18385, ...]` with five decimals.
pub fn format_parameters(parameters: &[f32]) -> String {
    let body = parameters
        .iter()
        .map(|p| format!("{p:.5}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{body}]")
}

/// Fitted parameters as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFile {
    pub parameters: Vec<f32>,
    /// Number of training sequences the parameters were fitted on.
    pub sequences: usize,
    pub trained_at: DateTime<Utc>,
}

impl ParameterFile {
    pub fn new(parameters: Vec<f32>, sequences: usize) -> Self {
        Self {
            parameters,
            sequences,
            trained_at: Utc::now(),
        }
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> RevlogResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a parameter file. A bare JSON array of numbers is also accepted.
    pub fn load(path: impl AsRef<Path>) -> RevlogResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(file) => Ok(file),
            Err(_) => {
                let parameters: Vec<f32> = serde_json::from_str(&content)?;
                Ok(Self::new(parameters, 0))
            }
        }
    }
}
