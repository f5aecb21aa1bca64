//! End-to-end training pipeline.
//!
//! Drives one run through its stages:
//! `Idle → Parsing → Grouping → Trimming → Expanding → Collected → Training → Released`.
//! A failure before `Training` moves the run to `Aborted` and the engine is
//! never called. The batch is handed to the engine by value and dropped as
//! soon as the call returns, whether it succeeded or not.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::engine::SchedulingEngine;
use crate::error::{RevlogError, RevlogResult};
use crate::ingest::{parse_revlog_str, IngestStats, ParsedLog};
use crate::sequence::{BatchCollector, TrainingBatch};
use crate::timeline::{build_timelines, trim_to_last_learning, Timeline};

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Parsing,
    Grouping,
    Trimming,
    Expanding,
    Collected,
    Training,
    Released,
    Aborted,
}

/// Counts gathered while preparing a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreparationSummary {
    /// Data records in the log.
    pub records: u64,
    /// Malformed records skipped.
    pub skipped_records: u64,
    /// Distinct cards.
    pub entities: usize,
    /// Cards left with no events after trimming.
    pub trimmed_entities: usize,
    /// Cards that produced at least one sequence.
    pub trainable_entities: usize,
    /// Training sequences in the batch.
    pub sequences: usize,
}

/// A collected batch, ready to be handed to the engine.
#[derive(Debug)]
pub struct PreparedBatch {
    pub summary: PreparationSummary,
    batch: TrainingBatch,
}

impl PreparedBatch {
    pub fn batch(&self) -> &TrainingBatch {
        &self.batch
    }

    /// Take the batch out, e.g. to inspect it without training.
    pub fn into_batch(self) -> TrainingBatch {
        self.batch
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub summary: PreparationSummary,
    pub parameters: Vec<f32>,
    pub training_secs: f64,
}

/// One pipeline run.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    stage: PipelineStage,
    history: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stage: PipelineStage::Idle,
            history: vec![PipelineStage::Idle],
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Every stage the run has entered, starting with `Idle`.
    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
        self.history.push(next);
    }

    fn abort<T>(&mut self, err: RevlogError) -> RevlogResult<T> {
        warn!(stage = %self.stage, error = %err, "Pipeline run aborted");
        self.stage = PipelineStage::Aborted;
        self.history.push(PipelineStage::Aborted);
        Err(err)
    }

    /// Parse an in-memory log and prepare its batch.
    pub fn prepare_str(&mut self, input: &str) -> RevlogResult<PreparedBatch> {
        self.advance(PipelineStage::Parsing);
        match parse_revlog_str(input, &self.config) {
            Ok(log) => self.prepare(log),
            Err(e) => self.abort(e),
        }
    }

    /// Group, trim and expand parsed events into a training batch.
    ///
    /// A log parsed outside the pipeline still passes through `Parsing`.
    pub fn prepare(&mut self, log: ParsedLog) -> RevlogResult<PreparedBatch> {
        if self.stage == PipelineStage::Idle {
            self.advance(PipelineStage::Parsing);
        }
        let ParsedLog { events, stats } = log;
        debug!(events = events.len(), records = stats.total, "Preparing training batch");
        if stats.total == 0 {
            return self.abort(RevlogError::EmptyInput);
        }

        self.advance(PipelineStage::Grouping);
        let timelines = build_timelines(events).into_timelines();
        let entities = timelines.len();

        self.advance(PipelineStage::Trimming);
        let trimmed = self.trim_all(timelines);
        let trimmed_entities = trimmed.iter().filter(|t| t.is_empty()).count();

        self.advance(PipelineStage::Expanding);
        let batch = BatchCollector::new(self.config.parallel).collect(&trimmed);
        drop(trimmed);

        if batch.is_empty() {
            return self.abort(RevlogError::NoTrainableSequences { entities });
        }

        self.advance(PipelineStage::Collected);
        let summary = summarize(&stats, entities, trimmed_entities, &batch);
        info!(
            entities = summary.entities,
            trimmed = summary.trimmed_entities,
            trainable = summary.trainable_entities,
            sequences = summary.sequences,
            "Prepared training batch"
        );

        Ok(PreparedBatch { summary, batch })
    }

    fn trim_all(&self, timelines: Vec<Timeline>) -> Vec<Timeline> {
        if self.config.parallel {
            timelines.into_par_iter().map(trim_to_last_learning).collect()
        } else {
            timelines.into_iter().map(trim_to_last_learning).collect()
        }
    }

    /// Hand a prepared batch to the engine and fit parameters.
    ///
    /// Engine failures are returned unchanged; the batch is released either way.
    pub fn train<E: SchedulingEngine>(
        &mut self,
        prepared: PreparedBatch,
        engine: &mut E,
    ) -> RevlogResult<TrainingReport> {
        let PreparedBatch { summary, batch } = prepared;

        self.advance(PipelineStage::Training);
        debug!(sequences = summary.sequences, "Handing batch to engine");
        let started = Instant::now();
        let result = engine.compute_parameters(&batch);
        let training_secs = started.elapsed().as_secs_f64();
        drop(batch);
        self.advance(PipelineStage::Released);

        match result {
            Ok(parameters) => {
                info!(
                    parameters = parameters.len(),
                    secs = training_secs,
                    "Parameter optimization finished"
                );
                Ok(TrainingReport {
                    summary,
                    parameters,
                    training_secs,
                })
            }
            Err(e) => {
                warn!(error = %e, "Parameter optimization failed");
                Err(e)
            }
        }
    }

    /// Prepare and train in one call.
    pub fn run<E: SchedulingEngine>(
        &mut self,
        log: ParsedLog,
        engine: &mut E,
    ) -> RevlogResult<TrainingReport> {
        let prepared = self.prepare(log)?;
        self.train(prepared, engine)
    }

    /// Parse, prepare and train an in-memory log.
    pub fn run_str<E: SchedulingEngine>(
        &mut self,
        input: &str,
        engine: &mut E,
    ) -> RevlogResult<TrainingReport> {
        let prepared = self.prepare_str(input)?;
        self.train(prepared, engine)
    }
}

fn summarize(
    stats: &IngestStats,
    entities: usize,
    trimmed_entities: usize,
    batch: &TrainingBatch,
) -> PreparationSummary {
    PreparationSummary {
        records: stats.total,
        skipped_records: stats.skipped,
        entities,
        trimmed_entities,
        trainable_entities: batch.contributing_entities(),
        sequences: batch.len(),
    }
}
