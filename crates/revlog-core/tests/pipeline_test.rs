//! Integration tests for the training pipeline.
//!
//! The engine is mocked so these tests pin down what reaches the engine
//! boundary and when it is called at all.

use mockall::mock;
use revlog_core::{
    ErrorCode, MemoryState, NextStates, ParsedLog, Pipeline, PipelineConfig, PipelineStage,
    RevlogError, RevlogResult, SchedulingEngine, TrainingBatch,
};

mock! {
    pub Engine {}

    impl SchedulingEngine for Engine {
        fn compute_parameters(&mut self, batch: &TrainingBatch) -> RevlogResult<Vec<f32>>;

        fn next_states(
            &self,
            memory: Option<MemoryState>,
            desired_retention: f32,
            elapsed_days: u32,
        ) -> RevlogResult<NextStates>;
    }
}

const HEADER: &str = "card_id,review_time,review_rating,review_state";
const DAY_MS: i64 = 86_400_000;

/// Build a CSV log from `(card, day, rating, state)` rows.
fn csv(rows: &[(&str, i64, u8, u8)]) -> String {
    let mut out = format!("{HEADER}\n");
    for (card, day, rating, state) in rows {
        out.push_str(&format!("{card},{},{rating},{state}\n", day * DAY_MS));
    }
    out
}

/// One card that relapsed (new, review, learning, review) and one card
/// reviewed twice on the same day.
fn relapse_log() -> String {
    csv(&[
        ("1", 0, 3, 0),
        ("2", 20, 3, 0),
        ("1", 3, 3, 2),
        ("1", 10, 1, 1),
        ("2", 20, 3, 1),
        ("1", 15, 3, 2),
    ])
}

#[test]
fn test_end_to_end_only_trimmed_relapse_reaches_engine() {
    let mut engine = MockEngine::new();
    engine
        .expect_compute_parameters()
        .times(1)
        .withf(|batch| {
            batch.len() == 1
                && batch.contributing_entities() == 1
                && batch.get(0).map(|s| s.deltas()) == Some(vec![0, 5])
        })
        .returning(|_| Ok(vec![0.4, 1.2, 3.1]));

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let report = pipeline.run_str(&relapse_log(), &mut engine).unwrap();

    assert_eq!(pipeline.stage(), PipelineStage::Released);
    assert_eq!(report.parameters, vec![0.4, 1.2, 3.1]);
    assert_eq!(report.summary.records, 6);
    assert_eq!(report.summary.entities, 2);
    assert_eq!(report.summary.trainable_entities, 1);
    assert_eq!(report.summary.sequences, 1);
}

#[test]
fn test_engine_failure_is_returned_unchanged() {
    let mut engine = MockEngine::new();
    engine.expect_compute_parameters().times(1).returning(|_| {
        Err(RevlogError::engine_message(
            ErrorCode::EngTrainingFailed,
            "loss became NaN",
        ))
    });

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline.run_str(&relapse_log(), &mut engine).unwrap_err();

    assert_eq!(err.code(), ErrorCode::EngTrainingFailed);
    assert!(err.to_string().contains("loss became NaN"));
    assert_eq!(pipeline.stage(), PipelineStage::Released);
}

#[test]
fn test_header_only_log_never_reaches_engine() {
    let mut engine = MockEngine::new();
    engine.expect_compute_parameters().never();

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline
        .run_str(&format!("{HEADER}\n"), &mut engine)
        .unwrap_err();

    assert!(matches!(err, RevlogError::EmptyInput));
    assert!(err.halts_before_engine());
    assert_eq!(pipeline.stage(), PipelineStage::Aborted);
}

#[test]
fn test_manually_built_empty_log_is_empty_input() {
    let mut engine = MockEngine::new();
    engine.expect_compute_parameters().never();

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline.run(ParsedLog::default(), &mut engine).unwrap_err();
    assert!(matches!(err, RevlogError::EmptyInput));
}

#[test]
fn test_untrainable_log_never_reaches_engine() {
    let mut engine = MockEngine::new();
    engine.expect_compute_parameters().never();

    // Review-only history, a same-day pair, and a malformed record.
    let input = format!(
        "{}3,oops,3,0\n",
        csv(&[("1", 0, 3, 2), ("1", 9, 3, 2), ("2", 4, 1, 0), ("2", 4, 3, 1)])
    );

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline.run_str(&input, &mut engine).unwrap_err();

    assert!(matches!(err, RevlogError::NoTrainableSequences { entities: 2 }));
    assert_eq!(err.code(), ErrorCode::InNoTrainable);
    assert_eq!(pipeline.stage(), PipelineStage::Aborted);
}

#[test]
fn test_all_malformed_records_are_not_trainable() {
    let mut engine = MockEngine::new();
    engine.expect_compute_parameters().never();

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline
        .run_str(&format!("{HEADER}\n1,yesterday,3,0\n1,2,7,0\n"), &mut engine)
        .unwrap_err();

    assert!(matches!(err, RevlogError::NoTrainableSequences { entities: 0 }));
}

#[test]
fn test_prepare_is_deterministic_across_modes() {
    let rows: Vec<(String, i64, u8, u8)> = (0..50)
        .flat_map(|card| {
            let id = format!("c{card}");
            let rating = (card % 4) as u8 + 1;
            vec![
                (id.clone(), 0, rating, 0),
                (id.clone(), card % 4, 3, 1),
                (id.clone(), card % 4 + 2, 5 - rating, 2),
                (id, 30, 4, 2),
            ]
        })
        .collect();
    let borrowed: Vec<(&str, i64, u8, u8)> =
        rows.iter().map(|(c, d, r, s)| (c.as_str(), *d, *r, *s)).collect();
    let input = csv(&borrowed);

    // Each sequence as (elapsed_days, rating) pairs, sorted across the batch.
    let sorted_contents = |parallel: bool| {
        let config = PipelineConfig::builder().parallel(parallel).build().unwrap();
        let batch = Pipeline::new(config).prepare_str(&input).unwrap().into_batch();
        let mut sequences: Vec<Vec<(u32, u32)>> = batch
            .iter()
            .map(|s| {
                s.steps()
                    .iter()
                    .map(|step| (step.elapsed_days, step.grade.to_rating()))
                    .collect()
            })
            .collect();
        sequences.sort();
        (sequences, batch.contributing_entities())
    };

    let sequential = sorted_contents(false);
    assert_eq!(sequential, sorted_contents(true));
    assert_eq!(sequential, sorted_contents(false));
    assert_eq!(sequential.1, 50);
}
