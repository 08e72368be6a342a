//! Integration tests for the pseudo-labelling round.

use anyhow::bail;
use pseudo_labeller::config::{ModelConfig, ModelType, PseudoLabelConfig};
use pseudo_labeller::math::Array2;
use pseudo_labeller::models::{build_model, KnnModel, Model};
use pseudo_labeller::{Dataset, PseudoLabelError, PseudoLabeller};

/// Linear model `y = slope * x0` that records the row count of every fit.
#[derive(Debug, Clone, PartialEq, Default)]
struct RecordingModel {
    slope: f32,
    fit_rows: Vec<usize>,
    fail_on_fit: Option<usize>,
}

impl Model for RecordingModel {
    fn fit(&mut self, features: &Dataset, targets: &Dataset) -> anyhow::Result<()> {
        if self.fail_on_fit == Some(self.fit_rows.len() + 1) {
            bail!("refusing fit #{}", self.fit_rows.len() + 1);
        }
        let x = features.values().column(0);
        let y = targets.values().column(0);
        let xx: f32 = x.iter().map(|v| v * v).sum();
        let xy: f32 = x.iter().zip(&y).map(|(a, b)| a * b).sum();
        self.slope = if xx == 0.0 { 0.0 } else { xy / xx };
        self.fit_rows.push(features.len());
        Ok(())
    }

    fn predict(&self, features: &Dataset) -> anyhow::Result<Array2<f32>> {
        Ok(features.values().select_columns(&[0]).mapv(|v| v * self.slope))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn labelled(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|i| vec![i as f32, (i % 7) as f32, 2.0 * i as f32])
        .collect();
    Dataset::from_rows(["x0", "x1", "y"], rows).unwrap()
}

/// Unlabelled rows carry an extra id column and no target column.
fn unlabelled(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|i| vec![1000.0 + i as f32, (i % 5) as f32, i as f32 + 0.5])
        .collect();
    Dataset::from_rows(["row_id", "x1", "x0"], rows).unwrap()
}

fn config(rate: f64) -> PseudoLabelConfig {
    PseudoLabelConfig::new(["x0", "x1"], ["y"]).with_sample_rate(rate)
}

// ---------------------------------------------------------------------------
// Sizes and schema
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_100_labelled_50_unlabelled() {
    let labelled = labelled(100);
    let unlabelled = unlabelled(50);
    let mut model = RecordingModel::default();

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.2)).unwrap();
    assert_eq!(labeller.num_samples(), 10);
    labeller.fit().unwrap();

    assert_eq!(model.fit_rows, vec![100, 110]);
    assert!((model.slope - 2.0).abs() < 1e-4);
}

#[test]
fn combined_rows_follow_floor_of_rate() {
    let labelled = labelled(20);
    let unlabelled = unlabelled(33);

    for rate in [0.01, 0.1, 0.25, 0.5, 0.77, 0.99, 1.0] {
        let mut model = RecordingModel::default();
        let mut labeller =
            PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(rate)).unwrap();
        let expected = (33.0 * rate).floor() as usize;
        assert_eq!(labeller.num_samples(), expected, "rate {}", rate);

        let combined = labeller.create_pseudo_labelled_set().unwrap();
        assert_eq!(combined.len(), 20 + expected, "rate {}", rate);
    }
}

#[test]
fn combined_schema_matches_labelled_schema() {
    let labelled = labelled(10);
    let unlabelled = unlabelled(10);
    let mut model = RecordingModel::default();

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5)).unwrap();
    let combined = labeller.create_pseudo_labelled_set().unwrap();

    assert_eq!(combined.columns(), labelled.columns());
    assert!(!combined.has_column("row_id"));
}

#[test]
fn pseudo_labelled_rows_carry_model_predictions() {
    let labelled = labelled(10);
    let unlabelled = unlabelled(8);
    let mut model = RecordingModel::default();

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(1.0)).unwrap();
    let combined = labeller.create_pseudo_labelled_set().unwrap();

    for row in 10..combined.len() {
        let values = combined.row(row);
        assert!((values[2] - 2.0 * values[0]).abs() < 1e-3);
    }
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[test]
fn zero_rate_returns_labelled_rows_unchanged() {
    let labelled = labelled(12);
    let unlabelled = unlabelled(40);
    let mut model = RecordingModel::default();

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.0)).unwrap();
    assert_eq!(labeller.num_samples(), 0);
    let combined = labeller.create_pseudo_labelled_set().unwrap();
    assert_eq!(combined, labelled);
}

#[test]
fn full_rate_uses_every_unlabelled_row() {
    let labelled = labelled(5);
    let unlabelled = unlabelled(9);
    let mut model = RecordingModel::default();

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(1.0)).unwrap();
    let combined = labeller.create_pseudo_labelled_set().unwrap();
    assert_eq!(combined.len(), 14);

    let mut pseudo_x0: Vec<f32> = combined.column("x0").unwrap()[5..].to_vec();
    pseudo_x0.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(pseudo_x0, unlabelled.column("x0").unwrap());
}

#[test]
fn empty_unlabelled_data_still_refits() {
    let labelled = labelled(6);
    let unlabelled = unlabelled(0);
    let mut model = RecordingModel::default();

    PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5))
        .unwrap()
        .fit()
        .unwrap();
    assert_eq!(model.fit_rows, vec![6, 6]);
}

// ---------------------------------------------------------------------------
// Determinism and purity
// ---------------------------------------------------------------------------

#[test]
fn same_seed_gives_identical_model_state() {
    let labelled = labelled(30);
    let unlabelled = unlabelled(60);

    let run = || {
        let mut model = KnnModel::new(3);
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.25))
            .unwrap()
            .fit()
            .unwrap();
        model
    };

    let first = run();
    let second = run();
    assert_eq!(first.n_train(), 30 + 15);
    assert_eq!(first, second);
}

#[test]
fn repeated_fit_on_one_orchestrator_is_stable() {
    let labelled = labelled(30);
    let unlabelled = unlabelled(60);
    let mut model = KnnModel::new(3);
    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.25)).unwrap();

    let first = labeller.create_pseudo_labelled_set().unwrap();
    let second = labeller.create_pseudo_labelled_set().unwrap();
    assert_eq!(first, second);
}

#[test]
fn get_params_does_not_mutate_anything() {
    let labelled = labelled(10);
    let unlabelled = unlabelled(20);
    let labelled_before = labelled.clone();
    let unlabelled_before = unlabelled.clone();
    let mut model = RecordingModel {
        slope: 3.0,
        ..Default::default()
    };
    let model_before = model.clone();

    {
        let labeller =
            PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5)).unwrap();
        let params = labeller.get_params();
        assert_eq!(params.features, ["x0", "x1"]);
        assert_eq!(params.target, ["y"]);
        assert_eq!(params.sample_rate, 0.5);
        assert_eq!(params.labelled_len, 10);
        assert_eq!(params.unlabelled_len, 20);
        assert_eq!(params.shuffle_seed, 42);
        assert_eq!(params.model.slope, 3.0);
        let _ = labeller.get_params().to_map();
    }

    assert_eq!(labelled, labelled_before);
    assert_eq!(unlabelled, unlabelled_before);
    assert_eq!(model, model_before);
}

#[test]
fn fit_never_mutates_caller_datasets() {
    let labelled = labelled(10);
    let unlabelled = unlabelled(20);
    let unlabelled_before = unlabelled.clone();
    let mut model = RecordingModel::default();

    PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5))
        .unwrap()
        .fit()
        .unwrap();
    assert_eq!(unlabelled, unlabelled_before);
    assert!(!unlabelled.has_column("y"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_labelled_column_fails_construction() {
    let labelled = labelled(4);
    let unlabelled = unlabelled(4);
    let mut model = RecordingModel::default();
    let cfg = PseudoLabelConfig::new(["x0", "nope"], ["y"]);

    let err = PseudoLabeller::new(&mut model, &labelled, &unlabelled, cfg).err().unwrap();
    assert!(matches!(err, PseudoLabelError::MissingColumn(c) if c == "nope"));
}

#[test]
fn out_of_range_rate_fails_construction() {
    let labelled = labelled(4);
    let unlabelled = unlabelled(4);
    let mut model = RecordingModel::default();

    let err = PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(1.5))
        .err()
        .unwrap();
    assert!(matches!(err, PseudoLabelError::InvalidSampleRate(r) if r == 1.5));
}

#[test]
fn missing_unlabelled_feature_fails_construction() {
    let labelled = labelled(4);
    let unlabelled = unlabelled(4).select(&["x0"]).unwrap();
    let mut model = RecordingModel::default();

    let err = PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5))
        .err()
        .unwrap();
    assert!(matches!(err, PseudoLabelError::MissingColumn(c) if c == "x1"));
    assert!(model.fit_rows.is_empty());
}

#[test]
fn labelled_only_id_column_fails_before_any_fit() {
    let labelled = Dataset::from_rows(
        ["id", "x0", "y"],
        (0..6).map(|i| vec![i as f32, i as f32, 2.0 * i as f32]).collect(),
    )
    .unwrap();
    let unlabelled = unlabelled(4).select(&["x0"]).unwrap();
    let mut model = RecordingModel::default();
    let cfg = PseudoLabelConfig::new(["x0"], ["y"]);

    let err = PseudoLabeller::new(&mut model, &labelled, &unlabelled, cfg).err().unwrap();
    assert!(matches!(err, PseudoLabelError::MissingColumn(c) if c == "id"));
    assert!(model.fit_rows.is_empty());
}

#[test]
fn failed_refit_keeps_first_fit_state() {
    let labelled = labelled(10);
    let unlabelled = unlabelled(10);
    let mut model = RecordingModel {
        fail_on_fit: Some(2),
        ..Default::default()
    };

    let err = PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5))
        .unwrap()
        .fit()
        .err()
        .unwrap();
    match err {
        PseudoLabelError::Model { model, stage, .. } => {
            assert_eq!(model, "recording");
            assert_eq!(stage, "refit");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(model.fit_rows, vec![10]);
    assert!((model.slope - 2.0).abs() < 1e-4);
}

// ---------------------------------------------------------------------------
// Factory models
// ---------------------------------------------------------------------------

#[test]
fn boxed_factory_model_can_be_driven() {
    let labelled = labelled(40);
    let unlabelled = unlabelled(20);
    let mut model = build_model(ModelConfig::new(0.1, ModelType::KNN { k: 2 }));

    let mut labeller =
        PseudoLabeller::new(&mut model, &labelled, &unlabelled, config(0.5)).unwrap();
    labeller.fit().unwrap();
    assert_eq!(labeller.get_params().to_map()["Model"], "knn");
}
