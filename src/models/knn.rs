use anyhow::ensure;

use crate::data_handling::Dataset;
use crate::math::Array2;
use crate::models::model_trait::Model;

/// k-nearest-neighbours regressor.
///
/// Stores the training rows and predicts the mean target of the `k` closest
/// rows by Euclidean distance. Ties are broken by training row order, so
/// predictions are fully deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnModel {
    k: usize,
    train_x: Option<Array2<f32>>,
    train_y: Option<Array2<f32>>,
}

impl KnnModel {
    pub fn new(k: usize) -> Self {
        KnnModel {
            k,
            train_x: None,
            train_y: None,
        }
    }

    /// Number of rows seen by the last `fit`.
    pub fn n_train(&self) -> usize {
        self.train_x.as_ref().map_or(0, Array2::nrows)
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Model for KnnModel {
    fn fit(&mut self, features: &Dataset, targets: &Dataset) -> anyhow::Result<()> {
        ensure!(self.k > 0, "k must be at least 1");
        ensure!(!features.is_empty(), "cannot fit k-NN on an empty dataset");
        ensure!(
            features.len() == targets.len(),
            "features have {} rows but targets have {}",
            features.len(),
            targets.len()
        );
        self.train_x = Some(features.values().clone());
        self.train_y = Some(targets.values().clone());
        Ok(())
    }

    fn predict(&self, features: &Dataset) -> anyhow::Result<Array2<f32>> {
        let (Some(train_x), Some(train_y)) = (&self.train_x, &self.train_y) else {
            anyhow::bail!("k-NN model must be fitted before predicting");
        };
        ensure!(
            features.ncols() == train_x.ncols(),
            "expected {} feature columns, got {}",
            train_x.ncols(),
            features.ncols()
        );

        let k = self.k.min(train_x.nrows());
        let mut out = Array2::from_elem((features.len(), train_y.ncols()), 0.0f32);
        let mut distances: Vec<(f32, usize)> = Vec::with_capacity(train_x.nrows());

        for (row, query) in features.values().rows().enumerate() {
            distances.clear();
            distances.extend(
                train_x
                    .rows()
                    .enumerate()
                    .map(|(i, train_row)| (squared_distance(query, train_row), i)),
            );
            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            for &(_, idx) in &distances[..k] {
                for col in 0..train_y.ncols() {
                    out[(row, col)] += train_y[(idx, col)];
                }
            }
            for col in 0..train_y.ncols() {
                out[(row, col)] /= k as f32;
            }
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "knn"
    }
}
