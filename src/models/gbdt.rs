use anyhow::{bail, ensure};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use crate::config::{ModelConfig, ModelType};
use crate::data_handling::Dataset;
use crate::math::Array2;
use crate::models::model_trait::Model;

/// Gradient Boosting Decision Tree (GBDT) model.
///
/// One booster is trained per target column, so multi-target datasets are
/// supported. Refitting discards the previous boosters.
///
/// Every feature and target value must be finite; the underlying trees have
/// no handling for `NaN` or infinities.
pub struct GbdtModel {
    boosters: Vec<GBDT>,
    feature_size: usize,
    params: ModelConfig,
}

impl GbdtModel {
    pub fn new(params: ModelConfig) -> Self {
        GbdtModel {
            boosters: Vec::new(),
            feature_size: 0,
            params,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.boosters.is_empty()
    }

    fn build_config(&self, feature_size: usize) -> anyhow::Result<Config> {
        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();
                config.set_feature_size(feature_size);
                config.set_shrinkage(self.params.learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);
                Ok(config)
            }
            other => bail!("Expected ModelType::GBDT params, got {:?}", other),
        }
    }
}

fn ensure_finite(values: &Array2<f32>, what: &str) -> anyhow::Result<()> {
    if let Some(pos) = values.as_slice().iter().position(|v| !v.is_finite()) {
        bail!(
            "{} contain a non-finite value at row {}, column {}",
            what,
            pos / values.ncols(),
            pos % values.ncols()
        );
    }
    Ok(())
}

fn to_data_vec(x: &Array2<f32>, labels: Option<&[f32]>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for row in 0..x.nrows() {
        let label = labels.map_or(0.0, |l| l[row]);
        data.push(Data::new_training_data(x.row_slice(row).to_vec(), 1.0, label, None));
    }
    data
}

impl Model for GbdtModel {
    fn fit(&mut self, features: &Dataset, targets: &Dataset) -> anyhow::Result<()> {
        ensure!(!features.is_empty(), "cannot fit GBDT on an empty dataset");
        ensure!(
            features.len() == targets.len(),
            "features have {} rows but targets have {}",
            features.len(),
            targets.len()
        );
        ensure_finite(features.values(), "features")?;
        ensure_finite(targets.values(), "targets")?;

        let config = self.build_config(features.ncols())?;
        let x = features.values();

        let mut boosters = Vec::with_capacity(targets.ncols());
        for col in 0..targets.ncols() {
            let y = targets.values().column(col);
            let mut train_x = to_data_vec(x, Some(&y));
            let mut gbdt = GBDT::new(&config);
            gbdt.fit(&mut train_x);
            log::debug!(
                "Fitted GBDT for target '{}' on {} rows",
                targets.columns()[col],
                features.len()
            );
            boosters.push(gbdt);
        }

        self.boosters = boosters;
        self.feature_size = features.ncols();
        Ok(())
    }

    fn predict(&self, features: &Dataset) -> anyhow::Result<Array2<f32>> {
        ensure!(self.is_fitted(), "GBDT model must be fitted before predicting");
        ensure!(
            features.ncols() == self.feature_size,
            "expected {} feature columns, got {}",
            self.feature_size,
            features.ncols()
        );
        ensure_finite(features.values(), "features")?;

        let test_x = to_data_vec(features.values(), None);
        let per_target: Vec<Vec<f32>> = self
            .boosters
            .iter()
            .map(|gbdt| gbdt.predict(&test_x))
            .collect();

        let n_targets = per_target.len();
        let mut out = Array2::from_elem((features.len(), n_targets), 0.0f32);
        for (col, predictions) in per_target.iter().enumerate() {
            for (row, &value) in predictions.iter().enumerate() {
                out[(row, col)] = value;
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}
