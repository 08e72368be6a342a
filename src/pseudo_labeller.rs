//! Pseudo-labelling orchestrator.
//!
//! A `PseudoLabeller` borrows a model exclusively and drives it through one
//! round of semi-supervised training:
//!
//! 1. fit on the labelled data,
//! 2. predict targets for a copy of the unlabelled data,
//! 3. sample `floor(n_unlabelled * sample_rate)` pseudo-labelled rows,
//! 4. append them below the labelled rows,
//! 5. refit on the merged set.
//!
//! The model is therefore mutated twice per `fit`, and both mutations remain
//! visible to the caller once the borrow ends. Nothing is rolled back when a
//! later step fails.
use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::config::PseudoLabelConfig;
use crate::data_handling::Dataset;
use crate::error::{PseudoLabelError, Result};
use crate::models::Model;

pub struct PseudoLabeller<'a, M: Model + ?Sized> {
    model: &'a mut M,
    config: PseudoLabelConfig,
    labelled_data: &'a Dataset,
    unlabelled_data: &'a Dataset,
    input_features: Dataset,
    output_target: Dataset,
    num_samples: usize,
}

impl<'a, M: Model + ?Sized> PseudoLabeller<'a, M> {
    /// Create a new PseudoLabeller
    ///
    /// # Arguments
    ///
    /// * `model` - The model to train; it is refitted in place
    /// * `labelled_data` - Rows with ground-truth values in the target columns
    /// * `unlabelled_data` - Rows to pseudo-label; target columns may be absent
    /// * `config` - Feature/target columns, sample rate and seed
    ///
    /// # Errors
    ///
    /// `InvalidSampleRate` when the rate is outside [0, 1], and
    /// `MissingColumn` when a feature or target column is not in
    /// `labelled_data`, or when `unlabelled_data` lacks a non-target column of
    /// `labelled_data`. Pseudo-labelled rows are appended under the labelled
    /// schema, so every labelled column other than the targets (ids included)
    /// must also exist in the unlabelled data.
    pub fn new(
        model: &'a mut M,
        labelled_data: &'a Dataset,
        unlabelled_data: &'a Dataset,
        config: PseudoLabelConfig,
    ) -> Result<Self> {
        config.validate()?;
        let input_features = labelled_data.select(&config.features)?;
        let output_target = labelled_data.select(&config.target)?;
        for column in labelled_data.columns() {
            if !config.target.contains(column) {
                unlabelled_data.column_index(column)?;
            }
        }
        let num_samples = config.num_samples(unlabelled_data.len());

        if config.shuffle {
            log::warn!("The shuffle option is not implemented yet and has no effect");
        }

        Ok(PseudoLabeller {
            model,
            config,
            labelled_data,
            unlabelled_data,
            input_features,
            output_target,
            num_samples,
        })
    }

    /// Same as [`PseudoLabeller::new`] with the default sample rate (0.2),
    /// shuffle flag (off) and shuffle seed (42).
    pub fn with_defaults<F, T>(
        model: &'a mut M,
        features: F,
        target: T,
        labelled_data: &'a Dataset,
        unlabelled_data: &'a Dataset,
    ) -> Result<Self>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let config = PseudoLabelConfig::new(features, target);
        Self::new(model, labelled_data, unlabelled_data, config)
    }

    /// Fit on the labelled data, pseudo-label a seeded sample of the
    /// unlabelled data and return it appended below the labelled rows.
    ///
    /// The returned set has `labelled_data.len() + num_samples()` rows and
    /// exactly the labelled column schema. Calling this fits the model once.
    pub fn create_pseudo_labelled_set(&mut self) -> Result<Dataset> {
        let model_name = self.model.name().to_string();

        self.model
            .fit(&self.input_features, &self.output_target)
            .map_err(|source| PseudoLabelError::Model {
                model: model_name.clone(),
                stage: "initial fit",
                source,
            })?;

        let mut pseudo_labelled = self.unlabelled_data.clone();
        let unlabelled_features = pseudo_labelled.select(&self.config.features)?;
        let pseudo_labels = self
            .model
            .predict(&unlabelled_features)
            .map_err(|source| PseudoLabelError::Model {
                model: model_name,
                stage: "predict",
                source,
            })?;

        let expected = (pseudo_labelled.len(), self.config.target.len());
        if pseudo_labels.shape() != expected {
            return Err(PseudoLabelError::PredictionShape {
                expected,
                actual: pseudo_labels.shape(),
            });
        }
        pseudo_labelled.set_columns(&self.config.target, &pseudo_labels)?;

        let sampled = pseudo_labelled.sample(self.num_samples, self.config.shuffle_seed)?;
        let training_set = self.labelled_data.concat_rows(&sampled)?;

        log::debug!(
            "Pseudo-labelled {} of {} unlabelled rows; training set has {} rows",
            sampled.len(),
            self.unlabelled_data.len(),
            training_set.len()
        );

        Ok(training_set)
    }

    /// Run one pseudo-labelling round: build the merged training set and
    /// refit the model on it. The model is fitted twice in total.
    pub fn fit(&mut self) -> Result<&mut Self> {
        let training_set = self.create_pseudo_labelled_set()?;
        let features = training_set.select(&self.config.features)?;
        let target = training_set.select(&self.config.target)?;

        self.model
            .fit(&features, &target)
            .map_err(|source| PseudoLabelError::Model {
                model: self.model.name().to_string(),
                stage: "refit",
                source,
            })?;

        log::info!(
            "Refitted '{}' on {} labelled + {} pseudo-labelled rows",
            self.model.name(),
            self.labelled_data.len(),
            self.num_samples
        );

        Ok(self)
    }

    pub fn get_params(&self) -> PseudoLabellerParams<'_, M> {
        PseudoLabellerParams {
            model: &*self.model,
            features: &self.config.features,
            target: &self.config.target,
            sample_rate: self.config.sample_rate,
            unlabelled_len: self.unlabelled_data.len(),
            labelled_len: self.labelled_data.len(),
            shuffle_seed: self.config.shuffle_seed,
        }
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn config(&self) -> &PseudoLabelConfig {
        &self.config
    }

    pub fn input_features(&self) -> &Dataset {
        &self.input_features
    }

    pub fn output_target(&self) -> &Dataset {
        &self.output_target
    }

    pub fn model(&self) -> &M {
        &*self.model
    }
}

/// Read-only view of a `PseudoLabeller`'s settings, for inspection and logging.
#[derive(Debug)]
pub struct PseudoLabellerParams<'p, M: ?Sized> {
    pub model: &'p M,
    pub features: &'p [String],
    pub target: &'p [String],
    pub sample_rate: f64,
    pub unlabelled_len: usize,
    pub labelled_len: usize,
    pub shuffle_seed: u64,
}

impl<M: Model + ?Sized> PseudoLabellerParams<'_, M> {
    /// Render the parameters as a name -> value mapping. The model is
    /// represented by its name.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("Model".to_string(), json!(self.model.name()));
        map.insert("Features".to_string(), json!(self.features));
        map.insert("Target".to_string(), json!(self.target));
        map.insert("Sample rate".to_string(), json!(self.sample_rate));
        map.insert(
            "Length of unlabelled Data".to_string(),
            json!(self.unlabelled_len),
        );
        map.insert("Length of labelled Data".to_string(), json!(self.labelled_len));
        map.insert("Shuffle seed".to_string(), json!(self.shuffle_seed));
        map
    }
}
