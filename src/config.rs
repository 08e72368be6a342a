use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PseudoLabelError;

fn default_sample_rate() -> f64 {
    0.2
}

fn default_shuffle_seed() -> u64 {
    42
}

/// Settings for one pseudo-labelling orchestrator.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PseudoLabelConfig {
    /// Columns fed to the model as inputs.
    pub features: Vec<String>,
    /// Columns the model predicts.
    pub target: Vec<String>,
    /// Fraction of unlabelled rows pseudo-labelled per round, within [0, 1].
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Reserved; stored and reported but does not change the round.
    #[serde(default)]
    pub shuffle: bool,
    /// Seed controlling which unlabelled rows are sampled.
    #[serde(default = "default_shuffle_seed")]
    pub shuffle_seed: u64,
}

impl Default for PseudoLabelConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            target: Vec::new(),
            sample_rate: default_sample_rate(),
            shuffle: false,
            shuffle_seed: default_shuffle_seed(),
        }
    }
}

impl PseudoLabelConfig {
    pub fn new<F, T>(features: F, target: T) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_shuffle_seed(mut self, shuffle_seed: u64) -> Self {
        self.shuffle_seed = shuffle_seed;
        self
    }

    /// Reject sample rates outside [0, 1], including NaN.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(PseudoLabelError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Number of unlabelled rows drawn per round: `floor(n_unlabelled * sample_rate)`.
    pub fn num_samples(&self, n_unlabelled: usize) -> usize {
        (n_unlabelled as f64 * self.sample_rate).floor() as usize
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: PseudoLabelConfig = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }
}

/// Central configuration for the bundled models.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
    KNN {
        k: usize,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::GBDT {
            max_depth: 6,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "SquaredError".to_string(),
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::default()),
            "knn" => Ok(ModelType::KNN { k: 5 }),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: gbdt, knn",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = PseudoLabelConfig::new(["x"], ["y"]);
        assert_eq!(cfg.sample_rate, 0.2);
        assert!(!cfg.shuffle);
        assert_eq!(cfg.shuffle_seed, 42);
    }

    #[test]
    fn num_samples_floors() {
        let cfg = PseudoLabelConfig::default().with_sample_rate(0.25);
        assert_eq!(cfg.num_samples(10), 2);
        assert_eq!(cfg.num_samples(0), 0);
    }

    #[test]
    fn validate_rejects_out_of_range_rates() {
        for rate in [-0.1, 1.5, f64::NAN] {
            let cfg = PseudoLabelConfig::default().with_sample_rate(rate);
            assert!(cfg.validate().is_err(), "rate {} should be rejected", rate);
        }
        assert!(PseudoLabelConfig::default().with_sample_rate(1.0).validate().is_ok());
        assert!(PseudoLabelConfig::default().with_sample_rate(0.0).validate().is_ok());
    }
}
