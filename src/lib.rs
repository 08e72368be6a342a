//! pseudo-labeller: semi-supervised training around any fit/predict model.
//!
//! The crate trains a [`Model`](models::Model) on a labelled [`Dataset`], uses
//! it to pseudo-label a seeded sample of an unlabelled dataset, merges the two
//! row-wise and retrains. Bundled models (GBDT, k-nearest-neighbours), CSV
//! readers and serde-backed configuration make the orchestrator usable without
//! any other glue.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod pseudo_labeller;

pub use data_handling::Dataset;
pub use error::{PseudoLabelError, Result};
pub use pseudo_labeller::{PseudoLabeller, PseudoLabellerParams};
