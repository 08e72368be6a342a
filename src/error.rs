use thiserror::Error;

use crate::math::ShapeError;

/// Errors raised while building datasets or running a pseudo-labelling round.
#[derive(Debug, Error)]
pub enum PseudoLabelError {
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("dataset has {values} value columns but {names} column names")]
    ColumnCountMismatch { names: usize, values: usize },

    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("sample rate {0} must lie within [0, 1]")]
    InvalidSampleRate(f64),

    #[error("cannot sample {requested} rows from a dataset of {available} rows")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("expected {expected} rows, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("model predicted shape {actual:?}, expected {expected:?}")]
    PredictionShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// A failure raised by the wrapped model, tagged with the step it broke.
    #[error("model '{model}' failed during {stage}")]
    Model {
        model: String,
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, PseudoLabelError>;
