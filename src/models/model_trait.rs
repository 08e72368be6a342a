use crate::data_handling::Dataset;
use crate::math::Array2;

/// The fit/predict capability the pseudo-labeller drives.
///
/// Implementations are opaque to the orchestrator: it only hands them
/// column projections of a `Dataset` and reads back a prediction matrix.
pub trait Model {
    /// Train on `features` and their matching `targets` (same row count).
    /// Calling `fit` again replaces or extends the learned state; the
    /// pseudo-labeller relies on this to refit on the merged set.
    fn fit(&mut self, features: &Dataset, targets: &Dataset) -> anyhow::Result<()>;

    /// Predict one row of target values per input row.
    fn predict(&self, features: &Dataset) -> anyhow::Result<Array2<f32>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "model"
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn fit(&mut self, features: &Dataset, targets: &Dataset) -> anyhow::Result<()> {
        (**self).fit(features, targets)
    }

    fn predict(&self, features: &Dataset) -> anyhow::Result<Array2<f32>> {
        (**self).predict(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
