use crate::config::{ModelConfig, ModelType};
use crate::models::gbdt::GbdtModel;
use crate::models::knn::KnnModel;
use crate::models::model_trait::Model;

/// Build a boxed model from a `ModelConfig`.
pub fn build_model(params: ModelConfig) -> Box<dyn Model> {
    match params.model_type {
        ModelType::GBDT { .. } => Box::new(GbdtModel::new(params)),
        ModelType::KNN { k } => Box::new(KnnModel::new(k)),
    }
}
