pub mod factory;
pub mod gbdt;
pub mod knn;
pub mod model_trait;

pub use factory::build_model;
pub use gbdt::GbdtModel;
pub use knn::KnnModel;
pub use model_trait::Model;
