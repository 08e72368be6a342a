//! Reading and writing datasets as delimited text.
pub mod csv_dataset;

pub use csv_dataset::{
    read_dataset_csv, read_dataset_with_config, write_dataset_csv, DatasetReaderConfig,
};
