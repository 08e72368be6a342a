//! Delimited-text reader and writer for `Dataset`.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::Dataset;
use crate::math::Array2;

/// Configuration for reading a delimited dataset file.
#[derive(Debug, Clone, Default)]
pub struct DatasetReaderConfig {
    /// Field delimiter. When `None`, `.tsv` files use tabs and anything else
    /// uses commas.
    pub delimiter: Option<u8>,
    /// Columns to load, in order. When `None`, every column is loaded.
    pub columns: Option<Vec<String>>,
}

impl DatasetReaderConfig {
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            delimiter: None,
            columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }
}

fn infer_delimiter(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == name)
}

/// Read a delimited file with a header row into a `Dataset`.
pub fn read_dataset_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_dataset_with_config(path, &DatasetReaderConfig::default())
}

/// Read a delimited file using a custom configuration.
///
/// Every loaded cell must parse as a number; empty cells are rejected, so
/// unlabelled files should either omit their target columns or be read with
/// an explicit column list that leaves them out.
pub fn read_dataset_with_config<P: AsRef<Path>>(
    path: P,
    config: &DatasetReaderConfig,
) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| infer_delimiter(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let indices = match &config.columns {
        Some(names) => names
            .iter()
            .map(|name| {
                find_column(&headers, name).ok_or_else(|| anyhow!("Missing column '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?,
        None => (0..headers.len()).collect(),
    };
    let columns: Vec<String> = indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").trim().to_string())
        .collect();

    let mut values = Vec::new();
    let mut n_rows = 0;
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        for (&idx, name) in indices.iter().zip(&columns) {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing value for '{}' at row {}", name, row_idx + 1))?
                .trim();
            let parsed = value.parse::<f32>().with_context(|| {
                format!("Invalid value {:?} for '{}' at row {}", value, name, row_idx + 1)
            })?;
            values.push(parsed);
        }
        n_rows += 1;
    }

    let matrix = Array2::from_shape_vec((n_rows, columns.len()), values)
        .context("Failed to build dataset matrix")?;
    let dataset = Dataset::new(columns, matrix)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?;

    log::debug!(
        "Read {} rows x {} columns from {}",
        dataset.len(),
        dataset.ncols(),
        path.display()
    );
    Ok(dataset)
}

/// Write a `Dataset` with a header row. The delimiter follows the file
/// extension like [`read_dataset_csv`].
pub fn write_dataset_csv<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(infer_delimiter(path))
        .from_path(path)
        .with_context(|| format!("Failed to create dataset file: {}", path.display()))?;

    writer.write_record(dataset.columns())?;
    for row in dataset.values().rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
