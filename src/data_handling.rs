//! Tabular dataset used as both the labelled and unlabelled input.
//!
//! A `Dataset` is a list of unique column names over a row-major
//! `Array2<f32>`. It provides the operations pseudo-labelling needs: column
//! projection, column overwrite, seeded row sampling and row-wise
//! concatenation. Cloning a dataset is the duplication primitive.
use std::collections::HashSet;

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{PseudoLabelError, Result};
use crate::math::Array2;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    values: Array2<f32>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, values: Array2<f32>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PseudoLabelError::ColumnCountMismatch {
                names: columns.len(),
                values: values.ncols(),
            });
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(PseudoLabelError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Dataset { columns, values })
    }

    /// Build a dataset from row vectors, one value per column.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let values = Array2::from_rows(columns.len(), rows)?;
        Dataset::new(columns, values)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn row(&self, row: usize) -> &[f32] {
        self.values.row_slice(row)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PseudoLabelError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<f32>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    /// Project the dataset onto `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Dataset::new(
            names.iter().map(|n| n.as_ref().to_string()).collect(),
            self.values.select_columns(&indices),
        )
    }

    /// Write `values` into the named columns, overwriting existing columns and
    /// appending missing ones at the end. `values` must have one row per
    /// dataset row and one column per name.
    pub fn set_columns<S: AsRef<str>>(
        &mut self,
        names: &[S],
        values: &Array2<f32>,
    ) -> Result<()> {
        if values.nrows() != self.len() {
            return Err(PseudoLabelError::RowCountMismatch {
                expected: self.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != names.len() {
            return Err(PseudoLabelError::ColumnCountMismatch {
                names: names.len(),
                values: values.ncols(),
            });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_ref()) {
                return Err(PseudoLabelError::DuplicateColumn(name.as_ref().to_string()));
            }
        }

        let appended: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !self.has_column(n))
            .map(str::to_string)
            .collect();

        let n_cols = self.columns.len() + appended.len();
        let mut columns = self.columns.clone();
        columns.extend(appended);

        // Map each written column to its destination slot once, up front.
        let targets = names
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .position(|c| c == name.as_ref())
                    .ok_or_else(|| PseudoLabelError::MissingColumn(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut data = Vec::with_capacity(self.len() * n_cols);
        for row in 0..self.len() {
            let start = data.len();
            data.extend_from_slice(self.values.row_slice(row));
            data.resize(start + n_cols, 0.0);
            for (src, &dst) in targets.iter().enumerate() {
                data[start + dst] = values[(row, src)];
            }
        }

        self.values = Array2::from_shape_vec((self.len(), n_cols), data)?;
        self.columns = columns;
        Ok(())
    }

    /// Draw `n` distinct rows without replacement. The same `seed` always
    /// selects the same rows in the same order.
    pub fn sample(&self, n: usize, seed: u64) -> Result<Dataset> {
        if n > self.len() {
            return Err(PseudoLabelError::SampleTooLarge {
                requested: n,
                available: self.len(),
            });
        }
        if n == 0 {
            return Ok(self.take_rows(&[]));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let indices = index::sample(&mut rng, self.len(), n).into_vec();
        log::trace!("Sampled row indices: {:?}", indices);
        Ok(self.take_rows(&indices))
    }

    /// Keep only the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            values: self.values.select_rows(indices),
        }
    }

    /// Append the rows of `other` below this dataset's rows.
    ///
    /// `other` is aligned to this dataset's schema by column name, so its
    /// column order may differ and extra columns are dropped. The result has
    /// exactly `self.columns()`.
    pub fn concat_rows(&self, other: &Dataset) -> Result<Dataset> {
        let aligned = other.select(&self.columns)?;
        Ok(Dataset {
            columns: self.columns.clone(),
            values: self.values.concat_rows(&aligned.values)?,
        })
    }

    pub fn log_summary(&self, name: &str) {
        log::info!(
            "{}: {} rows x {} columns ({})",
            name,
            self.len(),
            self.ncols(),
            self.columns.join(", ")
        );
    }
}
