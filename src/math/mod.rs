//! Small ndarray-like matrix type used throughout the crate.
//!
//! `Array2` is a dependency-free row-major container with just the
//! operations datasets and models need: row/column gathering and row-wise
//! stacking.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
