//! # The Fitted Pipeline
//!
//! The opaque artifact produced by training: the frozen [`Preprocessor`] and
//! the frozen [`RandomForestRegressor`] bound together with the feature-name
//! order they were fit on. The only operation is single-row prediction;
//! nothing here mutates, so repeated calls with the same input return the
//! same value.

use crate::forest::RandomForestRegressor;
use crate::input::TokenValue;
use crate::preprocess::Preprocessor;
use thiserror::Error;

/// One raw prediction row: named values positionally aligned to the feature
/// set the caller believes the model was fit on. The model re-validates.
#[derive(Debug, Clone)]
pub struct InputRow {
    columns: Vec<(String, TokenValue)>,
}

impl InputRow {
    pub fn new(columns: Vec<(String, TokenValue)>) -> Self {
        Self { columns }
    }

    pub fn from_parts(names: &[String], values: Vec<TokenValue>) -> Self {
        Self {
            columns: names.iter().cloned().zip(values).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Errors from applying a fitted model to a prediction row.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Input row has {found} columns, but the model was fit on {expected} features.")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("Input column '{found}' does not match the fitted feature '{expected}'.")]
    NameMismatch { expected: String, found: String },
    #[error("Feature '{column}' expects a numeric value, got '{value}'.")]
    ValueType { column: String, value: String },
}

/// The trained pipeline. Created by [`crate::train::train`], owned by the
/// session, replaced wholesale on retraining.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub(crate) preprocessor: Preprocessor,
    pub(crate) forest: RandomForestRegressor,
    pub(crate) target: String,
    pub(crate) feature_names: Vec<String>,
}

impl FittedModel {
    /// The target column this model predicts.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The feature names, in the order prediction rows must follow.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Applies the frozen preprocessing transform and the frozen forest to
    /// one raw row, returning its scalar prediction.
    pub fn predict(&self, row: &InputRow) -> Result<f64, PredictError> {
        if row.len() != self.feature_names.len() {
            return Err(PredictError::ShapeMismatch {
                expected: self.feature_names.len(),
                found: row.len(),
            });
        }
        for (expected, (found, _)) in self.feature_names.iter().zip(&row.columns) {
            if expected != found {
                return Err(PredictError::NameMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        let values: Vec<TokenValue> =
            row.columns.iter().map(|(_, value)| value.clone()).collect();
        let encoded = self.preprocessor.transform_row(&values)?;
        Ok(self.forest.predict_row(encoded.view()))
    }
}
