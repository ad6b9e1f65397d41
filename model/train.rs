//! # Model Training
//!
//! Orchestrates one training action: validate the selection, split the rows
//! into a training and a held-out partition, fit the preprocessing transform
//! and the forest on the training partition only, and score the frozen
//! pipeline on the held-out rows.
//!
//! Fitting is deterministic: the split shuffle and the forest both run from
//! fixed seeds, so the same dataset/target/features combination always yields
//! an identical model and score.

use crate::frame::dataset::{numeric_column_values, string_column_values, DataError, Dataset};
use crate::forest::RandomForestRegressor;
use crate::metrics::r2_score;
use crate::pipeline::FittedModel;
use crate::preprocess::{ColumnData, Preprocessor};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Seed for the train/held-out row shuffle.
const SPLIT_SEED: u64 = 42;
/// Base seed for forest construction.
const FOREST_SEED: u64 = 42;
/// Fraction of rows held out for evaluation.
const TEST_FRACTION: f64 = 0.2;

/// A comprehensive error type for the training process.
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("No features selected. Pick at least one feature column before training.")]
    NoFeatures,
    #[error("The target column '{0}' is not numeric and cannot be predicted by regression.")]
    TargetNotNumeric(String),
    #[error("The target column '{0}' cannot also be a feature.")]
    TargetInFeatures(String),
    #[error(
        "Missing or non-finite values were found in the target column '{0}'. \
         Training requires a complete numeric target."
    )]
    IncompleteTarget(String),
    #[error(
        "The feature column '{0}' has no observed values in the training rows, \
         so no imputation statistic can be learned from it."
    )]
    EmptyFeature(String),
    #[error("The dataset has only {found} rows; at least {required} are needed to hold out an evaluation split.")]
    InsufficientRows { found: usize, required: usize },
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Trains the full pipeline and evaluates it on the held-out split.
///
/// Returns the frozen [`FittedModel`] and its held-out R². No side effects
/// beyond the return value; a failed call leaves nothing behind.
pub fn train(
    data: &Dataset,
    target: &str,
    features: &[String],
) -> Result<(FittedModel, f64), TrainError> {
    if features.is_empty() {
        return Err(TrainError::NoFeatures);
    }
    if features.iter().any(|f| f == target) {
        return Err(TrainError::TargetInFeatures(target.to_string()));
    }
    if !data.has_column(target) {
        return Err(DataError::ColumnNotFound(target.to_string()).into());
    }
    if !data.is_numeric(target) {
        return Err(TrainError::TargetNotNumeric(target.to_string()));
    }

    let y = extract_target(data, target)?;
    let columns: Vec<ColumnData> = features
        .iter()
        .map(|name| extract_feature(data, name))
        .collect::<Result<_, TrainError>>()?;
    debug_assert!(columns.iter().all(|c| c.len() == data.height()));

    let (train_rows, test_rows) = split_rows(data.height())?;
    log::info!(
        "Training on {} rows, evaluating on {} held-out rows ({} features)",
        train_rows.len(),
        test_rows.len(),
        features.len()
    );

    let preprocessor = Preprocessor::fit(features, &columns, &train_rows)?;
    let x_train = preprocessor.transform(&columns, &train_rows);
    let y_train = Array1::from_iter(train_rows.iter().map(|&i| y[i]));

    let mut forest = RandomForestRegressor::new(FOREST_SEED);
    forest.fit(&x_train, &y_train);

    let x_test = preprocessor.transform(&columns, &test_rows);
    let y_test = Array1::from_iter(test_rows.iter().map(|&i| y[i]));
    let predicted = forest.predict(&x_test);
    let score = r2_score(y_test.view(), predicted.view());
    log::info!("Held-out R² = {score:.4}");

    let model = FittedModel {
        preprocessor,
        forest,
        target: target.to_string(),
        feature_names: features.to_vec(),
    };
    Ok((model, score))
}

/// Shuffles row indices with the fixed split seed and holds out
/// `ceil(TEST_FRACTION * n)` rows. Pure random assignment, no stratification.
fn split_rows(n: usize) -> Result<(Vec<usize>, Vec<usize>), TrainError> {
    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainError::InsufficientRows {
            found: n,
            required: 2,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let test_rows = indices[..n_test].to_vec();
    let train_rows = indices[n_test..].to_vec();
    Ok((train_rows, test_rows))
}

fn extract_target(data: &Dataset, target: &str) -> Result<Vec<f64>, TrainError> {
    let values = numeric_column_values(data.frame(), target)?;
    values
        .into_iter()
        .map(|v| match v {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(TrainError::IncompleteTarget(target.to_string())),
        })
        .collect()
}

/// Extracts one feature column, tagged numeric or categorical by dtype.
fn extract_feature(data: &Dataset, name: &str) -> Result<ColumnData, TrainError> {
    if !data.has_column(name) {
        return Err(DataError::ColumnNotFound(name.to_string()).into());
    }
    if data.is_numeric(name) {
        Ok(ColumnData::Numeric(numeric_column_values(
            data.frame(),
            name,
        )?))
    } else {
        Ok(ColumnData::Categorical(string_column_values(
            data.frame(),
            name,
        )?))
    }
}
