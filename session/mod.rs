//! Per-session state for the interactive shell.
//!
//! One user, one dataset, one in-flight action at a time. The context owns
//! the loaded table, the current selections, and (after a successful train
//! action) the fitted model with the feature list it was fit on. A new train
//! replaces the artifact wholesale; a failed action leaves everything as it
//! was. Nothing survives the session.

use crate::frame::Dataset;
use crate::input::{parse_input_row, InputError};
use crate::pipeline::{FittedModel, InputRow, PredictError};
use crate::train::{train, TrainError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The column '{0}' does not exist in the dataset.")]
    UnknownColumn(String),
    #[error("The column '{0}' is not numeric and cannot be the target.")]
    TargetNotNumeric(String),
    #[error("The target column '{0}' cannot be selected as a feature.")]
    FeatureIsTarget(String),
    #[error("Select a target column first.")]
    NoTarget,
    #[error("No features selected. Pick at least one feature column.")]
    NoFeatures,
    #[error("No trained model in this session. Run `train` first.")]
    NotTrained,
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// The fitted artifact and the score it earned on the held-out split.
#[derive(Debug)]
pub struct TrainedArtifact {
    pub model: FittedModel,
    pub score: f64,
}

/// Explicit session state: selections are re-derived per action, the model
/// lives from one successful train action to the next.
pub struct SessionContext {
    dataset: Dataset,
    target: Option<String>,
    category: Option<String>,
    features: Vec<String>,
    fitted: Option<TrainedArtifact>,
}

impl SessionContext {
    /// The feature selection starts as every numeric column; picking a target
    /// removes it from the list, so training can run without an explicit
    /// `features` action.
    pub fn new(dataset: Dataset) -> Self {
        let features = dataset.numeric_columns();
        Self {
            dataset,
            target: None,
            category: None,
            features,
            fitted: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn fitted(&self) -> Option<&TrainedArtifact> {
        self.fitted.as_ref()
    }

    pub fn set_target(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.dataset.has_column(name) {
            return Err(SessionError::UnknownColumn(name.to_string()));
        }
        if !self.dataset.is_numeric(name) {
            return Err(SessionError::TargetNotNumeric(name.to_string()));
        }
        self.target = Some(name.to_string());
        self.features.retain(|f| f != name);
        Ok(())
    }

    pub fn set_category(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.dataset.has_column(name) {
            return Err(SessionError::UnknownColumn(name.to_string()));
        }
        self.category = Some(name.to_string());
        Ok(())
    }

    /// Replaces the feature selection. The target may not appear in it.
    pub fn set_features(&mut self, features: Vec<String>) -> Result<(), SessionError> {
        if features.is_empty() {
            return Err(SessionError::NoFeatures);
        }
        for name in &features {
            if !self.dataset.has_column(name) {
                return Err(SessionError::UnknownColumn(name.clone()));
            }
            if Some(name.as_str()) == self.target.as_deref() {
                return Err(SessionError::FeatureIsTarget(name.clone()));
            }
        }
        self.features = features;
        Ok(())
    }

    /// Runs one training action and, on success, installs the new artifact in
    /// place of any previous one. A failed train leaves the old model usable.
    pub fn train(&mut self) -> Result<f64, SessionError> {
        let target = self.target.as_deref().ok_or(SessionError::NoTarget)?;
        if self.features.is_empty() {
            return Err(SessionError::NoFeatures);
        }
        let (model, score) = train(&self.dataset, target, &self.features)?;
        self.fitted = Some(TrainedArtifact { model, score });
        Ok(score)
    }

    /// Parses one free-text prediction row against the fitted feature set and
    /// returns the model's scalar prediction.
    pub fn predict(&self, text: &str) -> Result<f64, SessionError> {
        let artifact = self.fitted.as_ref().ok_or(SessionError::NotTrained)?;
        let names = artifact.model.feature_names();
        let values = parse_input_row(text, names.len())?;
        let row = InputRow::from_parts(names, values);
        Ok(artifact.model.predict(&row)?)
    }
}
