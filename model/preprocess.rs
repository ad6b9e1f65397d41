//! # Column-wise Preprocessing
//!
//! The first stage of the fitted pipeline. Fitting learns, per feature, the
//! statistics needed to turn a raw mixed-type row into a fixed-width numeric
//! vector; after fitting the transform is frozen and reused verbatim for the
//! held-out split and for every later single-row prediction.
//!
//! - Numeric features: missing (or non-finite) values are filled with the
//!   training mean.
//! - Categorical features: missing values are filled with the most frequent
//!   training value, then the column expands into one indicator column per
//!   vocabulary entry. A value never seen during fitting encodes as all
//!   zeros rather than failing.
//!
//! Output layout: numeric features first, in feature order, then one
//! indicator block per categorical feature in vocabulary order.

use crate::input::TokenValue;
use crate::pipeline::PredictError;
use crate::train::TrainError;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// One extracted feature column, tagged by inferred type.
#[derive(Debug, Clone)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
enum FeatureEncoder {
    Numeric {
        name: String,
        mean: f64,
    },
    Categorical {
        name: String,
        fill: String,
        vocabulary: Vec<String>,
    },
}

/// The frozen column-wise transform. Construct with [`Preprocessor::fit`];
/// nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Encoders in the original feature order (the prediction-row order).
    features: Vec<FeatureEncoder>,
    /// Indices into `features` in output-column order: numeric then categorical.
    layout: Vec<usize>,
    width: usize,
}

impl Preprocessor {
    /// Learns imputation statistics and categorical vocabularies from the
    /// training rows only. A feature with no observed training value at all
    /// cannot be imputed and is a fitting error.
    pub fn fit(
        names: &[String],
        columns: &[ColumnData],
        rows: &[usize],
    ) -> Result<Self, TrainError> {
        debug_assert_eq!(names.len(), columns.len());

        let mut features = Vec::with_capacity(columns.len());
        for (name, column) in names.iter().zip(columns) {
            features.push(match column {
                ColumnData::Numeric(values) => {
                    let observed: Vec<f64> = rows
                        .iter()
                        .filter_map(|&i| values[i].filter(|v| v.is_finite()))
                        .collect();
                    if observed.is_empty() {
                        return Err(TrainError::EmptyFeature(name.clone()));
                    }
                    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
                    FeatureEncoder::Numeric {
                        name: name.clone(),
                        mean,
                    }
                }
                ColumnData::Categorical(values) => {
                    let mut counts: HashMap<&str, usize> = HashMap::new();
                    for &i in rows {
                        if let Some(value) = &values[i] {
                            *counts.entry(value.as_str()).or_insert(0) += 1;
                        }
                    }
                    if counts.is_empty() {
                        return Err(TrainError::EmptyFeature(name.clone()));
                    }
                    let mut vocabulary: Vec<String> =
                        counts.keys().map(|s| s.to_string()).collect();
                    vocabulary.sort();
                    // max_by_key keeps the last maximum, so scanning the
                    // sorted vocabulary in reverse makes ties on frequency
                    // resolve to the smallest value deterministically.
                    let fill = vocabulary
                        .iter()
                        .rev()
                        .max_by_key(|v| counts[v.as_str()])
                        .cloned()
                        .unwrap_or_default();
                    FeatureEncoder::Categorical {
                        name: name.clone(),
                        fill,
                        vocabulary,
                    }
                }
            });
        }

        let mut layout: Vec<usize> = Vec::with_capacity(features.len());
        layout.extend(
            features
                .iter()
                .enumerate()
                .filter(|(_, f)| matches!(f, FeatureEncoder::Numeric { .. }))
                .map(|(i, _)| i),
        );
        layout.extend(
            features
                .iter()
                .enumerate()
                .filter(|(_, f)| matches!(f, FeatureEncoder::Categorical { .. }))
                .map(|(i, _)| i),
        );

        let width = layout
            .iter()
            .map(|&i| match &features[i] {
                FeatureEncoder::Numeric { .. } => 1,
                FeatureEncoder::Categorical { vocabulary, .. } => vocabulary.len(),
            })
            .sum();

        Ok(Self {
            features,
            layout,
            width,
        })
    }

    /// Width of the transformed design matrix.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fitted feature names in the original order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features
            .iter()
            .map(|f| match f {
                FeatureEncoder::Numeric { name, .. } => name.as_str(),
                FeatureEncoder::Categorical { name, .. } => name.as_str(),
            })
            .collect()
    }

    /// Transforms the given rows of the extracted columns into a design
    /// matrix, using the frozen fit-time statistics.
    pub fn transform(&self, columns: &[ColumnData], rows: &[usize]) -> Array2<f64> {
        let mut buffer = Vec::with_capacity(rows.len() * self.width);
        for &row in rows {
            for &idx in &self.layout {
                match (&self.features[idx], &columns[idx]) {
                    (FeatureEncoder::Numeric { mean, .. }, ColumnData::Numeric(values)) => {
                        buffer.push(values[row].filter(|v| v.is_finite()).unwrap_or(*mean));
                    }
                    (
                        FeatureEncoder::Categorical {
                            fill, vocabulary, ..
                        },
                        ColumnData::Categorical(values),
                    ) => {
                        let value = values[row].as_deref().unwrap_or(fill.as_str());
                        for entry in vocabulary {
                            buffer.push(if entry.as_str() == value { 1.0 } else { 0.0 });
                        }
                    }
                    // Extraction tags columns by the same dtype inference the
                    // encoders were fit from, so the arms cannot cross.
                    _ => unreachable!("column type diverged from fitted encoder"),
                }
            }
        }
        Array2::from_shape_vec((rows.len(), self.width), buffer)
            .expect("row buffer matches fitted width")
    }

    /// Transforms one raw prediction row, positionally aligned to the fitted
    /// feature order. Unknown categories encode as all zeros; a text token in
    /// a numeric position is an error the caller reports.
    pub fn transform_row(&self, values: &[TokenValue]) -> Result<Array1<f64>, PredictError> {
        if values.len() != self.features.len() {
            return Err(PredictError::ShapeMismatch {
                expected: self.features.len(),
                found: values.len(),
            });
        }

        let mut buffer = Vec::with_capacity(self.width);
        for &idx in &self.layout {
            match &self.features[idx] {
                FeatureEncoder::Numeric { name, .. } => match &values[idx] {
                    TokenValue::Number(v) => buffer.push(*v),
                    TokenValue::Text(text) => {
                        return Err(PredictError::ValueType {
                            column: name.clone(),
                            value: text.clone(),
                        });
                    }
                },
                FeatureEncoder::Categorical { vocabulary, .. } => {
                    let value = values[idx].to_string();
                    for entry in vocabulary {
                        buffer.push(if *entry == value { 1.0 } else { 0.0 });
                    }
                }
            }
        }
        Ok(Array1::from_vec(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_data_reports_its_length() {
        let column = ColumnData::Numeric(vec![Some(1.0), None]);
        assert_eq!(column.len(), 2);
        assert!(!column.is_empty());
        assert!(ColumnData::Categorical(Vec::new()).is_empty());
    }

    #[test]
    fn numeric_mean_imputation() {
        let columns = vec![ColumnData::Numeric(vec![
            Some(1.0),
            None,
            Some(3.0),
            Some(f64::NAN),
        ])];
        let rows: Vec<usize> = (0..4).collect();
        let pre = Preprocessor::fit(&names(&["x"]), &columns, &rows).unwrap();
        let matrix = pre.transform(&columns, &rows);
        assert_eq!(matrix.shape(), &[4, 1]);
        assert_eq!(matrix[[0, 0]], 1.0);
        assert_eq!(matrix[[1, 0]], 2.0); // mean of 1 and 3
        assert_eq!(matrix[[3, 0]], 2.0); // NaN treated as missing
    }

    #[test]
    fn categorical_one_hot_layout() {
        let columns = vec![ColumnData::Categorical(vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
            Some("b".to_string()),
        ])];
        let rows: Vec<usize> = (0..4).collect();
        let pre = Preprocessor::fit(&names(&["c"]), &columns, &rows).unwrap();
        assert_eq!(pre.width(), 2); // vocabulary ["a", "b"]
        let matrix = pre.transform(&columns, &rows);
        assert_eq!(matrix.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![1.0, 0.0]);
        // Missing value imputed with the most frequent level "b".
        assert_eq!(matrix.row(2).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn numeric_block_precedes_categorical_block() {
        let columns = vec![
            ColumnData::Categorical(vec![Some("x".to_string()), Some("y".to_string())]),
            ColumnData::Numeric(vec![Some(5.0), Some(7.0)]),
        ];
        let rows = vec![0, 1];
        let pre = Preprocessor::fit(&names(&["cat", "num"]), &columns, &rows).unwrap();
        let matrix = pre.transform(&columns, &rows);
        // Column 0 is the numeric feature even though it was listed second.
        assert_eq!(matrix.row(0).to_vec(), vec![5.0, 1.0, 0.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![7.0, 0.0, 1.0]);
    }

    #[test]
    fn unknown_category_encodes_as_zeros() {
        let columns = vec![ColumnData::Categorical(vec![
            Some("a".to_string()),
            Some("b".to_string()),
        ])];
        let pre = Preprocessor::fit(&names(&["c"]), &columns, &[0, 1]).unwrap();
        let row = pre
            .transform_row(&[TokenValue::Text("zzz".to_string())])
            .unwrap();
        assert_eq!(row.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn text_token_in_numeric_position_is_rejected() {
        let columns = vec![ColumnData::Numeric(vec![Some(1.0), Some(2.0)])];
        let pre = Preprocessor::fit(&names(&["x"]), &columns, &[0, 1]).unwrap();
        let err = pre
            .transform_row(&[TokenValue::Text("red".to_string())])
            .unwrap_err();
        assert!(matches!(err, PredictError::ValueType { .. }));
    }

    #[test]
    fn entirely_missing_feature_is_a_fitting_error() {
        let columns = vec![ColumnData::Numeric(vec![None, None])];
        let err = Preprocessor::fit(&names(&["x"]), &columns, &[0, 1]).unwrap_err();
        assert!(matches!(err, TrainError::EmptyFeature(_)));
    }

    #[test]
    fn fill_tie_breaks_to_smallest_value() {
        let columns = vec![ColumnData::Categorical(vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
        ])];
        let pre = Preprocessor::fit(&names(&["c"]), &columns, &[0, 1, 2]).unwrap();
        let matrix = pre.transform(&columns, &[2]);
        // "a" and "b" both appear once; the tie resolves to "a".
        assert_eq!(matrix.row(0).to_vec(), vec![1.0, 0.0]);
    }
}
