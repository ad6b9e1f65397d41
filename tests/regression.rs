//! End-to-end scenarios: CSV on disk through loading, classification,
//! training, and single-row prediction.

use arbor::frame::Dataset;
use arbor::input::{parse_input_row, InputError, TokenValue};
use arbor::pipeline::{InputRow, PredictError};
use arbor::session::SessionContext;
use arbor::train::train;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(file, "{}", content).expect("write csv");
    file.flush().expect("flush csv");
    file
}

fn housing_csv() -> NamedTempFile {
    let mut rows = vec!["size,city,price".to_string()];
    for i in 0..30 {
        let size = 40.0 + 12.0 * i as f64;
        let city = ["north", "south", "east"][i % 3];
        let bump = [25.0, 0.0, 50.0][i % 3];
        let price = 80.0 + 3.0 * size + bump;
        rows.push(format!("{size},{city},{price}"));
    }
    write_csv(&rows.join("\n"))
}

#[test]
fn train_and_predict_unseen_city() {
    let file = housing_csv();
    let data = Dataset::from_csv(file.path()).unwrap();

    assert_eq!(data.numeric_columns(), vec!["size", "price"]);
    assert_eq!(data.category_columns(), vec!["city"]);

    let features = vec!["size".to_string(), "city".to_string()];
    let (model, score) = train(&data, "price", &features).unwrap();
    assert!(score <= 1.0);
    assert!(score > 0.0, "score: {score}");

    // "X" was never observed; it one-hot encodes as no matching category and
    // the prediction is still a finite number.
    let row = InputRow::from_parts(
        &features,
        vec![
            TokenValue::Number(120.0),
            TokenValue::Text("X".to_string()),
        ],
    );
    let prediction = model.predict(&row).unwrap();
    assert!(prediction.is_finite());
}

#[test]
fn repeated_training_is_reproducible() {
    let file = housing_csv();
    let data = Dataset::from_csv(file.path()).unwrap();
    let features = vec!["size".to_string(), "city".to_string()];

    let (model_a, score_a) = train(&data, "price", &features).unwrap();
    let (model_b, score_b) = train(&data, "price", &features).unwrap();
    assert_eq!(score_a, score_b);

    let row = InputRow::from_parts(
        &features,
        vec![
            TokenValue::Number(222.0),
            TokenValue::Text("south".to_string()),
        ],
    );
    assert_eq!(
        model_a.predict(&row).unwrap(),
        model_b.predict(&row).unwrap()
    );
}

#[test]
fn session_flow_from_csv_to_prediction() {
    let file = housing_csv();
    let data = Dataset::from_csv(file.path()).unwrap();
    let mut session = SessionContext::new(data);

    session.set_target("price").unwrap();
    session.set_category("city").unwrap();
    session
        .set_features(vec!["size".to_string(), "city".to_string()])
        .unwrap();

    let score = session.train().unwrap();
    assert!(score <= 1.0);

    let prediction = session.predict("150, east").unwrap();
    assert!(prediction.is_finite());

    // The target cannot be smuggled into the feature selection.
    session
        .set_features(vec![
            "size".to_string(),
            "city".to_string(),
            "price".to_string(),
        ])
        .unwrap_err();
}

#[test]
fn prediction_text_parses_by_shape() {
    let row = parse_input_row("3.5, red, 10", 3).unwrap();
    assert_eq!(
        row,
        vec![
            TokenValue::Number(3.5),
            TokenValue::Text("red".to_string()),
            TokenValue::Number(10.0),
        ]
    );
}

#[test]
fn token_count_mismatch_is_rejected_before_any_model_call() {
    let err = parse_input_row("1.0, 2.0", 3).unwrap_err();
    assert!(matches!(
        err,
        InputError::CountMismatch {
            expected: 3,
            found: 2
        }
    ));
}

#[test]
fn model_rejects_wrong_shape_row() {
    let file = housing_csv();
    let data = Dataset::from_csv(file.path()).unwrap();
    let features = vec!["size".to_string(), "city".to_string()];
    let (model, _) = train(&data, "price", &features).unwrap();

    let row = InputRow::from_parts(&features[..1], vec![TokenValue::Number(90.0)]);
    assert!(matches!(
        model.predict(&row).unwrap_err(),
        PredictError::ShapeMismatch {
            expected: 2,
            found: 1
        }
    ));
}

#[test]
fn unnamed_index_column_is_excluded_end_to_end() {
    let mut rows = vec!["Unnamed: 0,x,y".to_string()];
    for i in 0..20 {
        rows.push(format!("{i},{},{}", i as f64, 2.0 * i as f64));
    }
    let file = write_csv(&rows.join("\n"));
    let data = Dataset::from_csv(file.path()).unwrap();
    assert_eq!(data.column_names(), vec!["x", "y"]);

    let (_, score) = train(&data, "y", &["x".to_string()]).unwrap();
    assert!(score <= 1.0);
}

#[test]
fn sixteen_level_text_column_is_not_a_category() {
    let mut rows = vec!["label,y".to_string()];
    for i in 0..16 {
        rows.push(format!("L{i},{}", i as f64));
    }
    let file = write_csv(&rows.join("\n"));
    let data = Dataset::from_csv(file.path()).unwrap();
    assert!(data.category_columns().is_empty());
}
