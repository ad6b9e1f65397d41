//! The interactive shell: loads a CSV dataset, shows the preview and column
//! classification, then runs a synchronous prompt loop. Every action (select,
//! summarize, train, predict) runs to completion before the next prompt;
//! errors are reported inline and never end the session.

use arbor::frame::summary::{correlations, group_means};
use arbor::frame::{Dataset, MAX_CATEGORY_LEVELS};
use arbor::session::SessionContext;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

/// Width of the widest bar in the text charts.
const BAR_WIDTH: usize = 40;
/// Rows shown in the dataset preview.
const PREVIEW_ROWS: usize = 10;

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Interactive random-forest regression over a CSV table",
    long_about = "Loads a CSV dataset and opens an interactive session: pick a numeric \
                  target and a feature subset, inspect grouped means and correlations, \
                  train a random-forest regression model, and predict from manually \
                  entered feature values."
)]
struct Cli {
    /// Path to the CSV file (comma-delimited, header row required)
    #[arg(value_name = "DATA_CSV")]
    data: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let dataset = match Dataset::from_csv(&cli.data) {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    println!("Preview of dataset (first {PREVIEW_ROWS} rows):");
    println!("{}", dataset.preview(PREVIEW_ROWS));

    let numeric = dataset.numeric_columns();
    if numeric.is_empty() {
        // No valid target exists; reported, not fatal, but nothing can run.
        eprintln!("No numerical columns found in the dataset.");
        process::exit(1);
    }
    println!("Numeric columns (valid targets): {}", numeric.join(", "));

    let categories = dataset.category_columns();
    if categories.is_empty() {
        println!(
            "No suitable categorical columns (with <= {MAX_CATEGORY_LEVELS} unique values) available."
        );
    } else {
        println!("Categorical columns (grouping): {}", categories.join(", "));
    }

    let mut session = SessionContext::new(dataset);
    print_help();

    let stdin = io::stdin();
    loop {
        print!("arbor> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "help" => print_help(),
            "columns" => print_columns(&session),
            "target" => report(session.set_target(rest).map(|()| {
                format!("Target set to '{rest}'.")
            })),
            "category" => report(session.set_category(rest).map(|()| {
                format!("Category set to '{rest}'.")
            })),
            "features" => {
                let features: Vec<String> = rest
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                report(session.set_features(features).map(|()| {
                    format!("Features set to: {}", session.features().join(", "))
                }));
            }
            "summary" => print_summary(&session),
            "train" => report(
                session
                    .train()
                    .map(|score| format!("The R\u{b2} score is: {score:.2}")),
            ),
            "predict" => match session.predict(rest) {
                Ok(prediction) => {
                    let target = session
                        .fitted()
                        .map(|artifact| artifact.model.target().to_string())
                        .unwrap_or_default();
                    println!("Predicted {target} is: {prediction:.2}");
                }
                Err(e) => println!("Invalid input: {e}"),
            },
            other => println!("Unknown command '{other}'. Type `help` for the command list."),
        }
    }
}

fn report(outcome: Result<String, arbor::session::SessionError>) {
    match outcome {
        Ok(message) => println!("{message}"),
        Err(e) => println!("{e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n\
         \x20 target <column>          select the numeric target\n\
         \x20 category <column>        select the grouping column for summaries\n\
         \x20 features <a, b, c>       select the ordered feature subset\n\
         \x20                          (defaults to the numeric columns minus the target)\n\
         \x20 summary                  grouped means and correlation strengths\n\
         \x20 train                    fit the model and report held-out R\u{b2}\n\
         \x20 predict <v1, v2, ...>    predict from comma-separated feature values\n\
         \x20 columns                  list column classification\n\
         \x20 help | quit"
    );
}

fn print_columns(session: &SessionContext) {
    let dataset = session.dataset();
    println!("Numeric: {}", dataset.numeric_columns().join(", "));
    let categories = dataset.category_columns();
    if categories.is_empty() {
        println!("Categorical: (none with <= {MAX_CATEGORY_LEVELS} unique values)");
    } else {
        println!("Categorical: {}", categories.join(", "));
    }
    if let Some(target) = session.target() {
        println!("Target: {target}");
    }
    if !session.features().is_empty() {
        println!("Features: {}", session.features().join(", "));
    }
}

fn print_summary(session: &SessionContext) {
    let Some(target) = session.target() else {
        println!("Select a target column first.");
        return;
    };

    match session.category() {
        Some(category) => match group_means(session.dataset(), target, category) {
            Ok(means) => {
                println!("Average {target} by {category}:");
                print_bars(&means);
            }
            Err(e) => println!("{e}"),
        },
        None => println!("No category selected; skipping the grouped-mean chart."),
    }

    match correlations(session.dataset(), target) {
        Ok(corr) if corr.is_empty() => {
            println!("No numeric features to correlate with {target}.")
        }
        Ok(corr) => {
            println!("Correlation strength with {target}:");
            print_bars(&corr);
        }
        Err(e) => println!("{e}"),
    }
}

/// Renders labeled values as horizontal bars scaled to the largest magnitude.
fn print_bars(rows: &[(String, f64)]) {
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let max = rows
        .iter()
        .map(|(_, value)| value.abs())
        .fold(0.0f64, f64::max);

    for (label, value) in rows {
        let width = if max > 0.0 {
            ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        println!(
            "  {label:<label_width$}  {} {value:.2}",
            "\u{2588}".repeat(width.max(1))
        );
    }
}
