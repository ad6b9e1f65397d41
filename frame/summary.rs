//! Descriptive summaries shown before training: the mean of the target per
//! category level, and the absolute Pearson correlation of every other
//! numeric column with the target. The shell renders both as bar rows.

use crate::frame::dataset::{numeric_column_values, string_column_values, DataError, Dataset};
use itertools::Itertools;
use std::collections::HashMap;

/// Mean of `target` per level of `category`, levels sorted lexicographically.
/// Rows with a null target or null category value are skipped.
pub fn group_means(
    data: &Dataset,
    target: &str,
    category: &str,
) -> Result<Vec<(String, f64)>, DataError> {
    let targets = numeric_column_values(data.frame(), target)?;
    let levels = string_column_values(data.frame(), category)?;

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for (level, value) in levels.into_iter().zip(targets) {
        if let (Some(level), Some(value)) = (level, value) {
            let entry = sums.entry(level).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    Ok(sums
        .into_iter()
        .map(|(level, (sum, count))| (level, sum / count as f64))
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect())
}

/// Absolute Pearson correlation of each numeric column with `target`,
/// sorted descending by magnitude. The target itself is excluded, as are
/// columns with zero variance on the pairwise-complete rows.
pub fn correlations(data: &Dataset, target: &str) -> Result<Vec<(String, f64)>, DataError> {
    let targets = numeric_column_values(data.frame(), target)?;

    let mut out = Vec::new();
    for name in data.numeric_columns() {
        if name == target {
            continue;
        }
        let values = numeric_column_values(data.frame(), &name)?;
        if let Some(r) = pearson(&values, &targets) {
            out.push((name, r.abs()));
        }
    }
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(out)
}

/// Pearson correlation over rows where both values are present.
/// Returns `None` when fewer than two complete pairs exist or either side
/// has zero variance.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
