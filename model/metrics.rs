//! Evaluation metrics.

use ndarray::ArrayView1;

/// Coefficient of determination: 1 − SS_res / SS_tot.
///
/// 1.0 is a perfect fit; the score goes negative when the model does worse
/// than predicting the mean. When the actual values are constant the usual
/// ratio is undefined; a perfect fit then scores 1.0 and anything else 0.0.
pub fn r2_score(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());

    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn perfect_fit_scores_one() {
        let y = array![1.0, 2.0, 3.0];
        assert_abs_diff_eq!(r2_score(y.view(), y.view()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![2.0, 2.0, 2.0];
        assert_abs_diff_eq!(
            r2_score(actual.view(), predicted.view()),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn poor_fit_goes_negative() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![3.0, 3.0, 3.0];
        assert!(r2_score(actual.view(), predicted.view()) < 0.0);
    }

    #[test]
    fn constant_actuals_follow_the_convention() {
        let actual = array![2.0, 2.0, 2.0];
        assert_abs_diff_eq!(r2_score(actual.view(), actual.view()), 1.0, epsilon = 1e-12);
        let off = array![2.0, 2.0, 2.5];
        assert_abs_diff_eq!(
            r2_score(actual.view(), off.view()),
            0.0,
            epsilon = 1e-12
        );
    }
}
