//! Chi-squared test of independence for 2x2 contingency tables
//!
//! Implements the Pearson chi-squared test with Yates continuity
//! correction. The correction is always applied for 2x2 tables; that is
//! the single convention this tool uses, so statistics are comparable
//! across runs.

use serde::Serialize;
use thiserror::Error;

/// Degrees of freedom for a 2x2 contingency table
const DOF_2X2: usize = 1;

/// Errors produced by the significance test
#[derive(Debug, Error)]
pub enum StatsError {
    /// A marginal total is zero, so expected frequencies cannot be
    /// formed and the test is undefined for this table.
    #[error("contingency table is degenerate: a {0} marginal is empty")]
    EmptyMarginal(&'static str),
}

/// Result of a chi-squared independence test on a 2x2 table
#[derive(Debug, Clone, Serialize)]
pub struct ChiSquareTest {
    /// Yates-corrected Pearson chi-squared statistic
    pub statistic: f64,
    /// Probability of a statistic at least this large under independence
    pub p_value: f64,
    /// Degrees of freedom (always 1 for a 2x2 table)
    pub dof: usize,
    /// Expected frequencies under the independence hypothesis
    pub expected: [[f64; 2]; 2],
}

impl ChiSquareTest {
    /// Whether the observed difference is significant at the given level
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Run the chi-squared test of independence on a 2x2 contingency table.
///
/// Rows are cohorts, columns are the binary outcome counts. Yates
/// continuity correction shrinks each |observed - expected| deviation by
/// 0.5 (floored at zero) before squaring.
///
/// Returns [`StatsError::EmptyMarginal`] when a row or column sums to
/// zero; callers report that as an undefined test, not a failure of the
/// analysis.
pub fn chi_square_2x2(observed: [[u64; 2]; 2]) -> Result<ChiSquareTest, StatsError> {
    let obs = [
        [observed[0][0] as f64, observed[0][1] as f64],
        [observed[1][0] as f64, observed[1][1] as f64],
    ];

    let row_totals = [obs[0][0] + obs[0][1], obs[1][0] + obs[1][1]];
    let col_totals = [obs[0][0] + obs[1][0], obs[0][1] + obs[1][1]];
    let grand_total = row_totals[0] + row_totals[1];

    if row_totals.iter().any(|&total| total == 0.0) {
        return Err(StatsError::EmptyMarginal("row"));
    }
    if col_totals.iter().any(|&total| total == 0.0) {
        return Err(StatsError::EmptyMarginal("column"));
    }

    let mut expected = [[0.0f64; 2]; 2];
    let mut statistic = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let e = row_totals[i] * col_totals[j] / grand_total;
            expected[i][j] = e;
            let deviation = ((obs[i][j] - e).abs() - 0.5).max(0.0);
            statistic += deviation * deviation / e;
        }
    }

    Ok(ChiSquareTest {
        statistic,
        p_value: chi_square_survival_1dof(statistic),
        dof: DOF_2X2,
        expected,
    })
}

/// Survival function of the chi-squared distribution at one degree of
/// freedom: P(X >= x) = erfc(sqrt(x / 2)).
fn chi_square_survival_1dof(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    erfc((x / 2.0).sqrt())
}

/// Complementary error function via the rational Chebyshev approximation,
/// fractional error below 1.2e-7 everywhere on the real line.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = 1.00002368
        + t * (0.37409196
            + t * (0.09678418
                + t * (-0.18628806
                    + t * (0.27886807
                        + t * (-1.13520398
                            + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277)))))));
    let ans = t * (-z * z - 1.26551223 + t * poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {} within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_application_rate_reference_table() {
        let test = chi_square_2x2([[250, 2254], [325, 2175]]).unwrap();

        assert_close(test.statistic, 10.894, 1e-3);
        assert_close(test.p_value, 0.000965, 1e-5);
        assert_eq!(test.dof, 1);

        assert_close(test.expected[0][0], 287.7298, 1e-3);
        assert_close(test.expected[0][1], 2216.2702, 1e-3);
        assert_close(test.expected[1][0], 287.2702, 1e-3);
        assert_close(test.expected[1][1], 2212.7298, 1e-3);
    }

    #[test]
    fn test_member_rate_reference_table() {
        let test = chi_square_2x2([[200, 50], [250, 75]]).unwrap();

        assert_close(test.statistic, 0.6159, 1e-3);
        assert_close(test.p_value, 0.4326, 1e-4);
        assert_eq!(test.dof, 1);
    }

    #[test]
    fn test_overall_purchase_reference_table() {
        let test = chi_square_2x2([[200, 2304], [250, 2250]]).unwrap();

        assert_close(test.statistic, 5.949, 1e-3);
        assert_close(test.p_value, 0.01472, 1e-4);
    }

    #[test]
    fn test_row_swap_does_not_change_result() {
        let original = chi_square_2x2([[250, 2254], [325, 2175]]).unwrap();
        let swapped = chi_square_2x2([[325, 2175], [250, 2254]]).unwrap();

        assert_close(swapped.statistic, original.statistic, 1e-12);
        assert_close(swapped.p_value, original.p_value, 1e-12);
    }

    #[test]
    fn test_column_swap_does_not_change_result() {
        let original = chi_square_2x2([[250, 2254], [325, 2175]]).unwrap();
        let swapped = chi_square_2x2([[2254, 250], [2175, 325]]).unwrap();

        assert_close(swapped.statistic, original.statistic, 1e-12);
        assert_close(swapped.p_value, original.p_value, 1e-12);
    }

    #[test]
    fn test_empty_row_marginal_is_degenerate() {
        let result = chi_square_2x2([[0, 0], [10, 20]]);
        assert!(matches!(result, Err(StatsError::EmptyMarginal("row"))));
    }

    #[test]
    fn test_empty_column_marginal_is_degenerate() {
        let result = chi_square_2x2([[0, 10], [0, 20]]);
        assert!(matches!(result, Err(StatsError::EmptyMarginal("column"))));
    }

    #[test]
    fn test_identical_rows_are_not_significant() {
        let test = chi_square_2x2([[50, 50], [50, 50]]).unwrap();

        assert_close(test.statistic, 0.0, 1e-12);
        assert_close(test.p_value, 1.0, 1e-12);
        assert!(!test.is_significant(0.05));
    }

    #[test]
    fn test_sub_half_deviations_are_floored() {
        // |observed - expected| = 0.5 in every cell; the correction
        // floors each deviation at zero rather than going negative.
        let test = chi_square_2x2([[10, 9], [9, 10]]).unwrap();

        assert_close(test.statistic, 0.0, 1e-12);
        assert_close(test.p_value, 1.0, 1e-12);
    }

    #[test]
    fn test_significance_threshold() {
        let test = chi_square_2x2([[250, 2254], [325, 2175]]).unwrap();

        assert!(test.is_significant(0.05));
        assert!(!test.is_significant(0.0001));
    }
}
