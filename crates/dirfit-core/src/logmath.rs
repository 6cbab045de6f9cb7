//! Numerically stable log-space arithmetic.
//!
//! Maximum-likelihood fitting of Dirichlet-family models evaluates
//! log-gamma differences across many data points. Subtracting two large
//! lnΓ values loses precision when they are close, and summing k log
//! terms is slow when k is large, so [`LogMath::log_gamma_ratio`]
//! dispatches on the argument difference: near-integral differences go
//! through the rising factorial, everything else through lnΓ directly.
//!
//! The "sloppy" log-add and log-subtract prune terms whose contribution
//! is below a fixed threshold. This is an intentional accuracy/speed
//! trade-off; the threshold is a configuration point, not a constant
//! baked into the call sites.

use crate::error::{MathError, MathResult};
use crate::special::ln_gamma;

/// Terms whose log-space distance from the dominant term exceeds this
/// (negative) threshold are discarded by the sloppy operations.
pub const LOG_PRUNE_THRESHOLD: f64 = -50.0;

/// A gamma-ratio argument difference within this tolerance of an integer
/// is treated as exactly integral.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-10;

/// Below this exponent the rising factorial is accumulated term by term;
/// at or above it, the lnΓ difference is used instead.
pub const RISING_FACTORIAL_DIRECT_LIMIT: i64 = 8;

/// Configurable log-space arithmetic.
///
/// `LogMath::default()` uses the standard thresholds; the builder
/// methods exist so the dispatch boundaries can be validated against
/// alternative settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogMath {
    /// Pruning threshold for the sloppy operations.
    pub prune_threshold: f64,
    /// Tolerance of the integrality test in `log_gamma_ratio`.
    pub integrality_tolerance: f64,
    /// Term-count cutoff between direct summation and lnΓ difference.
    pub direct_limit: i64,
}

impl Default for LogMath {
    fn default() -> Self {
        Self {
            prune_threshold: LOG_PRUNE_THRESHOLD,
            integrality_tolerance: INTEGRALITY_TOLERANCE,
            direct_limit: RISING_FACTORIAL_DIRECT_LIMIT,
        }
    }
}

impl LogMath {
    /// Creates a configuration with the standard thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pruning threshold for sloppy add/subtract.
    pub fn with_prune_threshold(mut self, threshold: f64) -> Self {
        self.prune_threshold = threshold;
        self
    }

    /// Sets the integrality tolerance for gamma-ratio dispatch.
    pub fn with_integrality_tolerance(mut self, tolerance: f64) -> Self {
        self.integrality_tolerance = tolerance;
        self
    }

    /// Sets the direct-summation cutoff for the rising factorial.
    pub fn with_direct_limit(mut self, limit: i64) -> Self {
        self.direct_limit = limit;
        self
    }

    /// Computes `log(e^x + e^y)` without overflow.
    ///
    /// Operands are ordered so the larger dominates; when the smaller
    /// term is more than `prune_threshold` below the larger in log
    /// space, it is discarded and the larger value returned unchanged.
    pub fn log_add_sloppy(&self, x: f64, y: f64) -> f64 {
        let (x, y) = if x < y { (y, x) } else { (x, y) };

        if x == f64::NEG_INFINITY {
            return x;
        }

        let neg_diff = y - x;
        if neg_diff < self.prune_threshold {
            return x;
        }

        x + neg_diff.exp().ln_1p()
    }

    /// Computes `log(Σ e^v)` over a slice by folding [`Self::log_add_sloppy`].
    ///
    /// Returns negative infinity for an empty slice.
    pub fn log_sum_sloppy(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &v| self.log_add_sloppy(acc, v))
    }

    /// Computes `log(e^x − e^y)`, requiring `x ≥ y`.
    ///
    /// Fails with a domain error when `y > x`, since the difference
    /// would be negative. The same negligible-term pruning as
    /// [`Self::log_add_sloppy`] applies.
    pub fn log_subtract_sloppy(&self, x: f64, y: f64) -> MathResult<f64> {
        if x == f64::NEG_INFINITY && y == f64::NEG_INFINITY {
            return Ok(x);
        }

        if x < y {
            return Err(MathError::domain_error(format!(
                "cannot take the log of a negative difference: x ({x}) < y ({y})"
            )));
        }

        let neg_diff = y - x;
        if neg_diff < self.prune_threshold {
            return Ok(x);
        }

        Ok(x + (-neg_diff.exp()).ln_1p())
    }

    /// True when `a` is within the integrality tolerance of an integer.
    pub fn is_integral(&self, a: f64) -> bool {
        (a - a.round()).abs() <= self.integrality_tolerance
    }

    /// Computes `lnΓ(numerator) − lnΓ(denominator)`.
    ///
    /// When the difference is integral the ratio telescopes into a
    /// rising factorial, which is both faster and more stable than
    /// subtracting two large lnΓ values; otherwise lnΓ is evaluated
    /// directly on both arguments.
    pub fn log_gamma_ratio(&self, numerator: f64, denominator: f64) -> MathResult<f64> {
        let diff = numerator - denominator;
        if self.is_integral(diff) {
            let k = diff.round() as i64;
            if k >= 0 {
                return self.log_rising_factorial(denominator, k);
            }
            // lnΓ(n) − lnΓ(d) = −(lnΓ(d) − lnΓ(n)) when d exceeds n by an integer
            return Ok(-self.log_rising_factorial(numerator, -k)?);
        }
        Ok(ln_gamma(numerator) - ln_gamma(denominator))
    }

    /// Computes `lnΓ(x + k) − lnΓ(x)`.
    pub fn log_gamma_ratio_by_difference(&self, x: f64, k: f64) -> MathResult<f64> {
        self.log_gamma_ratio(x + k, x)
    }

    /// Computes the log rising factorial `ln[x·(x+1)·…·(x+k−1)]`.
    ///
    /// Requires `x ≥ 0` and `k ≥ 0`. Small `k` is accumulated as
    /// `Σ ln(x+i)`; for `k` at or beyond the direct limit the sum no
    /// longer offers a stability or speed advantage, so the lnΓ
    /// difference is used.
    pub fn log_rising_factorial(&self, x: f64, k: i64) -> MathResult<f64> {
        if k < 0 {
            return Err(MathError::invalid_argument(format!(
                "rising factorial exponent ({k}) must be non-negative"
            )));
        }
        if x < 0.0 {
            return Err(MathError::invalid_argument(format!(
                "rising factorial base ({x}) must be non-negative"
            )));
        }

        if k < self.direct_limit {
            return Ok(log_rising_factorial_direct(x, k));
        }
        Ok(ln_gamma(x + k as f64) - ln_gamma(x))
    }
}

/// Term-by-term accumulation of `Σ ln(x+i)` for `i` in `0..k`.
fn log_rising_factorial_direct(x: f64, k: i64) -> f64 {
    if k == 0 {
        return 0.0;
    }

    let mut acc = x.ln();
    for i in 1..k {
        acc += (x + i as f64).ln();
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_log_add_sloppy() {
        let m = LogMath::default();

        // Exact small-number check: log(e^0 + e^0) = ln 2
        assert_abs_diff_eq!(m.log_add_sloppy(0.0, 0.0), 2.0_f64.ln(), epsilon = 1e-14);
        // Symmetry under operand order
        assert_abs_diff_eq!(
            m.log_add_sloppy(1.0, 3.0),
            m.log_add_sloppy(3.0, 1.0),
            epsilon = 1e-14
        );
        // Huge operands would overflow a naive exp
        let sum = m.log_add_sloppy(1000.0, 1000.0);
        assert_abs_diff_eq!(sum, 1000.0 + 2.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_log_add_sloppy_negative_infinity() {
        let m = LogMath::default();
        assert_eq!(
            m.log_add_sloppy(f64::NEG_INFINITY, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
        assert_abs_diff_eq!(m.log_add_sloppy(f64::NEG_INFINITY, 2.0), 2.0);
        assert_abs_diff_eq!(m.log_add_sloppy(2.0, f64::NEG_INFINITY), 2.0);
    }

    #[test]
    fn test_log_add_sloppy_prunes_negligible_terms() {
        let m = LogMath::default();
        // 51 below the dominant term: pruned, x returned bit-for-bit
        assert_eq!(m.log_add_sloppy(0.0, -51.0), 0.0);
        // 49 below: kept
        assert!(m.log_add_sloppy(0.0, -49.0) > 0.0);
    }

    #[test]
    fn test_log_sum_sloppy() {
        let m = LogMath::default();
        assert_eq!(m.log_sum_sloppy(&[]), f64::NEG_INFINITY);
        // log(e^0 + e^0 + e^0) = ln 3
        assert_abs_diff_eq!(
            m.log_sum_sloppy(&[0.0, 0.0, 0.0]),
            3.0_f64.ln(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_log_subtract_sloppy() {
        let m = LogMath::default();

        // log(e^ln3 - e^ln1) = ln 2
        let x = 3.0_f64.ln();
        let y = 1.0_f64.ln();
        assert_abs_diff_eq!(
            m.log_subtract_sloppy(x, y).unwrap(),
            2.0_f64.ln(),
            epsilon = 1e-14
        );

        // Pruning: y far below x leaves x unchanged
        assert_eq!(m.log_subtract_sloppy(0.0, -60.0).unwrap(), 0.0);

        // Subtracting from -inf is -inf
        assert_eq!(
            m.log_subtract_sloppy(f64::NEG_INFINITY, f64::NEG_INFINITY)
                .unwrap(),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_log_subtract_sloppy_rejects_negative_difference() {
        let m = LogMath::default();
        let err = m.log_subtract_sloppy(1.0, 2.0).unwrap_err();
        assert!(matches!(err, MathError::DomainError { .. }));
    }

    #[test]
    fn test_log_rising_factorial_small_k() {
        let m = LogMath::default();
        assert_abs_diff_eq!(m.log_rising_factorial(10.3, 0).unwrap(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(
            m.log_rising_factorial(10.3, 1).unwrap(),
            10.3_f64.ln(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            m.log_rising_factorial(10.3, 2).unwrap(),
            (10.3 * 11.3_f64).ln(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            m.log_rising_factorial(10.3, 4).unwrap(),
            (10.3 * 11.3 * 12.3 * 13.3_f64).ln(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_log_rising_factorial_matches_gamma_difference() {
        let m = LogMath::default();

        // One case below the direct-summation cutoff
        let k = RISING_FACTORIAL_DIRECT_LIMIT - 1;
        assert_abs_diff_eq!(
            m.log_rising_factorial(1.3, k).unwrap(),
            ln_gamma(1.3 + k as f64) - ln_gamma(1.3),
            epsilon = 1e-10
        );

        // One case far beyond it
        let k = RISING_FACTORIAL_DIRECT_LIMIT + 100;
        assert_abs_diff_eq!(
            m.log_rising_factorial(1.3, k).unwrap(),
            ln_gamma(1.3 + k as f64) - ln_gamma(1.3),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_log_rising_factorial_preconditions() {
        let m = LogMath::default();
        assert!(matches!(
            m.log_rising_factorial(1.0, -1).unwrap_err(),
            MathError::InvalidArgument { .. }
        ));
        assert!(matches!(
            m.log_rising_factorial(-1.0, 0).unwrap_err(),
            MathError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_log_gamma_ratio_integral_difference() {
        let m = LogMath::default();
        assert_abs_diff_eq!(
            m.log_gamma_ratio(10.3, 10.3).unwrap(),
            0.0,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            m.log_gamma_ratio(10.3 + 3.0, 10.3).unwrap(),
            (10.3 * 11.3 * 12.3_f64).ln(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            m.log_gamma_ratio(1.3 + 10.0, 1.3).unwrap(),
            (1.3 * 2.3 * 3.3 * 4.3 * 5.3 * 6.3 * 7.3 * 8.3 * 9.3 * 10.3_f64).ln(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_log_gamma_ratio_negative_integral_difference() {
        let m = LogMath::default();
        // lnΓ(1.3) − lnΓ(4.3) = −ln(1.3·2.3·3.3)
        assert_abs_diff_eq!(
            m.log_gamma_ratio(1.3, 4.3).unwrap(),
            -(1.3 * 2.3 * 3.3_f64).ln(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_log_gamma_ratio_fractional_difference() {
        let m = LogMath::default();
        assert_abs_diff_eq!(
            m.log_gamma_ratio(7.25, 2.5).unwrap(),
            ln_gamma(7.25) - ln_gamma(2.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_log_gamma_ratio_by_difference() {
        let m = LogMath::default();
        assert_abs_diff_eq!(
            m.log_gamma_ratio_by_difference(10.3, 2.0).unwrap(),
            (10.3 * 11.3_f64).ln(),
            epsilon = 1e-10
        );
    }

    proptest! {
        #[test]
        fn prop_rising_factorial_equals_gamma_difference(
            x in 0.01f64..50.0,
            k in 0i64..60,
        ) {
            let m = LogMath::default();
            let direct = m.log_rising_factorial(x, k).unwrap();
            let by_gamma = ln_gamma(x + k as f64) - ln_gamma(x);
            prop_assert!((direct - by_gamma).abs() < 1e-9);
        }

        #[test]
        fn prop_log_add_commutes(x in -100.0f64..100.0, y in -100.0f64..100.0) {
            let m = LogMath::default();
            prop_assert_eq!(m.log_add_sloppy(x, y), m.log_add_sloppy(y, x));
        }
    }
}
