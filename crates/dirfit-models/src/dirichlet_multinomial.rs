//! Estimation for the Dirichlet-Multinomial.
//!
//! Two fixed-point fitters built on Minka's digamma sufficient
//! statistics (eqs. 53 and 55 of "Estimating a Dirichlet
//! distribution"):
//!
//! - [`SymmetricDirichletMultinomialMap`] fits the single shared
//!   concentration of a symmetric Dirichlet compounded with
//!   per-observation multinomials, with an optional Gamma(a, b)
//!   hyperprior on alpha folded into both the update and the reported
//!   objective; Gamma(1, 0) disables the prior and recovers the MLE.
//! - [`DirichletMultinomialMle`] fits the full asymmetric concentration
//!   vector, one multiplicative update per component against a shared
//!   denominator, with the same in-place/copy aliasing contract as the
//!   plain Dirichlet fitter.
//!
//! Counts are carried as `f64` so datasets rescaled to fractional
//! counts fit through the same path; integral counts still take the
//! rising-factorial route in the likelihood.

use dirfit_core::error::{MathError, OptimizerError, OptimizerResult};
use dirfit_core::logmath::LogMath;
use dirfit_core::optimizer::{Optimizable, ValueAndState};
use dirfit_core::special::digamma;
use nalgebra::{DMatrix, DVector};

fn validate_counts(counts: &DMatrix<f64>) -> Result<(), MathError> {
    if counts.nrows() == 0 || counts.ncols() == 0 {
        return Err(MathError::invalid_argument(format!(
            "count matrix must be non-empty; was {}x{}",
            counts.nrows(),
            counts.ncols()
        )));
    }
    if counts.iter().any(|&c| !(c >= 0.0) || !c.is_finite()) {
        return Err(MathError::invalid_argument(
            "counts must be non-negative and finite",
        ));
    }
    Ok(())
}

/// Fixed-point Optimizable for the symmetric Dirichlet-Multinomial MAP
/// concentration.
#[derive(Debug, Clone)]
pub struct SymmetricDirichletMultinomialMap {
    counts: DMatrix<f64>,
    row_sums: DVector<f64>,
    gamma_a: f64,
    gamma_b: f64,
    log_math: LogMath,
}

impl SymmetricDirichletMultinomialMap {
    /// Builds the estimator from a count matrix, one observation per
    /// row, with a Gamma(a, b) hyperprior on alpha.
    ///
    /// Either prior parameter may be set non-positive to disable its
    /// side of the prior; `new_mle` is the shorthand for disabling both.
    pub fn new(counts: DMatrix<f64>, gamma_a: f64, gamma_b: f64) -> OptimizerResult<Self> {
        validate_counts(&counts)?;
        if !gamma_a.is_finite() || !gamma_b.is_finite() {
            return Err(OptimizerError::invalid_configuration(
                "hyperprior parameters must be finite",
                "gamma_a, gamma_b",
                format!("{gamma_a}, {gamma_b}"),
            ));
        }
        let row_sums = counts.column_sum();
        Ok(Self {
            counts,
            row_sums,
            gamma_a,
            gamma_b,
            log_math: LogMath::default(),
        })
    }

    /// The MLE special case, a Gamma(1, 0) hyperprior.
    pub fn new_mle(counts: DMatrix<f64>) -> OptimizerResult<Self> {
        Self::new(counts, 1.0, 0.0)
    }

    /// Number of observations.
    pub fn observations(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of categories.
    pub fn dimension(&self) -> usize {
        self.counts.ncols()
    }

    /// Log-posterior of the counts at `alpha`, up to the
    /// alpha-independent multinomial coefficients: the
    /// Dirichlet-Multinomial log-likelihood plus the Gamma prior term
    /// `(a − 1)·ln α − b·α` when the prior is active.
    ///
    /// Every data term is a ratio of gamma functions at a fixed offset,
    /// so the whole computation runs through the rising-factorial
    /// shortcut for integral counts.
    pub fn log_likelihood(&self, alpha: f64) -> OptimizerResult<f64> {
        Self::check_alpha(alpha)?;
        let k = self.dimension() as f64;
        let alpha_k = alpha * k;

        let mut llik = 0.0;
        if self.gamma_a > 0.0 && self.gamma_b > 0.0 {
            llik += (self.gamma_a - 1.0) * alpha.ln() - self.gamma_b * alpha;
        }
        for i in 0..self.counts.nrows() {
            // lnΓ(Kα) − lnΓ(s_i + Kα)
            llik -= self.log_math.log_gamma_ratio(self.row_sums[i] + alpha_k, alpha_k)?;
            for j in 0..self.counts.ncols() {
                // lnΓ(x_ij + α) − lnΓ(α)
                llik += self
                    .log_math
                    .log_gamma_ratio(self.counts[(i, j)] + alpha, alpha)?;
            }
        }
        Ok(llik)
    }

    fn check_alpha(alpha: f64) -> Result<(), MathError> {
        if !(alpha > 0.0) {
            return Err(MathError::invalid_argument(format!(
                "alpha must be strictly greater than zero; was {alpha}"
            )));
        }
        Ok(())
    }

    fn numerator(&self, alpha: f64) -> f64 {
        let n = self.observations() as f64;
        let k = self.dimension() as f64;
        let mut total = 0.0;
        for &count in self.counts.iter() {
            total += digamma(count + alpha);
        }
        total - digamma(alpha) * n * k
    }

    fn denominator(&self, alpha: f64) -> f64 {
        let n = self.observations() as f64;
        let k = self.dimension() as f64;
        let alpha_k = alpha * k;
        let mut total = 0.0;
        for i in 0..self.row_sums.len() {
            total += digamma(self.row_sums[i] + alpha_k);
        }
        (total - digamma(alpha_k) * n) * k
    }
}

impl Optimizable<f64> for SymmetricDirichletMultinomialMap {
    /// One fixed-point update `α ← α · num/den` where the numerator
    /// carries the prior's gradient contribution `(a − 1)/α` and the
    /// denominator carries `b`, so the fixed point is a stationary
    /// point of the log-posterior rather than of the bare likelihood.
    fn compute_next(&mut self, alpha: f64) -> OptimizerResult<ValueAndState<f64>> {
        Self::check_alpha(alpha)?;

        let mut numerator = self.numerator(alpha);
        if self.gamma_a > 0.0 {
            numerator += (self.gamma_a - 1.0) / alpha;
        }
        let mut denominator = self.denominator(alpha);
        if self.gamma_b > 0.0 {
            denominator += self.gamma_b;
        }
        let next = alpha * (numerator / denominator);
        if !(next > 0.0) || !next.is_finite() {
            return Err(OptimizerError::numerical_failure(format!(
                "fixed-point update left the positive domain; alpha = {next}"
            )));
        }

        Ok(ValueAndState::new(self.log_likelihood(next)?, next))
    }
}

/// Fixed-point Optimizable for the asymmetric Dirichlet-Multinomial
/// MLE.
///
/// Each step rescales every component of the concentration vector by
/// its own digamma numerator over a denominator shared across
/// components. The aliasing mode follows the same contract as
/// [`DirichletMle`](crate::dirichlet::DirichletMle): in-place mode
/// mutates and returns the caller's buffer, copy mode returns fresh
/// storage.
#[derive(Debug, Clone)]
pub struct DirichletMultinomialMle {
    counts: DMatrix<f64>,
    row_sums: DVector<f64>,
    in_place: bool,
    log_math: LogMath,
}

impl DirichletMultinomialMle {
    /// Builds the estimator from a count matrix, one observation per
    /// row.
    pub fn new(counts: DMatrix<f64>, in_place: bool) -> OptimizerResult<Self> {
        validate_counts(&counts)?;
        let row_sums = counts.column_sum();
        Ok(Self {
            counts,
            row_sums,
            in_place,
            log_math: LogMath::default(),
        })
    }

    /// Number of observations.
    pub fn observations(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of categories.
    pub fn dimension(&self) -> usize {
        self.counts.ncols()
    }

    /// Dirichlet-Multinomial log-likelihood of the counts at `alpha`,
    /// up to the alpha-independent multinomial coefficients.
    pub fn log_likelihood(&self, alpha: &DVector<f64>) -> OptimizerResult<f64> {
        self.check_state(alpha)?;
        let alpha_sum = alpha.sum();

        let mut llik = 0.0;
        for i in 0..self.counts.nrows() {
            llik -= self
                .log_math
                .log_gamma_ratio(self.row_sums[i] + alpha_sum, alpha_sum)?;
            for j in 0..self.counts.ncols() {
                llik += self
                    .log_math
                    .log_gamma_ratio(self.counts[(i, j)] + alpha[j], alpha[j])?;
            }
        }
        Ok(llik)
    }

    fn check_state(&self, alpha: &DVector<f64>) -> Result<(), MathError> {
        if alpha.len() != self.dimension() {
            return Err(MathError::invalid_argument(format!(
                "alpha has {} components but the data has {} categories",
                alpha.len(),
                self.dimension()
            )));
        }
        if alpha.iter().any(|&a| !(a > 0.0)) {
            return Err(MathError::invalid_argument(
                "every component of alpha must be strictly greater than zero",
            ));
        }
        Ok(())
    }
}

impl Optimizable<DVector<f64>> for DirichletMultinomialMle {
    fn compute_next(&mut self, alpha: DVector<f64>) -> OptimizerResult<ValueAndState<DVector<f64>>> {
        self.check_state(&alpha)?;
        let mut alpha = if self.in_place {
            alpha
        } else {
            alpha.clone_owned()
        };

        let n = self.observations() as f64;
        let alpha_sum = alpha.sum();

        let mut denominator = 0.0;
        for i in 0..self.row_sums.len() {
            denominator += digamma(self.row_sums[i] + alpha_sum);
        }
        denominator -= digamma(alpha_sum) * n;

        for j in 0..alpha.len() {
            let mut numerator = 0.0;
            for i in 0..self.counts.nrows() {
                numerator += digamma(self.counts[(i, j)] + alpha[j]);
            }
            numerator -= digamma(alpha[j]) * n;
            alpha[j] *= numerator / denominator;
        }

        if alpha.iter().any(|&a| !(a > 0.0) || !a.is_finite()) {
            return Err(OptimizerError::numerical_failure(
                "fixed-point update left the positive domain",
            ));
        }

        let value = self.log_likelihood(&alpha)?;
        Ok(ValueAndState::new(value, alpha))
    }
}
