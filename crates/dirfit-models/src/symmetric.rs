//! Maximum-likelihood estimation for the symmetric Dirichlet.
//!
//! A symmetric Dirichlet shares one concentration value across all
//! components, so the likelihood collapses to a univariate function of
//! alpha and the whole dataset collapses to a single sufficient
//! statistic, the sum of all log-proportions.

use dirfit_core::error::{MathError, MathResult, OptimizerError, OptimizerResult};
use dirfit_core::newton::ScalarObjective;
use dirfit_core::optimizer::{Optimizable, ValueAndState};
use dirfit_core::special::{digamma, ln_gamma, trigamma};
use nalgebra::DMatrix;

/// Sufficient statistics and derivatives of the symmetric Dirichlet
/// log-likelihood.
///
/// For `N` observations over `K` components with log-proportion sum
/// `S`, the log-likelihood is
/// `L(α) = N·(ln Γ(Kα) − K·ln Γ(α)) + (α − 1)·S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricDirichletStats {
    dimension: usize,
    observations: usize,
    sum_log_theta: f64,
}

impl SymmetricDirichletStats {
    /// Builds the statistics from explicit values.
    pub fn new(dimension: usize, observations: usize, sum_log_theta: f64) -> MathResult<Self> {
        if dimension == 0 || observations == 0 {
            return Err(MathError::invalid_argument(format!(
                "dimension ({dimension}) and observations ({observations}) must be positive"
            )));
        }
        if !sum_log_theta.is_finite() {
            return Err(MathError::invalid_argument(format!(
                "sum of log-proportions ({sum_log_theta}) must be finite"
            )));
        }
        Ok(Self {
            dimension,
            observations,
            sum_log_theta,
        })
    }

    /// Builds the statistics from a dataset of log-proportions, one
    /// observation per row.
    pub fn from_log_proportions(data: &DMatrix<f64>) -> MathResult<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(MathError::invalid_argument(format!(
                "dataset must be non-empty; was {}x{}",
                data.nrows(),
                data.ncols()
            )));
        }
        Self::new(data.ncols(), data.nrows(), data.sum())
    }

    /// Number of Dirichlet components.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of observations.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Sum of all log-proportions in the dataset.
    pub fn sum_log_theta(&self) -> f64 {
        self.sum_log_theta
    }

    fn check_alpha(alpha: f64) -> MathResult<()> {
        if !(alpha > 0.0) {
            return Err(MathError::invalid_argument(format!(
                "alpha must be strictly greater than zero; was {alpha}"
            )));
        }
        Ok(())
    }

    /// Log-likelihood at `alpha`.
    pub fn value_at(&self, alpha: f64) -> MathResult<f64> {
        Self::check_alpha(alpha)?;
        let n = self.observations as f64;
        let k = self.dimension as f64;
        Ok(n * (ln_gamma(k * alpha) - k * ln_gamma(alpha)) + (alpha - 1.0) * self.sum_log_theta)
    }

    /// First derivative of the log-likelihood at `alpha`.
    pub fn first_derivative_at(&self, alpha: f64) -> MathResult<f64> {
        Self::check_alpha(alpha)?;
        let n = self.observations as f64;
        let k = self.dimension as f64;
        Ok(n * k * (digamma(k * alpha) - digamma(alpha)) + self.sum_log_theta)
    }

    /// Second derivative of the log-likelihood at `alpha`.
    pub fn second_derivative_at(&self, alpha: f64) -> MathResult<f64> {
        Self::check_alpha(alpha)?;
        let n = self.observations as f64;
        let k = self.dimension as f64;
        Ok(n * k * (k * trigamma(k * alpha) - trigamma(alpha)))
    }
}

/// The [`ScalarObjective`] view reports NaN outside the positive
/// domain, which the univariate Newton step rejects as a non-finite
/// update.
impl ScalarObjective for SymmetricDirichletStats {
    fn value(&self, alpha: f64) -> f64 {
        self.value_at(alpha).unwrap_or(f64::NAN)
    }

    fn first_derivative(&self, alpha: f64) -> f64 {
        self.first_derivative_at(alpha).unwrap_or(f64::NAN)
    }

    fn second_derivative(&self, alpha: f64) -> f64 {
        self.second_derivative_at(alpha).unwrap_or(f64::NAN)
    }
}

/// Newton-step Optimizable for the symmetric Dirichlet MLE.
///
/// A step that leaves the positive domain is a terminal numerical
/// failure rather than something to clamp, since the likelihood is
/// undefined there and silently projecting back would hide divergence
/// from the caller.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricDirichletMle {
    stats: SymmetricDirichletStats,
}

impl SymmetricDirichletMle {
    /// Wraps precomputed sufficient statistics.
    pub fn new(stats: SymmetricDirichletStats) -> Self {
        Self { stats }
    }

    /// Builds the estimator from a dataset of log-proportions.
    pub fn from_log_proportions(data: &DMatrix<f64>) -> MathResult<Self> {
        Ok(Self::new(SymmetricDirichletStats::from_log_proportions(
            data,
        )?))
    }

    /// The underlying sufficient statistics.
    pub fn stats(&self) -> &SymmetricDirichletStats {
        &self.stats
    }
}

impl Optimizable<f64> for SymmetricDirichletMle {
    fn compute_next(&mut self, alpha: f64) -> OptimizerResult<ValueAndState<f64>> {
        let next = alpha
            - self.stats.first_derivative_at(alpha)? / self.stats.second_derivative_at(alpha)?;
        if !(next > 0.0) {
            return Err(OptimizerError::numerical_failure(format!(
                "Newton update left the positive domain; alpha = {next}"
            )));
        }
        Ok(ValueAndState::new(self.stats.value_at(next)?, next))
    }
}

/// Fixed-point Optimizable for the symmetric Dirichlet MLE.
///
/// Works on the precision `s = Kα` with Minka's update
/// `(K−1)/s′ = (K−1)/s − ψ(s) + ψ(α) − S/(NK)` and reports back in
/// alpha. Converges linearly, so it usually needs more iterations than
/// [`SymmetricDirichletMle`], but every iterate stays a plain rescale
/// with no Hessian involved.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricDirichletFixedPoint {
    stats: SymmetricDirichletStats,
}

impl SymmetricDirichletFixedPoint {
    /// Wraps precomputed sufficient statistics.
    pub fn new(stats: SymmetricDirichletStats) -> Self {
        Self { stats }
    }

    /// Builds the estimator from a dataset of log-proportions.
    pub fn from_log_proportions(data: &DMatrix<f64>) -> MathResult<Self> {
        Ok(Self::new(SymmetricDirichletStats::from_log_proportions(
            data,
        )?))
    }

    /// The underlying sufficient statistics.
    pub fn stats(&self) -> &SymmetricDirichletStats {
        &self.stats
    }
}

impl Optimizable<f64> for SymmetricDirichletFixedPoint {
    fn compute_next(&mut self, alpha: f64) -> OptimizerResult<ValueAndState<f64>> {
        SymmetricDirichletStats::check_alpha(alpha)?;
        let n = self.stats.observations() as f64;
        let k = self.stats.dimension() as f64;
        let s = k * alpha;
        let mean_log_theta = self.stats.sum_log_theta() / (n * k);

        let denominator = (k - 1.0) / s - digamma(s) + digamma(alpha) - mean_log_theta;
        let next = (k - 1.0) / denominator / k;
        if !(next > 0.0) || !next.is_finite() {
            return Err(OptimizerError::numerical_failure(format!(
                "fixed-point update left the positive domain; alpha = {next}"
            )));
        }
        Ok(ValueAndState::new(self.stats.value_at(next)?, next))
    }
}
