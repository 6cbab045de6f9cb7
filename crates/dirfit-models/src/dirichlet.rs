//! Maximum-likelihood estimation for the asymmetric Dirichlet.
//!
//! Implements Minka's Newton update for the Dirichlet concentration
//! vector, specialized so the Hessian (a diagonal plus a rank-one
//! constant) is inverted analytically instead of through a linear
//! solve. See "Estimating a Dirichlet distribution" (Minka, 2000).

use dirfit_core::error::{MathError, OptimizerResult};
use dirfit_core::optimizer::{Optimizable, ValueAndState};
use dirfit_core::special::{digamma, ln_gamma, trigamma};
use nalgebra::{DMatrix, DVector};

/// Newton-step Optimizable for the Dirichlet MLE.
///
/// Consumes a dataset of log-proportions once, at construction, and
/// retains only the sufficient statistics: the per-component sums of
/// the log-proportions and the observation count.
///
/// The aliasing mode is part of the contract. In in-place mode each
/// step mutates and returns the caller's buffer; in copy mode each step
/// leaves its input untouched and returns fresh storage.
#[derive(Debug, Clone)]
pub struct DirichletMle {
    sum_log_theta: DVector<f64>,
    observations: usize,
    in_place: bool,
}

impl DirichletMle {
    /// Builds the estimator from a dataset of log-proportions, one
    /// observation per row.
    pub fn from_log_proportions(data: &DMatrix<f64>, in_place: bool) -> OptimizerResult<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(MathError::invalid_argument(format!(
                "dataset must be non-empty; was {}x{}",
                data.nrows(),
                data.ncols()
            ))
            .into());
        }
        Ok(Self {
            sum_log_theta: data.row_sum().transpose(),
            observations: data.nrows(),
            in_place,
        })
    }

    /// Number of components in the Dirichlet being fit.
    pub fn dimension(&self) -> usize {
        self.sum_log_theta.len()
    }

    /// Number of observations the sufficient statistics summarize.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Dirichlet log-likelihood of the dataset at `alpha`, up to the
    /// alpha-independent normalizer.
    pub fn log_likelihood(&self, alpha: &DVector<f64>) -> f64 {
        let n = self.observations as f64;
        let mut value = ln_gamma(alpha.sum());
        for k in 0..alpha.len() {
            value -= ln_gamma(alpha[k]);
        }
        value *= n;
        for k in 0..alpha.len() {
            value += (alpha[k] - 1.0) * self.sum_log_theta[k];
        }
        value
    }

    fn check_state(&self, alpha: &DVector<f64>) -> Result<(), MathError> {
        if alpha.len() != self.dimension() {
            return Err(MathError::invalid_argument(format!(
                "alpha has {} components but the dataset has {}",
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

impl Optimizable<DVector<f64>> for DirichletMle {
    /// One Newton update on the concentration vector.
    ///
    /// The Hessian is `z·11ᵀ + diag(q)` with `z = N·ψ'(Σα)` and
    /// `q_k = −N·ψ'(α_k)`, so the step reduces to
    /// `α_k ← α_k − (g_k − b)/q_k` with the shared offset
    /// `b = (Σ g_j/q_j) / (1/z + Σ 1/q_j)`.
    fn compute_next(&mut self, alpha: DVector<f64>) -> OptimizerResult<ValueAndState<DVector<f64>>> {
        self.check_state(&alpha)?;
        let mut alpha = if self.in_place {
            alpha
        } else {
            alpha.clone_owned()
        };

        let n = self.observations as f64;
        let k = alpha.len();

        let alpha_sum = alpha.sum();
        let digamma_sum = digamma(alpha_sum);

        let mut g = DVector::zeros(k);
        let mut q = DVector::zeros(k);
        for j in 0..k {
            g[j] = n * (digamma_sum - digamma(alpha[j])) + self.sum_log_theta[j];
            q[j] = -n * trigamma(alpha[j]);
        }

        let z = n * trigamma(alpha_sum);
        let mut numerator = 0.0;
        let mut denominator = 1.0 / z;
        for j in 0..k {
            numerator += g[j] / q[j];
            denominator += 1.0 / q[j];
        }
        let b = numerator / denominator;

        for j in 0..k {
            alpha[j] -= (g[j] - b) / q[j];
        }

        let value = self.log_likelihood(&alpha);
        Ok(ValueAndState::new(value, alpha))
    }
}
