//! Newton-Raphson solvers, multivariate and univariate.
//!
//! The multivariate update is `x' = x − H(x)⁻¹·∇f(x)`, computed as an LU
//! solve of the linear system `H·δ = g` rather than an explicit matrix
//! inverse. The univariate variant is the scalar specialization
//! `x' = x − f'(x)/f''(x)`.
//!
//! A singular Hessian is a terminal error: the solver does not recover
//! from it, and the error propagates so the direct caller can decide
//! whether a fallback (see [`crate::grid`]) is appropriate.

use crate::convergence::ConvergenceChecker;
use crate::error::{MathError, OptimizerError, OptimizerResult};
use crate::optimizer::{Optimizable, ValueAndState};
use nalgebra::{DMatrix, DVector};

/// A twice-differentiable multivariate objective.
///
/// The optimization core treats this as an opaque capability: it knows
/// nothing about the dataset the implementation closes over, and that
/// data must not change for the duration of a run.
pub trait DifferentiableObjective {
    /// Objective value at `x`.
    fn value(&self, x: &DVector<f64>) -> f64;
    /// Gradient ∇f(x).
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64>;
    /// Hessian (Jacobian of the gradient) at `x`.
    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64>;
}

impl<F: DifferentiableObjective + ?Sized> DifferentiableObjective for &F {
    fn value(&self, x: &DVector<f64>) -> f64 {
        (**self).value(x)
    }
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        (**self).gradient(x)
    }
    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        (**self).hessian(x)
    }
}

/// A twice-differentiable scalar objective.
pub trait ScalarObjective {
    /// Objective value at `x`.
    fn value(&self, x: f64) -> f64;
    /// First derivative f'(x).
    fn first_derivative(&self, x: f64) -> f64;
    /// Second derivative f''(x).
    fn second_derivative(&self, x: f64) -> f64;
}

impl<F: ScalarObjective + ?Sized> ScalarObjective for &F {
    fn value(&self, x: f64) -> f64 {
        (**self).value(x)
    }
    fn first_derivative(&self, x: f64) -> f64 {
        (**self).first_derivative(x)
    }
    fn second_derivative(&self, x: f64) -> f64 {
        (**self).second_derivative(x)
    }
}

/// Builds a [`DifferentiableObjective`] out of three closures, so
/// model-fitting code can compose an objective around its sufficient
/// statistics without defining a type.
#[derive(Debug, Clone)]
pub struct FnObjective<V, G, H> {
    value: V,
    gradient: G,
    hessian: H,
}

impl<V, G, H> FnObjective<V, G, H>
where
    V: Fn(&DVector<f64>) -> f64,
    G: Fn(&DVector<f64>) -> DVector<f64>,
    H: Fn(&DVector<f64>) -> DMatrix<f64>,
{
    /// Bundles value, gradient, and Hessian closures.
    pub fn new(value: V, gradient: G, hessian: H) -> Self {
        Self {
            value,
            gradient,
            hessian,
        }
    }
}

impl<V, G, H> DifferentiableObjective for FnObjective<V, G, H>
where
    V: Fn(&DVector<f64>) -> f64,
    G: Fn(&DVector<f64>) -> DVector<f64>,
    H: Fn(&DVector<f64>) -> DMatrix<f64>,
{
    fn value(&self, x: &DVector<f64>) -> f64 {
        (self.value)(x)
    }
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        (self.gradient)(x)
    }
    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        (self.hessian)(x)
    }
}

/// The scalar analogue of [`FnObjective`].
#[derive(Debug, Clone)]
pub struct FnScalarObjective<V, D1, D2> {
    value: V,
    first: D1,
    second: D2,
}

impl<V, D1, D2> FnScalarObjective<V, D1, D2>
where
    V: Fn(f64) -> f64,
    D1: Fn(f64) -> f64,
    D2: Fn(f64) -> f64,
{
    /// Bundles value, first-derivative, and second-derivative closures.
    pub fn new(value: V, first: D1, second: D2) -> Self {
        Self {
            value,
            first,
            second,
        }
    }
}

impl<V, D1, D2> ScalarObjective for FnScalarObjective<V, D1, D2>
where
    V: Fn(f64) -> f64,
    D1: Fn(f64) -> f64,
    D2: Fn(f64) -> f64,
{
    fn value(&self, x: f64) -> f64 {
        (self.value)(x)
    }
    fn first_derivative(&self, x: f64) -> f64 {
        (self.first)(x)
    }
    fn second_derivative(&self, x: f64) -> f64 {
        (self.second)(x)
    }
}

/// One multivariate Newton update as an [`Optimizable`].
///
/// The update is applied to the incoming buffer in place, so the
/// returned state is the same allocation the caller passed in.
#[derive(Debug)]
pub struct NewtonStep<F> {
    objective: F,
}

impl<F: DifferentiableObjective> NewtonStep<F> {
    /// Wraps an objective.
    pub fn new(objective: F) -> Self {
        Self { objective }
    }
}

impl<F: DifferentiableObjective> Optimizable<DVector<f64>> for NewtonStep<F> {
    fn compute_next(&mut self, mut x: DVector<f64>) -> OptimizerResult<ValueAndState<DVector<f64>>> {
        let n = x.len();
        let g = self.objective.gradient(&x);
        let h = self.objective.hessian(&x);
        if g.len() != n || h.nrows() != n || h.ncols() != n {
            return Err(MathError::invalid_argument(format!(
                "objective dimensions ({}-gradient, {}x{}-Hessian) do not match the {n}-point",
                g.len(),
                h.nrows(),
                h.ncols()
            ))
            .into());
        }

        let delta = h
            .lu()
            .solve(&g)
            .ok_or(OptimizerError::SingularHessian { dimension: n })?;
        x -= &delta;

        let value = self.objective.value(&x);
        Ok(ValueAndState::new(value, x))
    }
}

/// One univariate Newton update as an [`Optimizable`].
#[derive(Debug)]
pub struct UnivariateNewtonStep<F> {
    objective: F,
}

impl<F: ScalarObjective> UnivariateNewtonStep<F> {
    /// Wraps a scalar objective.
    pub fn new(objective: F) -> Self {
        Self { objective }
    }
}

impl<F: ScalarObjective> Optimizable<f64> for UnivariateNewtonStep<F> {
    fn compute_next(&mut self, x: f64) -> OptimizerResult<ValueAndState<f64>> {
        let second = self.objective.second_derivative(x);
        if second == 0.0 {
            return Err(OptimizerError::SingularHessian { dimension: 1 });
        }

        let next = x - self.objective.first_derivative(x) / second;
        if !next.is_finite() {
            return Err(OptimizerError::numerical_failure(format!(
                "Newton update produced a non-finite point ({next})"
            )));
        }

        Ok(ValueAndState::new(self.objective.value(next), next))
    }
}

/// Multivariate Newton-Raphson solver with an internal iteration loop.
///
/// Runs [`NewtonStep`] updates until the caller-supplied checker reports
/// convergence over `(evaluations, previous value, next value)` or the
/// evaluation budget is exhausted, whichever comes first. Budget
/// exhaustion is not an error: the last iterate is returned and the
/// caller decides whether to accept it.
#[derive(Debug)]
pub struct NewtonRaphson<C> {
    checker: C,
    max_evaluations: u64,
    evaluations: u64,
}

impl<C: ConvergenceChecker> NewtonRaphson<C> {
    /// Creates a solver; the evaluation budget must be positive.
    pub fn new(checker: C, max_evaluations: u64) -> OptimizerResult<Self> {
        if max_evaluations == 0 {
            return Err(OptimizerError::invalid_configuration(
                "must be positive",
                "max_evaluations",
                "0",
            ));
        }
        Ok(Self {
            checker,
            max_evaluations,
            evaluations: 0,
        })
    }

    /// Evaluations performed by the most recent run.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// The evaluation budget.
    pub fn max_evaluations(&self) -> u64 {
        self.max_evaluations
    }

    /// Runs Newton iteration from `initial`.
    ///
    /// The point buffer is updated in place across iterations, so the
    /// returned state is the same allocation as `initial`. A singular
    /// Hessian at any step aborts the run with the error.
    pub fn optimize<F>(
        &mut self,
        objective: F,
        initial: DVector<f64>,
    ) -> OptimizerResult<ValueAndState<DVector<f64>>>
    where
        F: DifferentiableObjective,
    {
        let mut step = NewtonStep::new(objective);

        let mut next = step.compute_next(initial)?;
        self.evaluations = 1;

        while self.evaluations < self.max_evaluations {
            let previous_value = next.value;
            next = step.compute_next(next.state)?;
            self.evaluations += 1;

            if self
                .checker
                .is_converged(self.evaluations, previous_value, next.value)
                .map_err(OptimizerError::from)?
            {
                break;
            }
        }

        Ok(next)
    }
}

/// Univariate Newton-Raphson solver; the scalar analogue of
/// [`NewtonRaphson`].
#[derive(Debug)]
pub struct UnivariateNewtonRaphson<C> {
    checker: C,
    max_evaluations: u64,
    evaluations: u64,
}

impl<C: ConvergenceChecker> UnivariateNewtonRaphson<C> {
    /// Creates a solver; the evaluation budget must be positive.
    pub fn new(checker: C, max_evaluations: u64) -> OptimizerResult<Self> {
        if max_evaluations == 0 {
            return Err(OptimizerError::invalid_configuration(
                "must be positive",
                "max_evaluations",
                "0",
            ));
        }
        Ok(Self {
            checker,
            max_evaluations,
            evaluations: 0,
        })
    }

    /// Evaluations performed by the most recent run.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// The evaluation budget.
    pub fn max_evaluations(&self) -> u64 {
        self.max_evaluations
    }

    /// Runs scalar Newton iteration from `initial`.
    pub fn optimize<F>(&mut self, objective: F, initial: f64) -> OptimizerResult<ValueAndState<f64>>
    where
        F: ScalarObjective,
    {
        let mut step = UnivariateNewtonStep::new(objective);

        let mut next = step.compute_next(initial)?;
        self.evaluations = 1;

        while self.evaluations < self.max_evaluations {
            let previous_value = next.value;
            next = step.compute_next(next.state)?;
            self.evaluations += 1;

            if self
                .checker
                .is_converged(self.evaluations, previous_value, next.value)
                .map_err(OptimizerError::from)?
            {
                break;
            }
        }

        Ok(next)
    }
}
