//! Exhaustive grid search and a best-evaluated-point fallback.
//!
//! [`GridSearch`] evaluates an objective over the Cartesian product of
//! per-dimension candidate lists and keeps the extremal point. It is the
//! derivative-free counterpart to the Newton solvers, used when an
//! objective is cheap to evaluate but awkward to differentiate, or as a
//! coarse initializer for them.
//!
//! [`optimize_with_fallback`] wraps a fallible solver run so that a
//! terminal failure (a singular Hessian, an update leaving the domain)
//! degrades to the best point the objective was evaluated at, instead
//! of propagating.

use crate::error::{OptimizerError, OptimizerResult};
use crate::newton::DifferentiableObjective;
use crate::observer::IterationObserver;
use crate::optimizer::ValueAndState;
use nalgebra::{DMatrix, DVector};
use std::cell::RefCell;

/// Direction of an optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Goal {
    /// Seek the greatest objective value.
    Maximize,
    /// Seek the least objective value.
    Minimize,
}

impl Goal {
    /// True when `candidate` strictly beats `incumbent` under this goal.
    ///
    /// Strict comparison, so the first point achieving the extremal
    /// value wins ties.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Goal::Maximize => candidate > incumbent,
            Goal::Minimize => candidate < incumbent,
        }
    }
}

/// Exhaustive search over a Cartesian product of candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearch {
    axes: Vec<Vec<f64>>,
}

impl GridSearch {
    /// Creates a grid from per-dimension candidate lists.
    ///
    /// Every axis must offer at least one candidate, and there must be
    /// at least one axis.
    pub fn new(axes: Vec<Vec<f64>>) -> OptimizerResult<Self> {
        if axes.is_empty() {
            return Err(OptimizerError::invalid_configuration(
                "grid must have at least one axis",
                "axes",
                "[]",
            ));
        }
        for (dimension, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(OptimizerError::invalid_configuration(
                    "every axis must have at least one candidate",
                    "axes",
                    format!("empty axis at dimension {dimension}"),
                ));
            }
        }
        Ok(Self { axes })
    }

    /// A grid containing only `point`, so a search degenerates to a
    /// single evaluation of that point.
    pub fn singleton(point: &[f64]) -> Self {
        Self {
            axes: point.iter().map(|&v| vec![v]).collect(),
        }
    }

    /// The per-dimension candidate lists.
    pub fn axes(&self) -> &[Vec<f64>] {
        &self.axes
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.axes.iter().map(Vec::len).product()
    }

    /// True for a grid with no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates `objective` at every grid point and returns the
    /// extremal one under `goal`.
    ///
    /// Points are visited in odometer order with the last dimension
    /// varying fastest; ties keep the earlier point. An objective error
    /// aborts the search.
    pub fn search<F>(&self, goal: Goal, mut objective: F) -> OptimizerResult<ValueAndState<Vec<f64>>>
    where
        F: FnMut(&[f64]) -> OptimizerResult<f64>,
    {
        let mut indices = vec![0usize; self.axes.len()];
        let mut point: Vec<f64> = self.axes.iter().map(|axis| axis[0]).collect();
        let mut best = ValueAndState::new(objective(&point)?, point.clone());

        loop {
            // Advance the odometer; carry out of the first dimension
            // means every point has been visited.
            let mut dimension = self.axes.len();
            loop {
                if dimension == 0 {
                    return Ok(best);
                }
                dimension -= 1;
                indices[dimension] += 1;
                if indices[dimension] < self.axes[dimension].len() {
                    point[dimension] = self.axes[dimension][indices[dimension]];
                    break;
                }
                indices[dimension] = 0;
                point[dimension] = self.axes[dimension][0];
            }

            let value = objective(&point)?;
            if goal.improves(value, best.value) {
                best = ValueAndState::new(value, point.clone());
            }
        }
    }
}

/// Delegating objective that remembers the best point it has been asked
/// to evaluate.
///
/// Seeded with the starting point so that even a run that fails before
/// its first value evaluation has a fallback to offer. Interior
/// mutability keeps the tracking invisible to the solver, which only
/// sees a shared reference.
#[derive(Debug)]
pub struct TrackedObjective<F> {
    inner: F,
    goal: Goal,
    best: RefCell<ValueAndState<DVector<f64>>>,
}

impl<F: DifferentiableObjective> TrackedObjective<F> {
    fn new(inner: F, goal: Goal, start: DVector<f64>) -> Self {
        let value = inner.value(&start);
        Self {
            inner,
            goal,
            best: RefCell::new(ValueAndState::new(value, start)),
        }
    }

    fn into_best(self) -> ValueAndState<DVector<f64>> {
        self.best.into_inner()
    }
}

impl<F: DifferentiableObjective> DifferentiableObjective for TrackedObjective<F> {
    fn value(&self, x: &DVector<f64>) -> f64 {
        let value = self.inner.value(x);
        if value.is_finite() {
            let mut best = self.best.borrow_mut();
            if self.goal.improves(value, best.value) || !best.value.is_finite() {
                *best = ValueAndState::new(value, x.clone());
            }
        }
        value
    }

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        self.inner.gradient(x)
    }

    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        self.inner.hessian(x)
    }
}

/// Runs a fallible solve, falling back to the best evaluated point if
/// the solver fails.
///
/// `run` receives the tracked view of `objective` and the starting
/// point, and typically closes over a solver:
/// `|objective, start| solver.optimize(objective, start)`. On success
/// its result is returned untouched. On failure the error is reported
/// to `observer` and the best point the tracked objective was evaluated
/// at (including the starting point) is returned instead, so a caller
/// embedding this in an outer loop always gets a usable iterate.
pub fn optimize_with_fallback<F, R, Obs>(
    run: R,
    objective: F,
    goal: Goal,
    initial: DVector<f64>,
    observer: &mut Obs,
) -> ValueAndState<DVector<f64>>
where
    F: DifferentiableObjective,
    R: FnOnce(&TrackedObjective<F>, DVector<f64>) -> OptimizerResult<ValueAndState<DVector<f64>>>,
    Obs: IterationObserver,
{
    let tracked = TrackedObjective::new(objective, goal, initial.clone());
    match run(&tracked, initial) {
        Ok(result) => result,
        Err(error) => {
            observer.on_optimizer_failure(&error);
            tracked.into_best()
        }
    }
}
