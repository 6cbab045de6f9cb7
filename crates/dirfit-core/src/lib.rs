//! Core numerical machinery for fitting Dirichlet-family models.
//!
//! This crate provides the iteration-independent pieces that the model
//! fitters in `dirfit-models` are assembled from: stable log-space
//! arithmetic, special functions, convergence policies, a generic
//! fixed-point iteration driver, Newton-Raphson solvers, and a bounded
//! grid search with a best-evaluated-point fallback.
//!
//! # Key Concepts
//!
//! - **Log-space arithmetic**: sums and differences of probabilities
//!   represented by their logarithms, without leaving log space
//! - **Convergence policies**: composable predicates over the iteration
//!   index and successive objective values
//! - **Optimizables**: single-update-rule objects driven to a fixed
//!   point by a generic iteration loop
//! - **Newton solvers**: multivariate (LU solve) and univariate
//!   second-order updates with an evaluation budget
//!
//! # Modules
//!
//! - [`convergence`]: Convergence checkers and boolean combinators
//! - [`error`]: Error types for math and optimizer failures
//! - [`grid`]: Exhaustive grid search and the Newton fallback wrapper
//! - [`logmath`]: Sloppy log-space arithmetic and log-gamma ratios
//! - [`newton`]: Newton-Raphson solvers and objective traits
//! - [`observer`]: Progress-reporting hooks for optimization runs
//! - [`optimizer`]: The generic fixed-point iteration driver
//! - [`special`]: Log-gamma, digamma, and trigamma

pub mod convergence;
pub mod error;
pub mod grid;
pub mod logmath;
pub mod newton;
pub mod observer;
pub mod optimizer;
pub mod special;

// Re-export commonly used items at the crate root
pub use error::{MathError, MathResult, OptimizerError, OptimizerResult};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use dirfit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::convergence::{
        and, not, or, ConvergenceChecker, MaxIterations, RelativePercentChange,
    };
    pub use crate::error::{MathError, MathResult, OptimizerError, OptimizerResult};
    pub use crate::grid::{optimize_with_fallback, Goal, GridSearch, TrackedObjective};
    pub use crate::logmath::LogMath;
    pub use crate::newton::{
        DifferentiableObjective, FnObjective, FnScalarObjective, NewtonRaphson, NewtonStep,
        ScalarObjective, UnivariateNewtonRaphson, UnivariateNewtonStep,
    };
    pub use crate::observer::{IterationObserver, NoOpObserver, PrintObserver};
    pub use crate::optimizer::{
        CancellationToken, IterativeOptimizer, Optimizable, ReturnPolicy, ValueAndState,
    };
    pub use crate::special::{digamma, ln_gamma, trigamma};
}
