//! Error types for the optimization core.
//!
//! This module defines the error taxonomy used throughout the crate:
//! scalar-math precondition failures and optimizer-level numerical
//! failures are kept as separate enums so that callers can match on
//! exactly the class of failure they are prepared to handle.

use thiserror::Error;

/// Errors raised by scalar math routines and convergence checking.
#[derive(Debug, Clone, Error)]
pub enum MathError {
    /// A precondition on an argument was violated.
    ///
    /// Examples: a negative rising-factorial base or exponent, a
    /// non-positive iteration limit, a NaN fed to a convergence check.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the violated precondition
        reason: String,
    },

    /// A mathematically undefined operation was requested.
    ///
    /// Example: `log_subtract_sloppy(x, y)` with `y > x`, whose result
    /// would be the logarithm of a negative number.
    #[error("Domain error: {reason}")]
    DomainError {
        /// Description of why the operation is undefined
        reason: String,
    },
}

impl MathError {
    /// Create an InvalidArgument error with a custom reason.
    pub fn invalid_argument<S: Into<String>>(reason: S) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a DomainError with a custom reason.
    pub fn domain_error<S: Into<String>>(reason: S) -> Self {
        Self::DomainError {
            reason: reason.into(),
        }
    }
}

/// Errors raised while driving an optimization run.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs at construction time, before any iteration has
    /// run (e.g., a zero evaluation budget or an empty candidate grid).
    #[error("Invalid optimizer configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The Hessian was singular at the current iterate.
    ///
    /// This is terminal: there is no recovery transition, and the error
    /// always propagates to the direct caller, which decides whether a
    /// fallback strategy is appropriate.
    #[error("Singular Hessian: the {dimension}x{dimension} system has no LU solution")]
    SingularHessian {
        /// Dimension of the Newton system that failed to solve
        dimension: usize,
    },

    /// Numerical failure inside an update step.
    ///
    /// Example: a Newton update leaving the feasible domain, or a
    /// non-finite objective value where a finite one is required.
    #[error("Numerical failure: {reason}")]
    NumericalFailure {
        /// Description of the numerical issue
        reason: String,
    },

    /// Propagated scalar-math error.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a SingularHessian error for an n-dimensional system.
    pub fn singular_hessian(dimension: usize) -> Self {
        Self::SingularHessian { dimension }
    }

    /// Create a NumericalFailure with a custom reason.
    pub fn numerical_failure<S: Into<String>>(reason: S) -> Self {
        Self::NumericalFailure {
            reason: reason.into(),
        }
    }
}

/// Result type alias for scalar math operations.
pub type MathResult<T> = std::result::Result<T, MathError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;
