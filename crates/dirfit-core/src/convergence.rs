//! Convergence policies and their boolean combinators.
//!
//! A [`ConvergenceChecker`] is a pure predicate over the iteration index
//! and the previous/current objective values. Policies are small
//! stateless values, so they can be shared and composed freely; the
//! [`and`], [`or`], and [`not`] combinators build compound termination
//! conditions out of the primitives.

use crate::error::{MathError, MathResult};
use std::fmt::Debug;

/// Predicate deciding whether an iterative optimization has converged.
///
/// Implementations must be referentially transparent: calling
/// `is_converged` twice with the same inputs yields the same answer and
/// has no side effects.
pub trait ConvergenceChecker: Debug {
    /// Returns true when the run should terminate.
    ///
    /// `iteration` is the index of the update step that produced
    /// `current` from `previous`; the baseline step is iteration 0 and
    /// is never checked.
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool>;
}

impl<C: ConvergenceChecker + ?Sized> ConvergenceChecker for &C {
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        (**self).is_converged(iteration, previous, current)
    }
}

impl<C: ConvergenceChecker + ?Sized> ConvergenceChecker for Box<C> {
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        (**self).is_converged(iteration, previous, current)
    }
}

/// Converged once the iteration index reaches a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxIterations {
    limit: u64,
}

impl MaxIterations {
    /// Creates the policy; fails for a zero limit.
    pub fn new(limit: u64) -> MathResult<Self> {
        if limit == 0 {
            return Err(MathError::invalid_argument(
                "maxIterations (0) must be greater than 0",
            ));
        }
        Ok(Self { limit })
    }

    /// The iteration limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl ConvergenceChecker for MaxIterations {
    fn is_converged(&self, iteration: u64, _previous: f64, _current: f64) -> MathResult<bool> {
        Ok(iteration >= self.limit)
    }
}

/// Converged when the relative percent change between successive values
/// falls below a tolerance: `2·|prev − cur| / |prev + cur| < tol`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePercentChange {
    tolerance: f64,
}

impl RelativePercentChange {
    /// Creates the policy; the tolerance must be finite and strictly positive.
    pub fn new(tolerance: f64) -> MathResult<Self> {
        if !(tolerance > 0.0) || !tolerance.is_finite() {
            return Err(MathError::invalid_argument(format!(
                "tolerance ({tolerance}) must be strictly greater than 0.0"
            )));
        }
        Ok(Self { tolerance })
    }

    /// The convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn relative_percent_change(previous: f64, current: f64) -> MathResult<f64> {
        if previous.is_infinite() && current.is_infinite() {
            return Err(MathError::invalid_argument(
                "previous and current values are both infinite",
            ));
        }
        if previous.is_nan() {
            return Err(MathError::invalid_argument(
                "previous value is not a number",
            ));
        }
        if current.is_nan() {
            return Err(MathError::invalid_argument("current value is not a number"));
        }
        if previous.is_infinite() || current.is_infinite() {
            return Ok(f64::INFINITY);
        }
        Ok(2.0 * ((previous - current) / (previous + current)).abs())
    }
}

impl ConvergenceChecker for RelativePercentChange {
    fn is_converged(&self, _iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        Ok(Self::relative_percent_change(previous, current)? < self.tolerance)
    }
}

/// Conjunction of two checkers.
#[derive(Debug, Clone, Copy)]
pub struct And<A, B> {
    a: A,
    b: B,
}

impl<A: ConvergenceChecker, B: ConvergenceChecker> ConvergenceChecker for And<A, B> {
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        Ok(self.a.is_converged(iteration, previous, current)?
            && self.b.is_converged(iteration, previous, current)?)
    }
}

/// Disjunction of two checkers.
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B> {
    a: A,
    b: B,
}

impl<A: ConvergenceChecker, B: ConvergenceChecker> ConvergenceChecker for Or<A, B> {
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        Ok(self.a.is_converged(iteration, previous, current)?
            || self.b.is_converged(iteration, previous, current)?)
    }
}

/// Negation of a checker.
#[derive(Debug, Clone, Copy)]
pub struct Not<C> {
    inner: C,
}

impl<C: ConvergenceChecker> ConvergenceChecker for Not<C> {
    fn is_converged(&self, iteration: u64, previous: f64, current: f64) -> MathResult<bool> {
        Ok(!self.inner.is_converged(iteration, previous, current)?)
    }
}

/// Converged when both `a` and `b` are converged.
pub fn and<A: ConvergenceChecker, B: ConvergenceChecker>(a: A, b: B) -> And<A, B> {
    And { a, b }
}

/// Converged when either `a` or `b` is converged.
pub fn or<A: ConvergenceChecker, B: ConvergenceChecker>(a: A, b: B) -> Or<A, B> {
    Or { a, b }
}

/// Converged when `checker` is not.
pub fn not<C: ConvergenceChecker>(checker: C) -> Not<C> {
    Not { inner: checker }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A checker with a fixed answer, for combinator tests.
    #[derive(Debug, Clone, Copy)]
    struct Always(bool);

    impl ConvergenceChecker for Always {
        fn is_converged(&self, _: u64, _: f64, _: f64) -> MathResult<bool> {
            Ok(self.0)
        }
    }

    // Representative (iteration, previous, current) triples
    const TRIPLES: [(u64, f64, f64); 3] = [(1, 10.0, 9.0), (5, -2.5, -2.5), (100, 0.0, 1e6)];

    #[test]
    fn test_max_iterations() {
        let checker = MaxIterations::new(3).unwrap();
        assert!(!checker.is_converged(1, 0.0, 0.0).unwrap());
        assert!(!checker.is_converged(2, 0.0, 0.0).unwrap());
        assert!(checker.is_converged(3, 0.0, 0.0).unwrap());
        assert!(checker.is_converged(4, 0.0, 0.0).unwrap());
    }

    #[test]
    fn test_max_iterations_rejects_zero() {
        assert!(matches!(
            MaxIterations::new(0).unwrap_err(),
            MathError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_relative_percent_change() {
        let checker = RelativePercentChange::new(0.01).unwrap();

        // 2|10 - 9.99| / |10 + 9.99| = 0.02/19.99 ~ 0.001 < 0.01
        assert!(checker.is_converged(1, 10.0, 9.99).unwrap());
        // 2|10 - 9| / 19 ~ 0.105 >= 0.01
        assert!(!checker.is_converged(1, 10.0, 9.0).unwrap());
        // Exact equality converges at any positive tolerance
        assert!(checker.is_converged(1, 5.0, 5.0).unwrap());
    }

    #[test]
    fn test_relative_percent_change_rejects_bad_tolerance() {
        assert!(RelativePercentChange::new(0.0).is_err());
        assert!(RelativePercentChange::new(-1.0).is_err());
        assert!(RelativePercentChange::new(f64::NAN).is_err());
    }

    #[test]
    fn test_relative_percent_change_nan_inputs() {
        let checker = RelativePercentChange::new(0.01).unwrap();
        assert!(checker.is_converged(1, f64::NAN, 1.0).is_err());
        assert!(checker.is_converged(1, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_relative_percent_change_infinite_inputs() {
        let checker = RelativePercentChange::new(0.01).unwrap();

        // Both infinite: undefined
        assert!(checker
            .is_converged(1, f64::NEG_INFINITY, f64::INFINITY)
            .is_err());
        // Exactly one infinite: infinite change, never converged
        assert!(!checker.is_converged(1, f64::NEG_INFINITY, 1.0).unwrap());
        assert!(!checker.is_converged(1, 1.0, f64::INFINITY).unwrap());
    }

    #[test]
    fn test_and_truth_table() {
        for &(it, prev, cur) in &TRIPLES {
            for &(p, q) in &[(false, false), (false, true), (true, false), (true, true)] {
                let got = and(Always(p), Always(q)).is_converged(it, prev, cur).unwrap();
                assert_eq!(got, p && q);
            }
        }
    }

    #[test]
    fn test_or_truth_table() {
        for &(it, prev, cur) in &TRIPLES {
            for &(p, q) in &[(false, false), (false, true), (true, false), (true, true)] {
                let got = or(Always(p), Always(q)).is_converged(it, prev, cur).unwrap();
                assert_eq!(got, p || q);
            }
        }
    }

    #[test]
    fn test_not_delegates_to_inner() {
        for &(it, prev, cur) in &TRIPLES {
            assert!(not(Always(false)).is_converged(it, prev, cur).unwrap());
            assert!(!not(Always(true)).is_converged(it, prev, cur).unwrap());
        }
    }

    #[test]
    fn test_de_morgan() {
        for &(it, prev, cur) in &TRIPLES {
            for &(p, q) in &[(false, false), (false, true), (true, false), (true, true)] {
                // !(p && q) == !p || !q
                let lhs = not(and(Always(p), Always(q)))
                    .is_converged(it, prev, cur)
                    .unwrap();
                let rhs = or(not(Always(p)), not(Always(q)))
                    .is_converged(it, prev, cur)
                    .unwrap();
                assert_eq!(lhs, rhs);
            }
        }
    }

    #[test]
    fn test_composed_policies() {
        // Converge on small relative change, but always stop by iteration 10
        let checker = or(
            RelativePercentChange::new(1e-6).unwrap(),
            MaxIterations::new(10).unwrap(),
        );
        assert!(!checker.is_converged(1, 10.0, 5.0).unwrap());
        assert!(checker.is_converged(1, 10.0, 10.0 + 1e-9).unwrap());
        assert!(checker.is_converged(10, 10.0, 5.0).unwrap());
    }
}
