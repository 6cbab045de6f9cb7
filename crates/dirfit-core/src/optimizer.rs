//! Generic fixed-point iteration driver.
//!
//! An [`Optimizable`] encapsulates one update rule: given the current
//! parameter state, produce the next state and its objective value. The
//! [`IterativeOptimizer`] drives an Optimizable until a
//! [`ConvergenceChecker`](crate::convergence::ConvergenceChecker)
//! signals termination, tracking which iterate to return according to a
//! [`ReturnPolicy`].

use crate::convergence::ConvergenceChecker;
use crate::error::OptimizerResult;
use crate::observer::{IterationObserver, NoOpObserver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An objective value paired with the parameter state that produced it.
///
/// Produced once per iteration. Whether `state` aliases the caller's
/// buffer or owns fresh memory is part of the producing Optimizable's
/// contract (its in-place/copy mode), not an implementation detail.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueAndState<S> {
    /// The objective value at `state`.
    pub value: f64,
    /// The parameter state.
    pub state: S,
}

impl<S> ValueAndState<S> {
    /// Creates a value/state pair.
    pub fn new(value: f64, state: S) -> Self {
        Self { value, state }
    }
}

/// Which observed iterate an optimization run ultimately returns.
///
/// Comparisons are strict, so the first iterate achieving the extremal
/// value wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReturnPolicy {
    /// The iterate with the greatest value seen so far.
    Highest,
    /// The iterate with the least value seen so far.
    Lowest,
    /// The final iterate, whatever its value.
    Last,
}

/// One step of an iterative optimization.
///
/// Each call performs exactly one update (one Newton step, one
/// fixed-point step, ...) and returns the resulting objective value and
/// state. Implementations own any data the update closes over (e.g.
/// sufficient statistics computed once from an observation matrix), and
/// that data must not change mid-run.
pub trait Optimizable<S> {
    /// Applies one update to `state`.
    fn compute_next(&mut self, state: S) -> OptimizerResult<ValueAndState<S>>;
}

impl<S, O: Optimizable<S> + ?Sized> Optimizable<S> for &mut O {
    fn compute_next(&mut self, state: S) -> OptimizerResult<ValueAndState<S>> {
        (**self).compute_next(state)
    }
}

/// Cooperative cancellation handle, checked once per iteration.
///
/// Cloning shares the underlying flag, so a caller can keep one handle
/// and give the other to the optimizer.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the optimizer returns its kept iterate at
    /// the next iteration boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Drives an [`Optimizable`] to convergence.
///
/// Iteration 0 establishes the baseline and is never checked for
/// convergence; the checker sees iterations 1, 2, ... together with the
/// previous and current objective values. At least one update step is
/// always performed before a result is returned.
#[derive(Debug)]
pub struct IterativeOptimizer<C, Obs = NoOpObserver> {
    checker: C,
    observer: Obs,
    cancellation: Option<CancellationToken>,
}

impl<C: ConvergenceChecker> IterativeOptimizer<C> {
    /// Creates an optimizer with the given convergence policy and a
    /// no-op observer.
    pub fn new(checker: C) -> Self {
        Self {
            checker,
            observer: NoOpObserver,
            cancellation: None,
        }
    }
}

impl<C: ConvergenceChecker, Obs: IterationObserver> IterativeOptimizer<C, Obs> {
    /// Replaces the observer.
    pub fn with_observer<O2: IterationObserver>(self, observer: O2) -> IterativeOptimizer<C, O2> {
        IterativeOptimizer {
            checker: self.checker,
            observer,
            cancellation: self.cancellation,
        }
    }

    /// Installs a cancellation token, checked once per iteration.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The installed observer.
    pub fn observer(&self) -> &Obs {
        &self.observer
    }

    /// Runs `optimizable` from `initial` until convergence.
    ///
    /// When `require_non_decreasing` is set, a decrease in the objective
    /// value is reported to the observer as a diagnostic but does not
    /// abort the run. An error from the Optimizable propagates
    /// immediately; there is no retry at this layer. Cancellation
    /// returns the iterate kept so far under `policy`.
    pub fn optimize<S, O>(
        &mut self,
        mut optimizable: O,
        policy: ReturnPolicy,
        require_non_decreasing: bool,
        initial: S,
    ) -> OptimizerResult<ValueAndState<S>>
    where
        S: Clone,
        O: Optimizable<S>,
    {
        let mut current = optimizable.compute_next(initial)?;
        let mut kept = current.clone();
        self.observer.on_iteration(0, current.value, kept.value);

        let mut iteration: u64 = 0;
        loop {
            iteration += 1;

            if let Some(token) = &self.cancellation {
                if token.is_cancelled() {
                    return Ok(Self::select(policy, kept, current));
                }
            }

            let previous_value = current.value;
            current = optimizable.compute_next(current.state)?;

            let keep_current = match policy {
                ReturnPolicy::Highest => current.value > kept.value,
                ReturnPolicy::Lowest => current.value < kept.value,
                ReturnPolicy::Last => false, // resolved on return
            };
            if keep_current {
                kept = current.clone();
            }

            let kept_value = match policy {
                ReturnPolicy::Last => current.value,
                _ => kept.value,
            };
            self.observer.on_iteration(iteration, current.value, kept_value);

            if require_non_decreasing && current.value < previous_value {
                self.observer
                    .on_value_decrease(iteration, previous_value, current.value);
            }

            if self
                .checker
                .is_converged(iteration, previous_value, current.value)
                .map_err(crate::error::OptimizerError::from)?
            {
                return Ok(Self::select(policy, kept, current));
            }
        }
    }

    fn select<S>(
        policy: ReturnPolicy,
        kept: ValueAndState<S>,
        current: ValueAndState<S>,
    ) -> ValueAndState<S> {
        match policy {
            ReturnPolicy::Last => current,
            _ => kept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::MaxIterations;
    use crate::error::OptimizerError;
    use crate::observer::testing::RecordingObserver;

    /// Replays a fixed sequence of objective values; the state records
    /// how many steps have been taken.
    #[derive(Debug)]
    struct Scripted {
        values: Vec<f64>,
        step: usize,
    }

    impl Scripted {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                step: 0,
            }
        }
    }

    impl Optimizable<usize> for Scripted {
        fn compute_next(&mut self, state: usize) -> OptimizerResult<ValueAndState<usize>> {
            let value = self.values[self.step];
            self.step += 1;
            Ok(ValueAndState::new(value, state + 1))
        }
    }

    #[test]
    fn test_return_policy_highest() {
        // Values 5, 3, 8, 2 across iterations 0-3; checker stops at 3
        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap());
        let result = opt
            .optimize(
                Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
                ReturnPolicy::Highest,
                false,
                0,
            )
            .unwrap();
        assert_eq!(result.value, 8.0);
        assert_eq!(result.state, 3); // produced on the third step
    }

    #[test]
    fn test_return_policy_lowest() {
        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap());
        let result = opt
            .optimize(
                Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
                ReturnPolicy::Lowest,
                false,
                0,
            )
            .unwrap();
        assert_eq!(result.value, 2.0);
    }

    #[test]
    fn test_return_policy_last() {
        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap());
        let result = opt
            .optimize(
                Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
                ReturnPolicy::Last,
                false,
                0,
            )
            .unwrap();
        assert_eq!(result.value, 2.0);
        assert_eq!(result.state, 4);
    }

    #[test]
    fn test_highest_tie_keeps_first() {
        let mut opt = IterativeOptimizer::new(MaxIterations::new(2).unwrap());
        let result = opt
            .optimize(
                Scripted::new(&[7.0, 7.0, 7.0]),
                ReturnPolicy::Highest,
                false,
                0,
            )
            .unwrap();
        // Strict comparison: the baseline iterate wins the tie
        assert_eq!(result.state, 1);
    }

    #[test]
    fn test_at_least_one_step_is_performed() {
        // Even a checker converged from the start sees iteration 1 first
        let mut opt = IterativeOptimizer::new(MaxIterations::new(1).unwrap());
        let result = opt
            .optimize(Scripted::new(&[5.0, 3.0]), ReturnPolicy::Last, false, 0)
            .unwrap();
        assert_eq!(result.state, 2); // baseline + one checked step
    }

    #[test]
    fn test_observer_reports_each_iteration() {
        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap())
            .with_observer(RecordingObserver::default());
        opt.optimize(
            Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
            ReturnPolicy::Highest,
            false,
            0,
        )
        .unwrap();

        assert_eq!(
            opt.observer().iterations,
            vec![
                (0, 5.0, 5.0),
                (1, 3.0, 5.0),
                (2, 8.0, 8.0),
                (3, 2.0, 8.0),
            ]
        );
    }

    #[test]
    fn test_monotonicity_violation_warns_but_continues() {
        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap())
            .with_observer(RecordingObserver::default());
        let result = opt
            .optimize(
                Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
                ReturnPolicy::Last,
                true,
                0,
            )
            .unwrap();
        assert_eq!(result.value, 2.0); // ran to completion

        assert_eq!(opt.observer().decreases, vec![(1, 5.0, 3.0), (3, 8.0, 2.0)]);
    }

    #[test]
    fn test_optimizable_error_propagates() {
        #[derive(Debug)]
        struct Failing;

        impl Optimizable<usize> for Failing {
            fn compute_next(&mut self, _: usize) -> OptimizerResult<ValueAndState<usize>> {
                Err(OptimizerError::singular_hessian(2))
            }
        }

        let mut opt = IterativeOptimizer::new(MaxIterations::new(3).unwrap());
        let err = opt
            .optimize(Failing, ReturnPolicy::Last, false, 0)
            .unwrap_err();
        assert!(matches!(err, OptimizerError::SingularHessian { .. }));
    }

    #[test]
    fn test_cancellation_returns_kept_iterate() {
        let token = CancellationToken::new();
        token.cancel();

        // Cancelled before the first checked iteration: the baseline is kept
        let mut opt = IterativeOptimizer::new(MaxIterations::new(100).unwrap())
            .with_cancellation(token);
        let result = opt
            .optimize(
                Scripted::new(&[5.0, 3.0, 8.0, 2.0]),
                ReturnPolicy::Highest,
                false,
                0,
            )
            .unwrap();
        assert_eq!(result.value, 5.0);
        assert_eq!(result.state, 1);
    }
}
