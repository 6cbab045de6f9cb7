//! Observer hooks for optimization progress.
//!
//! The optimizers report progress through an injected observer instead
//! of a process-global logger, so the core carries no global mutable
//! state. The default observer discards everything; [`PrintObserver`]
//! writes progress to stdout.

use crate::error::OptimizerError;

/// Receives progress reports from an optimization run.
///
/// All hooks are side-effect-only: nothing an observer does can change
/// the optimizer's control flow.
pub trait IterationObserver {
    /// Called once per iteration with the new objective value and the
    /// value of the iterate currently kept for return.
    fn on_iteration(&mut self, iteration: u64, value: f64, kept_value: f64) {
        let _ = (iteration, value, kept_value);
    }

    /// Called when a run that expects non-decreasing values observes a
    /// decrease. Reported as a diagnostic; the run continues.
    fn on_value_decrease(&mut self, iteration: u64, previous: f64, current: f64) {
        let _ = (iteration, previous, current);
    }

    /// Called by the fallback wrapper when the wrapped optimizer fails
    /// and the best evaluated point is substituted for its result.
    fn on_optimizer_failure(&mut self, error: &OptimizerError) {
        let _ = error;
    }
}

/// An observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl IterationObserver for NoOpObserver {
    // Use default implementations
}

/// An observer that prints progress to stdout.
#[derive(Debug, Clone)]
pub struct PrintObserver {
    print_every: u64,
}

impl PrintObserver {
    /// Creates an observer that prints every `print_every` iterations.
    pub fn new(print_every: u64) -> Self {
        Self {
            print_every: print_every.max(1),
        }
    }
}

impl Default for PrintObserver {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IterationObserver for PrintObserver {
    fn on_iteration(&mut self, iteration: u64, value: f64, kept_value: f64) {
        if iteration % self.print_every == 0 {
            println!("Iteration {iteration}, value = {value}, keeping = {kept_value}");
        }
    }

    fn on_value_decrease(&mut self, iteration: u64, previous: f64, current: f64) {
        println!("Warning: on iteration {iteration}, the value decreased from {previous} to {current}");
    }

    fn on_optimizer_failure(&mut self, error: &OptimizerError) {
        println!("Optimizer failed ({error}); accepting the best evaluated point so far");
    }
}
