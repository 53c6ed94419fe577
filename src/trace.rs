//! Optional per-iteration records of solver progress.

use num_traits::Float;

/// What, if anything, to record each iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceFlags {
    /// Keep the records in the returned [`Solution`](crate::Solution).
    pub store: bool,
    /// Emit one `log::debug!` line per iteration.
    pub show: bool,
    /// Also snapshot the iterate, gradient and search direction. Each
    /// snapshot allocates three vectors.
    pub extended: bool,
}

/// Information about one performed iteration of the minimization loop.
#[derive(Debug, Clone)]
pub struct IterationRecord<S: Float> {
    /// Iteration number (indexed from 0).
    pub k: usize,
    /// Objective value at the end of the iteration.
    pub value: S,
    /// Infinity norm of the gradient at the end of the iteration.
    pub grad_norm: S,
    /// Accepted step size.
    pub alpha: S,
    /// `beta` coefficient used to build the next search direction.
    pub beta: S,
    /// Cumulative objective evaluations so far.
    pub f_calls: usize,
    /// Cumulative gradient evaluations so far.
    pub g_calls: usize,
    /// Snapshots, present when [`TraceFlags::extended`] is set.
    pub extended: Option<ExtendedRecord<S>>,
}

/// Full state snapshot attached to an [`IterationRecord`].
#[derive(Debug, Clone)]
pub struct ExtendedRecord<S: Float> {
    pub x: Vec<S>,
    pub gradient: Vec<S>,
    pub direction: Vec<S>,
}
