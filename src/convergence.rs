//! Convergence assessment for the minimization loop.
//!
//! The driver asks an injected [`Convergence`] predicate after every
//! accepted step; the default compares the step, the relative change of the
//! objective value and the gradient against the configured [`Tolerances`].

use num_traits::Float;

/// Convergence tolerances, part of the driver configuration.
#[derive(Debug, Clone, Copy)]
pub struct Tolerances<S> {
    /// Tolerance on the infinity norm of the step `x - x_prev`.
    pub x_tol: S,
    /// Tolerance on the relative change of the objective value.
    pub f_tol: S,
    /// Tolerance on the infinity norm of the gradient.
    pub g_tol: S,
}

/// Independent convergence flags plus their combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvergenceFlags {
    pub x_converged: bool,
    pub f_converged: bool,
    pub g_converged: bool,
    /// Combination used by the driver to stop iterating.
    pub converged: bool,
}

/// Predicate deciding whether the iteration has converged.
pub trait Convergence<S: Float> {
    fn assess(
        &self,
        x: &[S],
        x_prev: &[S],
        gr: &[S],
        f_x: S,
        f_x_prev: S,
        tol: &Tolerances<S>,
    ) -> ConvergenceFlags;
}

/// The default predicate: step, relative value change and gradient checks
/// combined with a logical OR.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConvergence;

impl<S: Float> Convergence<S> for DefaultConvergence {
    fn assess(
        &self,
        x: &[S],
        x_prev: &[S],
        gr: &[S],
        f_x: S,
        f_x_prev: S,
        tol: &Tolerances<S>,
    ) -> ConvergenceFlags {
        let x_converged = crate::lin::dist_inf(x, x_prev) < tol.x_tol;
        let f_converged = (f_x - f_x_prev).abs() / (f_x.abs() + tol.f_tol) < tol.f_tol;
        let g_converged = crate::lin::norm_inf(gr) < tol.g_tol;
        ConvergenceFlags {
            x_converged,
            f_converged,
            g_converged,
            converged: x_converged || f_converged || g_converged,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tol() -> Tolerances<f64> {
        Tolerances {
            x_tol: 1e-8,
            f_tol: 1e-8,
            g_tol: 1e-8,
        }
    }

    #[test]
    fn flags_are_independent() {
        // only the gradient is small
        let flags = DefaultConvergence.assess(
            &[1., 2.],
            &[0., 2.],
            &[1e-12, 0.],
            10.,
            20.,
            &tol(),
        );
        assert!(!flags.x_converged);
        assert!(!flags.f_converged);
        assert!(flags.g_converged);
        assert!(flags.converged);

        // only the step is small
        let flags = DefaultConvergence.assess(
            &[1., 2.],
            &[1., 2. + 1e-12],
            &[5., 0.],
            10.,
            20.,
            &tol(),
        );
        assert!(flags.x_converged);
        assert!(!flags.f_converged);
        assert!(!flags.g_converged);
        assert!(flags.converged);

        // only the value change is small
        let flags = DefaultConvergence.assess(
            &[1., 2.],
            &[0., 2.],
            &[5., 0.],
            10.,
            10. + 1e-12,
            &tol(),
        );
        assert!(!flags.x_converged);
        assert!(flags.f_converged);
        assert!(!flags.g_converged);
        assert!(flags.converged);
    }

    #[test]
    fn nothing_converged() {
        let flags = DefaultConvergence.assess(&[1.], &[0.], &[5.], 10., 20., &tol());
        assert_eq!(flags, ConvergenceFlags::default());
    }

    #[test]
    fn non_finite_previous_value_does_not_converge() {
        // the driver seeds f_x_prev with infinity before the first step
        let flags =
            DefaultConvergence.assess(&[1.], &[0.], &[5.], 10., f64::INFINITY, &tol());
        assert!(!flags.f_converged);
    }
}
