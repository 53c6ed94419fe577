//! Initial and per-iteration trial step sizes for the line search.
//!
//! `alphainit` implements step I0 of the Hager-Zhang starting guess;
//! `alphatry` implements steps I1-I2: a quadratic-interpolation guess from
//! the previous accepted step, with a hint that lets the line search accept
//! the trial step without further bracketing.

use num_traits::Float;

use crate::lin;

/// Outcome of [`alphatry`].
#[derive(Debug, Clone, Copy)]
pub struct AlphaTry<S> {
    /// Trial step to hand to the line search; finite and positive.
    pub alpha: S,
    /// True when the quadratic fit was trusted, so the line search may
    /// accept the trial step as soon as it satisfies the Wolfe conditions.
    pub mayterminate: bool,
    /// Objective evaluations spent probing.
    pub f_calls: usize,
    /// Gradient evaluations spent probing.
    pub g_calls: usize,
}

/// Initial step guess at the starting point.
///
/// Scales `psi0` by the relative size of the iterate and its gradient;
/// falls back to the value-based guess when the iterate is at the origin
/// and to `1` when neither carries information.
pub fn alphainit<S: Float>(x: &[S], gr: &[S], f_x: S, psi0: S) -> S {
    let xnorm = lin::norm_inf(x);
    let gnorm = lin::norm_inf(gr);
    if xnorm > S::zero() && gnorm > S::zero() {
        psi0 * xnorm / gnorm
    } else if f_x != S::zero() && gnorm > S::zero() {
        psi0 * f_x.abs() / lin::dot(gr, gr)
    } else {
        S::one()
    }
}

/// Adjusts the previous accepted step into this iteration's trial step.
///
/// Probes `phi` at `psi1 * alpha_prev` (backing off by `psi3` while the
/// probed value is non-finite) and fits the quadratic through
/// `(0, f_x)` with slope `dphi0` and the probe. A strongly convex fit
/// whose probe did not increase the objective yields the fit's minimizer
/// and `mayterminate = true`; otherwise the step is grown to
/// `psi2 * alpha_prev` and the line search must verify from scratch.
///
/// `dphi0` must be negative (the caller has already restored a descent
/// direction) and `alpha_prev` positive.
pub fn alphatry<S, Phi>(
    alpha_prev: S,
    f_x: S,
    dphi0: S,
    mut phi: Phi,
    psi1: S,
    psi2: S,
    psi3: S,
) -> AlphaTry<S>
where
    S: Float,
    Phi: FnMut(S) -> S,
{
    let two = S::one() + S::one();
    let iterfinitemax = (-S::epsilon().log2()).ceil().to_usize().unwrap_or(64);

    let mut f_calls = 0;
    let mut g_calls = 0;

    let mut alphatest = psi1 * alpha_prev;
    let mut obj_test = phi(alphatest);
    f_calls += 1;
    g_calls += 1;

    // back off until the probe lands in the finite region of the objective
    let mut iterfinite = 0;
    while !obj_test.is_finite() && iterfinite < iterfinitemax {
        alphatest = psi3 * alphatest;
        obj_test = phi(alphatest);
        f_calls += 1;
        g_calls += 1;
        iterfinite += 1;
    }

    // quadratic through (0, f_x) with slope dphi0 and (alphatest, obj_test)
    let a = (obj_test - f_x - dphi0 * alphatest) / (alphatest * alphatest);
    if a.is_finite() && a > S::zero() && obj_test <= f_x {
        AlphaTry {
            alpha: -dphi0 / (two * a),
            mayterminate: true,
            f_calls,
            g_calls,
        }
    } else {
        AlphaTry {
            alpha: psi2 * alpha_prev,
            mayterminate: false,
            f_calls,
            g_calls,
        }
    }
}
