//! Preconditioned nonlinear conjugate gradient minimization.
//!
//! The driver follows the `CG_DESCENT` family of _Hager & Zhang_, using
//! the HZ2012 hybrid beta formula for the direction update and an
//! injected Wolfe-condition line search for the step length. All iterate
//! state lives in preallocated buffers owned by one `minimize` call and
//! reused in place across iterations.

use std::fmt;

use log::debug;
use num_traits::Float;
use thiserror::Error;

use crate::alpha::{alphainit, alphatry};
use crate::convergence::{Convergence, ConvergenceFlags, DefaultConvergence, Tolerances};
use crate::lin;
use crate::precond::Preconditioner;
use crate::secant2::{LineSearch, LineSearchCache, LineSearchError, Secant2};
use crate::trace::{ExtendedRecord, IterationRecord, TraceFlags};

const ALGORITHM: &str = "preconditioned nonlinear conjugate gradient (Hager-Zhang)";

/// Configuration of the preconditioned nonlinear CG method.
///
/// Generic over the scalar type, the line search `L` and the convergence
/// predicate `C`; both collaborators are plain fields and can be swapped
/// for custom implementations (or stubs in tests).
#[derive(Debug, Clone)]
pub struct NonlinearCG<S: Float, L = Secant2<S>, C = DefaultConvergence> {
    /// Line minimization method.
    pub line_method: L,
    /// Convergence predicate.
    pub convergence: C,
    /// Lower-bound safeguard for the hybrid beta; keeps the direction
    /// update from collapsing. `0.4` per HZ2012.
    pub eta: S,
    /// Scale of the initial step guess.
    pub psi0: S,
    /// Fraction of the previous step probed by the quadratic trial-step
    /// interpolation.
    pub psi1: S,
    /// Growth factor for the trial step when the interpolation is not
    /// trusted.
    pub psi2: S,
    /// Backoff factor while the trial-step probe is non-finite.
    pub psi3: S,
    /// Fixed initial step; when `None` it is derived from the starting
    /// point.
    pub alpha0: Option<S>,
    /// Convergence tolerances.
    pub tol: Tolerances<S>,
    /// Maximum number of iterations to take.
    pub max_iter: usize,
    /// What to record each iteration.
    pub trace: TraceFlags,
}

impl NonlinearCG<f32> {
    /// Defaults for `f32`: values mostly based on [HZ'06] and [HZ'12].
    pub fn new() -> Self {
        NonlinearCG {
            line_method: Secant2::<f32>::new(),
            convergence: DefaultConvergence,
            eta: 0.4,
            psi0: 0.01,
            psi1: 0.2,
            psi2: 2.0,
            psi3: 0.1,
            alpha0: None,
            tol: Tolerances {
                x_tol: 1e-16,
                f_tol: 1e-5,
                g_tol: 1e-5,
            },
            max_iter: 1000,
            trace: TraceFlags::default(),
        }
    }
}

impl NonlinearCG<f64> {
    /// Defaults for `f64`: values mostly based on [HZ'06] and [HZ'12].
    pub fn new() -> Self {
        NonlinearCG {
            line_method: Secant2::<f64>::new(),
            convergence: DefaultConvergence,
            eta: 0.4,
            psi0: 0.01,
            psi1: 0.2,
            psi2: 2.0,
            psi3: 0.1,
            alpha0: None,
            tol: Tolerances {
                x_tol: 1e-32,
                f_tol: 1e-8,
                g_tol: 1e-8,
            },
            max_iter: 1000,
            trace: TraceFlags::default(),
        }
    }
}

impl Default for NonlinearCG<f32> {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for NonlinearCG<f64> {
    fn default() -> Self {
        Self::new()
    }
}

/// How the minimization loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The convergence predicate reported combined convergence.
    Converged,
    /// The iteration budget was exhausted. Not an error.
    IterationLimit,
    /// Even steepest descent was not a descent direction: the gradient is
    /// numerically zero. Treated as a degenerate, converged-like exit.
    DegenerateDirection,
}

/// Fatal failures of the minimization loop.
///
/// Recoverable breakdowns (a non-descent direction) are handled inside the
/// loop; only contract violations surface here. Mid-run variants carry the
/// evaluation counts and trace accumulated up to the failure.
#[derive(Debug, Error)]
pub enum NonlinearCGError<S: Float + fmt::Debug> {
    /// Objective or gradient non-finite at the initial point; no iteration
    /// was performed.
    #[error("objective or gradient is not finite at the initial point")]
    NonFiniteStart,
    /// Objective value became non-finite after a step.
    #[error("objective value became non-finite at iteration {iteration}")]
    NonFiniteObjective {
        iteration: usize,
        f_calls: usize,
        g_calls: usize,
        trace: Vec<IterationRecord<S>>,
    },
    /// The line search failed to produce an acceptable step.
    #[error("line search failed at iteration {iteration}")]
    LineSearch {
        iteration: usize,
        #[source]
        source: LineSearchError,
        f_calls: usize,
        g_calls: usize,
        trace: Vec<IterationRecord<S>>,
    },
}

/// Terminal state of a minimization run.
#[derive(Debug, Clone)]
pub struct Solution<S: Float> {
    /// Human-readable algorithm name.
    pub algorithm: &'static str,
    /// Starting point of the run.
    pub initial_x: Vec<S>,
    /// Final iterate.
    pub x: Vec<S>,
    /// Objective value at the final iterate.
    pub f_x: S,
    /// Number of completed iterations.
    pub iterations: usize,
    /// How the loop ended.
    pub termination: Termination,
    /// Convergence flags from the last assessment.
    pub flags: ConvergenceFlags,
    /// Tolerances the flags were assessed against.
    pub tol: Tolerances<S>,
    /// Stored per-iteration records (empty unless `trace.store` was set).
    pub trace: Vec<IterationRecord<S>>,
    /// Cumulative objective evaluations.
    pub f_calls: usize,
    /// Cumulative gradient evaluations.
    pub g_calls: usize,
}

impl<S: Float> Solution<S> {
    /// True when the run stopped because the iteration budget was
    /// exhausted without convergence.
    pub fn iteration_limit_reached(&self) -> bool {
        self.termination == Termination::IterationLimit
    }
}

impl<S, L, C> NonlinearCG<S, L, C>
where
    S: Float + fmt::Debug,
    L: LineSearch<S>,
    C: Convergence<S>,
{
    /// Minimizes the given nonlinear function without preconditioning.
    ///
    /// The function `f` must provide its value as well as its gradient,
    /// written into the provided `&mut [S]` (to avoid allocation). `x0` is
    /// used as the initial guess.
    pub fn minimize<Func>(&self, x0: &[S], f: Func) -> Result<Solution<S>, NonlinearCGError<S>>
    where
        Func: FnMut(&[S], &mut [S]) -> S,
    {
        self.minimize_with_trace(x0, f, |_, _| {})
    }

    /// The same as `minimize`, but with a callback invoked after every
    /// iteration with the new iterate and the iteration record.
    pub fn minimize_with_trace<Func, Callback>(
        &self,
        x0: &[S],
        f: Func,
        callback: Callback,
    ) -> Result<Solution<S>, NonlinearCGError<S>>
    where
        Func: FnMut(&[S], &mut [S]) -> S,
        Callback: FnMut(&[S], &IterationRecord<S>),
    {
        let mut precond = Preconditioner::None;
        self.minimize_preconditioned(x0, f, &mut precond, |_, _| {}, callback)
    }

    /// The full surface: preconditioned minimization with a per-iteration
    /// `precondprep` refresh and a trace callback.
    ///
    /// `precondprep` is called with the preconditioner and the current
    /// iterate once per iteration, before the preconditioner is used; the
    /// driver itself never mutates the preconditioner.
    pub fn minimize_preconditioned<Func, Prep, Callback>(
        &self,
        x0: &[S],
        mut f: Func,
        precond: &mut Preconditioner<S>,
        mut precondprep: Prep,
        mut callback: Callback,
    ) -> Result<Solution<S>, NonlinearCGError<S>>
    where
        Func: FnMut(&[S], &mut [S]) -> S,
        Prep: FnMut(&mut Preconditioner<S>, &[S]),
        Callback: FnMut(&[S], &IterationRecord<S>),
    {
        let n = x0.len();

        // iterate state, allocated once and reused in place
        let mut x = x0.to_vec();
        let mut x_prev = x0.to_vec();
        let mut gr = vec![S::zero(); n];
        let mut gr_prev = vec![S::zero(); n];
        let mut pgr = vec![S::zero(); n];
        let mut s = vec![S::zero(); n];
        let mut y = vec![S::zero(); n];
        let mut x_scratch = vec![S::zero(); n];
        let mut gr_scratch = vec![S::zero(); n];
        let mut cache = LineSearchCache::new();
        let mut trace: Vec<IterationRecord<S>> = Vec::new();

        let mut f_calls = 0usize;
        let mut g_calls = 0usize;

        let mut f_x = f(&x, &mut gr);
        f_calls += 1;
        g_calls += 1;
        if !f_x.is_finite() || !lin::all_finite(&gr) {
            return Err(NonlinearCGError::NonFiniteStart);
        }
        let mut f_x_prev = S::infinity();

        precondprep(precond, &x);
        precond.forward(&mut pgr, &gr);
        lin::neg_into(&mut s, &pgr);

        let mut alpha = match self.alpha0 {
            Some(a) => a,
            None => alphainit(&x, &gr, f_x, self.psi0),
        };

        let mut flags = ConvergenceFlags::default();
        let mut termination = Termination::IterationLimit;
        let mut iterations = 0usize;

        for k in 0..self.max_iter {
            let dphi0 = match descent_or_restart(&mut s, &gr) {
                Some(d) => d,
                None => {
                    termination = Termination::DegenerateDirection;
                    break;
                }
            };

            // the line-search episode starts from the zero-step entry
            cache.clear();
            cache.push(S::zero(), f_x, dphi0);

            let (trial, mayterminate) = {
                let probe = |t: S| {
                    x_scratch.copy_from_slice(&x);
                    lin::ray_to(&mut x_scratch, &s, t);
                    f(&x_scratch, &mut gr_scratch)
                };
                let r = alphatry(alpha, f_x, dphi0, probe, self.psi1, self.psi2, self.psi3);
                f_calls += r.f_calls;
                g_calls += r.g_calls;
                (r.alpha, r.mayterminate)
            };

            let accepted = {
                let mut phi = |t: S| {
                    f_calls += 1;
                    g_calls += 1;
                    x_scratch.copy_from_slice(&x);
                    lin::ray_to(&mut x_scratch, &s, t);
                    let v = f(&x_scratch, &mut gr_scratch);
                    (v, lin::dot(&gr_scratch, &s))
                };
                self.line_method.search(&mut phi, &mut cache, trial, mayterminate)
            };
            alpha = match accepted {
                Ok(t) => t,
                Err(e) => {
                    return Err(NonlinearCGError::LineSearch {
                        iteration: k,
                        source: e,
                        f_calls,
                        g_calls,
                        trace,
                    })
                }
            };

            // advance the iterate and re-evaluate
            x_prev.copy_from_slice(&x);
            gr_prev.copy_from_slice(&gr);
            lin::ray_to(&mut x, &s, alpha);
            f_x_prev = f_x;
            f_x = f(&x, &mut gr);
            f_calls += 1;
            g_calls += 1;
            if !f_x.is_finite() {
                return Err(NonlinearCGError::NonFiniteObjective {
                    iteration: k,
                    f_calls,
                    g_calls,
                    trace,
                });
            }
            iterations = k + 1;

            flags = self
                .convergence
                .assess(&x, &x_prev, &gr, f_x, f_x_prev, &self.tol);

            precondprep(precond, &x);
            let beta = update_direction(
                &mut s, &gr, &gr_prev, &mut y, &mut pgr, precond, self.eta,
            );

            let record = IterationRecord {
                k,
                value: f_x,
                grad_norm: lin::norm_inf(&gr),
                alpha,
                beta,
                f_calls,
                g_calls,
                extended: if self.trace.extended {
                    Some(ExtendedRecord {
                        x: x.clone(),
                        gradient: gr.clone(),
                        direction: s.clone(),
                    })
                } else {
                    None
                },
            };
            if self.trace.show {
                debug!(
                    "k = {}, f = {:?}, |g| = {:?}, alpha = {:?}, beta = {:?}",
                    record.k, record.value, record.grad_norm, record.alpha, record.beta
                );
            }
            callback(&x, &record);
            if self.trace.store {
                trace.push(record);
            }

            if flags.converged {
                termination = Termination::Converged;
                break;
            }
        }

        Ok(Solution {
            algorithm: ALGORITHM,
            initial_x: x0.to_vec(),
            x,
            f_x,
            iterations,
            termination,
            flags,
            tol: self.tol,
            trace,
            f_calls,
            g_calls,
        })
    }
}

/// Ensures `s` is a descent direction, resetting it to steepest descent if
/// the CG update broke down.
///
/// Returns the directional derivative `gr · s` when it is strictly
/// negative; `None` means even steepest descent fails, i.e. the gradient
/// is numerically zero or corrupted, and the caller must stop. A NaN
/// directional derivative counts as a breakdown.
pub(crate) fn descent_or_restart<S: Float>(s: &mut [S], gr: &[S]) -> Option<S> {
    let dphi0 = lin::dot(gr, s);
    if dphi0 < S::zero() {
        return Some(dphi0);
    }
    lin::neg_into(s, gr);
    let dphi0 = -lin::dot(gr, gr);
    if dphi0 < S::zero() {
        Some(dphi0)
    } else {
        None
    }
}

/// HZ2012 hybrid direction update.
///
/// Replaces `s` with `beta * s - P gr` where
/// `beta = max(betak, eta * (s·gr_prev) / (s·P⁻¹s))` and `betak` is the
/// Hager-Zhang formula on `y = gr - gr_prev`. Returns the `beta` used.
///
/// `y·s` may be near zero when the line search barely moved; the division
/// is deliberately unguarded, and a non-finite beta surfaces as a
/// non-finite objective on the next evaluation.
pub(crate) fn update_direction<S: Float>(
    s: &mut [S],
    gr: &[S],
    gr_prev: &[S],
    y: &mut [S],
    pgr: &mut [S],
    precond: &Preconditioner<S>,
    eta: S,
) -> S {
    let dpd = precond.inverse_dot(s, s);
    let etak = eta * lin::dot(s, gr_prev) / dpd;

    for i in 0..y.len() {
        y[i] = gr[i] - gr_prev[i];
    }
    let ydots = lin::dot(y, s);

    precond.forward(pgr, gr);
    let ypy = precond.forward_dot(y, y);
    let betak = (lin::dot(y, pgr) - ypy * lin::dot(gr, s) / ydots) / ydots;

    let beta = betak.max(etak);
    lin::combine(s, beta, pgr, -S::one());
    beta
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::quickcheck;

    fn quad(x: &[f64], gr: &mut [f64]) -> f64 {
        for i in 0..x.len() {
            gr[i] = 2. * x[i];
        }
        lin::dot(x, x)
    }

    // f(x) = x0^2 + 10 x1^2: mildly ill-conditioned, takes a few iterations
    fn quad_scaled(x: &[f64], gr: &mut [f64]) -> f64 {
        gr[0] = 2. * x[0];
        gr[1] = 20. * x[1];
        x[0].powi(2) + 10. * x[1].powi(2)
    }

    #[test]
    fn quadratic_converges_within_n() {
        let m = NonlinearCG::<f64>::new();
        let x0 = vec![1., 2., 3., 4.];
        let r = m.minimize(&x0, quad).unwrap();

        assert_eq!(r.termination, Termination::Converged);
        assert!(r.flags.converged);
        assert!(r.iterations <= x0.len());
        assert!(r.x.iter().all(|&xi| (2. * xi).abs() < m.tol.g_tol));
    }

    #[test]
    fn fatal_at_start() {
        let m = NonlinearCG::<f64>::new();
        let r = m.minimize(&[1., 1.], |_, gr| {
            gr[0] = 0.;
            gr[1] = 0.;
            f64::NAN
        });
        assert!(matches!(r, Err(NonlinearCGError::NonFiniteStart)));
    }

    #[test]
    fn fatal_gradient_at_start() {
        let m = NonlinearCG::<f64>::new();
        let r = m.minimize(&[1.], |x, gr| {
            gr[0] = f64::NAN;
            x[0] * x[0]
        });
        assert!(matches!(r, Err(NonlinearCGError::NonFiniteStart)));
    }

    /// Stub line search accepting a fixed step, for exercising the driver
    /// without a real Wolfe search.
    #[derive(Debug, Clone)]
    struct FixedStep(f64);

    impl LineSearch<f64> for FixedStep {
        fn search(
            &self,
            _phi: &mut dyn FnMut(f64) -> (f64, f64),
            _cache: &mut LineSearchCache<f64>,
            _c: f64,
            _mayterminate: bool,
        ) -> Result<f64, LineSearchError> {
            Ok(self.0)
        }
    }

    fn with_fixed_step(step: f64) -> NonlinearCG<f64, FixedStep> {
        let base = NonlinearCG::<f64>::new();
        NonlinearCG {
            line_method: FixedStep(step),
            convergence: DefaultConvergence,
            eta: base.eta,
            psi0: base.psi0,
            psi1: base.psi1,
            psi2: base.psi2,
            psi3: base.psi3,
            alpha0: base.alpha0,
            tol: base.tol,
            max_iter: base.max_iter,
            trace: base.trace,
        }
    }

    #[test]
    fn fatal_mid_run_carries_partial_results() {
        // a contract-violating line search steps into the non-finite region
        let m = with_fixed_step(10.);
        let r = m.minimize(&[1.], |x, gr| {
            gr[0] = 2. * x[0];
            if x[0].abs() > 5. {
                f64::NAN
            } else {
                x[0] * x[0]
            }
        });
        match r {
            Err(NonlinearCGError::NonFiniteObjective {
                iteration,
                f_calls,
                g_calls,
                ..
            }) => {
                assert_eq!(iteration, 0);
                assert!(f_calls > 0);
                assert!(g_calls > 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn degenerate_start_exits_cleanly() {
        let m = NonlinearCG::<f64>::new();
        let r = m.minimize(&[0., 0.], quad).unwrap();
        assert_eq!(r.termination, Termination::DegenerateDirection);
        assert_eq!(r.iterations, 0);
        assert!(!r.iteration_limit_reached());
    }

    #[test]
    fn iteration_limit_is_not_an_error() {
        let mut m = NonlinearCG::<f64>::new();
        m.max_iter = 1;
        m.tol.g_tol = 1e-300;
        m.tol.f_tol = 1e-300;
        m.tol.x_tol = 1e-300;
        let r = m.minimize(&[1., 1.], quad_scaled).unwrap();
        assert_eq!(r.termination, Termination::IterationLimit);
        assert!(r.iteration_limit_reached());
        assert_eq!(r.iterations, 1);
    }

    #[test]
    fn unit_diagonal_matches_unpreconditioned() {
        let mut m = NonlinearCG::<f64>::new();
        m.trace.store = true;
        let x0 = vec![1., 1.];

        let plain = m.minimize(&x0, quad_scaled).unwrap();

        let mut ones = Preconditioner::Diagonal(vec![1.; 2]);
        let pre = m
            .minimize_preconditioned(&x0, quad_scaled, &mut ones, |_, _| {}, |_, _| {})
            .unwrap();

        // bit-identical trajectory, not merely close
        assert_eq!(plain.x, pre.x);
        assert_eq!(plain.iterations, pre.iterations);
        assert_eq!(plain.f_calls, pre.f_calls);
        assert_eq!(plain.g_calls, pre.g_calls);
        for (a, b) in plain.trace.iter().zip(pre.trace.iter()) {
            assert_eq!(a.value, b.value);
            assert_eq!(a.alpha, b.alpha);
            assert_eq!(a.beta, b.beta);
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let m = NonlinearCG::<f64>::new();
        let x0 = vec![-3., 7.];
        let a = m.minimize(&x0, quad_scaled).unwrap();
        let b = m.minimize(&x0, quad_scaled).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.f_x, b.f_x);
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.f_calls, b.f_calls);
        assert_eq!(a.g_calls, b.g_calls);
    }

    #[test]
    fn counters_are_monotonic() {
        let mut m = NonlinearCG::<f64>::new();
        m.trace.store = true;
        let r = m.minimize(&[1., 1.], quad_scaled).unwrap();
        assert!(!r.trace.is_empty());
        for w in r.trace.windows(2) {
            assert!(w[0].f_calls <= w[1].f_calls);
            assert!(w[0].g_calls <= w[1].g_calls);
        }
        let last = r.trace.last().unwrap();
        assert!(last.f_calls <= r.f_calls);
        assert!(last.g_calls <= r.g_calls);
    }

    #[test]
    fn trace_records_extended_snapshots() {
        let mut m = NonlinearCG::<f64>::new();
        m.trace.store = true;
        m.trace.extended = true;
        let r = m.minimize(&[1., 2., 3.], quad).unwrap();
        assert!(!r.trace.is_empty());
        for (i, rec) in r.trace.iter().enumerate() {
            assert_eq!(rec.k, i);
            let ext = rec.extended.as_ref().unwrap();
            assert_eq!(ext.x.len(), 3);
            assert_eq!(ext.gradient.len(), 3);
            assert_eq!(ext.direction.len(), 3);
        }
        let last = r.trace.last().unwrap();
        assert_eq!(last.value, r.f_x);
    }

    #[test]
    fn callback_sees_every_iteration() {
        let m = NonlinearCG::<f64>::new();
        let mut count = 0;
        let r = m
            .minimize_with_trace(&[1., 1.], quad_scaled, |x, rec| {
                assert_eq!(x.len(), 2);
                assert_eq!(rec.k, count);
                count += 1;
            })
            .unwrap();
        assert_eq!(count, r.iterations);
    }

    #[test]
    fn solution_reports_run_metadata() {
        let m = NonlinearCG::<f64>::new();
        let x0 = vec![2., -1.];
        let r = m.minimize(&x0, quad).unwrap();
        assert_eq!(r.initial_x, x0);
        assert_eq!(r.algorithm, ALGORITHM);
        assert!(r.f_calls >= r.iterations);
        assert!(r.tol.g_tol > 0.);
    }

    #[test]
    fn restart_recovers_descent() {
        fn prop(gr: Vec<f64>) -> bool {
            let gr: Vec<f64> = gr
                .into_iter()
                .map(|x| if x.is_finite() { x % 1e3 } else { 0. })
                .collect();
            // s = gr is an ascent (or flat) direction, so the safeguard
            // must fire
            let mut s = gr.clone();
            match descent_or_restart(&mut s, &gr) {
                Some(d) => d < 0. && lin::dot(&gr, &gr) > 0.,
                None => lin::dot(&gr, &gr) == 0.,
            }
        }
        quickcheck(prop as fn(Vec<f64>) -> bool);
    }

    #[test]
    fn restart_keeps_descent_directions() {
        let gr = vec![1., -2.];
        let mut s = vec![-1., 0.];
        let d = descent_or_restart(&mut s, &gr).unwrap();
        assert_eq!(d, -1.);
        // untouched: it was already a descent direction
        assert_eq!(s, vec![-1., 0.]);
    }

    #[test]
    fn restart_on_nan_direction() {
        let gr = vec![1., -2.];
        let mut s = vec![f64::NAN, 0.];
        let d = descent_or_restart(&mut s, &gr).unwrap();
        assert_eq!(s, vec![-1., 2.]);
        assert_eq!(d, -5.);
    }

    #[test]
    fn hybrid_beta_formula() {
        let gr = vec![1., 2.];
        let gr_prev = vec![0.5, -1.];
        let mut s = vec![-1., 0.5];
        let mut y = vec![0.; 2];
        let mut pgr = vec![0.; 2];
        let p = Preconditioner::None;

        let beta = update_direction(&mut s, &gr, &gr_prev, &mut y, &mut pgr, &p, 0.4);

        // dPd = 1.25, etak = 0.4 * (-1) / 1.25 = -0.32
        // y = (0.5, 3), ydots = 1, ypy = 9.25, y·pgr = 6.5, gr·s = 0
        // betak = 6.5, beta = max(6.5, -0.32) = 6.5
        assert_eq!(beta, 6.5);
        assert_eq!(s, vec![6.5 * -1. - 1., 6.5 * 0.5 - 2.]);
        assert_eq!(y, vec![0.5, 3.]);
    }

    #[test]
    fn eta_floor_engages() {
        let gr = vec![1., 1.];
        let gr_prev = vec![2., 0.];
        let mut s = vec![1., 0.];
        let mut y = vec![0.; 2];
        let mut pgr = vec![0.; 2];
        let p = Preconditioner::None;

        let beta = update_direction(&mut s, &gr, &gr_prev, &mut y, &mut pgr, &p, 0.4);

        // betak = -2 but etak = 0.4 * 2 / 1 = 0.8 floors it
        assert!((beta - 0.8).abs() < 1e-15);
        assert!((s[0] - (0.8 - 1.)).abs() < 1e-15);
        assert!((s[1] - -1.).abs() < 1e-15);
    }

    #[test]
    fn general_preconditioner_runs() {
        use crate::precond::GeneralPreconditioner;

        #[derive(Debug)]
        struct Scale(f64);

        impl GeneralPreconditioner<f64> for Scale {
            fn forward(&self, out: &mut [f64], a: &[f64]) {
                for i in 0..a.len() {
                    out[i] = self.0 * a[i];
                }
            }
            fn forward_dot(&self, a: &[f64], b: &[f64]) -> f64 {
                self.0 * lin::dot(a, b)
            }
            fn inverse_dot(&self, a: &[f64], b: &[f64]) -> f64 {
                lin::dot(a, b) / self.0
            }
        }

        let m = NonlinearCG::<f64>::new();
        let mut p = Preconditioner::General(Box::new(Scale(0.5)));
        let r = m
            .minimize_preconditioned(&[1., 2.], quad, &mut p, |_, _| {}, |_, _| {})
            .unwrap();
        assert_eq!(r.termination, Termination::Converged);
        assert!(lin::norm_inf(&r.x) < 1e-6);
    }

    #[test]
    fn precondprep_refreshes_each_iteration() {
        let mut m = NonlinearCG::<f64>::new();
        m.max_iter = 3;
        m.tol.g_tol = 1e-300;
        m.tol.f_tol = 1e-300;
        m.tol.x_tol = 1e-300;

        let mut preps = 0;
        let mut p = Preconditioner::Diagonal(vec![1.; 2]);
        let r = m
            .minimize_preconditioned(
                &[1., 1.],
                quad_scaled,
                &mut p,
                |_, _| preps += 1,
                |_, _| {},
            )
            .unwrap();
        // once at initialization plus once per completed iteration
        assert_eq!(preps, r.iterations + 1);
    }
}
