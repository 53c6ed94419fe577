//! Wolfe-condition line search behind a swappable seam.
//!
//! The driver talks to the line search through the [`LineSearch`] trait:
//! a scalar function `phi(t) = (f(x + t s), s · ∇f(x + t s))` along the
//! current ray, the per-iteration [`LineSearchCache`], a trial step and a
//! may-terminate hint. The default implementation is the `secant2` method
//! of _Hager & Zhang'06_, slightly modified to avoid some corner cases
//! where the original method failed.

use num_traits::Float;
use thiserror::Error;

/// Reasons the line search gave up without an acceptable step.
#[derive(Debug, Clone, Error)]
pub enum LineSearchError {
    #[error("line search exceeded {0} secant iterations")]
    MaxIterReached(i32),
    #[error("initial bracketing failed within {0} iterations")]
    InitBracketMaxIterReached(i32),
    #[error("inner bracketing failed within {0} iterations")]
    UBracketMaxIterReached(i32),
}

/// Steps probed during one line-search episode.
///
/// Cleared and reseeded with the zero-step entry `(0, f(x), dphi0)` at the
/// start of every iteration; the line search appends every probe it makes.
#[derive(Debug, Clone, Default)]
pub struct LineSearchCache<S> {
    steps: Vec<S>,
    values: Vec<S>,
    slopes: Vec<S>,
}

impl<S: Float> LineSearchCache<S> {
    pub fn new() -> Self {
        LineSearchCache {
            steps: Vec::new(),
            values: Vec::new(),
            slopes: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.values.clear();
        self.slopes.clear();
    }

    pub fn push(&mut self, step: S, value: S, slope: S) {
        self.steps.push(step);
        self.values.push(value);
        self.slopes.push(slope);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The seed entry, normally `(0, phi(0), phi'(0))`.
    pub fn first(&self) -> Option<(S, S, S)> {
        if self.is_empty() {
            None
        } else {
            Some((self.steps[0], self.values[0], self.slopes[0]))
        }
    }

    pub fn get(&self, i: usize) -> Option<(S, S, S)> {
        if i < self.len() {
            Some((self.steps[i], self.values[i], self.slopes[i]))
        } else {
            None
        }
    }
}

/// Contract between the driver and a Wolfe-condition line search.
pub trait LineSearch<S: Float> {
    /// Finds a step along the current ray satisfying the (approximate)
    /// Wolfe conditions.
    ///
    /// - `phi` evaluates `(value, directional derivative)` at a step.
    /// - `cache` arrives seeded with the zero-step entry; every probe made
    ///   here is appended to it.
    /// - `c` is the positive trial step chosen by the step-size selector.
    /// - `mayterminate` indicates the trial step came from a trusted
    ///   interpolation and may be accepted as soon as it satisfies the
    ///   Wolfe conditions, without bracketing.
    ///
    /// The accepted step must yield a finite objective value; failure is
    /// reported through the error, never through a bogus step.
    fn search(
        &self,
        phi: &mut dyn FnMut(S) -> (S, S),
        cache: &mut LineSearchCache<S>,
        c: S,
        mayterminate: bool,
    ) -> Result<S, LineSearchError>;
}

/// The `secant2` line minimization method by _Hager & Zhang'06_.
#[derive(Debug, Clone)]
pub struct Secant2<S: Float> {
    /// `delta` for the Wolfe condition.
    pub delta: S,
    /// `sigma` for the Wolfe condition.
    pub sigma: S,
    /// `epsilon` for the approximate Wolfe condition (to allow the value
    /// to increase because of rounding errors close to the minimum).
    pub epsilon: S,
    /// Bisection coefficient when the secant step fails; allowed values in
    /// `(0, 1)` (`0.5` is the midpoint of the interval).
    pub theta: S,
    /// Extension factor for finding the initial bracketing interval; `> 1`.
    pub rho: S,
    /// Maximum number of iterations.
    pub max_iter: i32,
    /// Maximum number of U3a--b bracketing iterations.
    pub ubracket_max_iter: i32,
    /// Maximum number of initial bracketing iterations.
    pub init_bracket_max_iter: i32,
}

impl Default for Secant2<f32> {
    // Defaults for the `secant2` method given in [HZ'06]
    fn default() -> Self {
        Secant2 {
            delta: 0.1,
            sigma: 0.9,
            epsilon: 1e-6,
            theta: 0.5,
            rho: 5.,
            max_iter: 32,
            ubracket_max_iter: 32,
            init_bracket_max_iter: 16,
        }
    }
}

impl Default for Secant2<f64> {
    // Defaults for the `secant2` method given in [HZ'06]
    fn default() -> Self {
        Secant2 {
            delta: 0.1,
            sigma: 0.9,
            epsilon: 1e-6,
            theta: 0.5,
            rho: 5.,
            max_iter: 32,
            ubracket_max_iter: 32,
            init_bracket_max_iter: 16,
        }
    }
}

impl Secant2<f32> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Secant2<f64> {
    pub fn new() -> Self {
        Default::default()
    }
}

enum BracketResult<S> {
    Ok((S, S, S), (S, S, S)),
    MaxIterReached(i32),
}

impl<S: Float> Secant2<S> {
    /// Find an approximate minimum of a function _ϕ_ satisfying the Wolfe
    /// condition.
    ///
    ///   - `f` should be the function `f = |t| (ϕ(t), ϕ'(t))`.
    ///   - `c` specifies the initial search interval `(0, c)`.
    ///   - `hint` may contain the value `(ϕ(0), ϕ'(0))` to avoid an
    ///     unnecessary evaluation if this value is already known.
    ///   - `mayterminate` accepts `c` outright when it already satisfies
    ///     the Wolfe condition.
    pub fn find_wolfe<Func>(
        &self,
        c: S,
        mut f: Func,
        hint: Option<(S, S)>,
        mayterminate: bool,
    ) -> Result<S, LineSearchError>
    where
        Func: FnMut(S) -> (S, S),
    {
        assert!(c > S::zero());

        let mut f = |x| {
            let (fx, fdx) = f(x);
            (x, fx, fdx)
        };

        // save origin
        let o = match hint {
            Some((v, d)) => (S::zero(), v, d),
            None => f(S::zero()),
        };

        // ϕ(0) + ε
        let f0_eps = o.1 + self.epsilon;

        let c0 = f(c);
        if mayterminate && self.wolfe(c0, f0_eps, o.2) {
            return Ok(c0.0);
        }

        // bracket starting interval
        let mut ab = match self.bracket(o, c0, &mut f) {
            BracketResult::Ok(a, b) => (a, b),
            BracketResult::MaxIterReached(n) => {
                return Err(LineSearchError::InitBracketMaxIterReached(n))
            }
        };

        // implementation of secant2 method from [HZ'06]
        for _ in 0..self.max_iter {
            let (a, b) = ab;
            let mut cx = secant(a, b);
            // here we handle the case when b gets stuck at a local minimum
            // of ϕ with ϕ(b) > ϕ(0) + ε
            let ctheta = a.0 + self.theta * (b.0 - a.0);
            if cx > ctheta && b.1 + (cx - b.0) * b.2 > f0_eps {
                // Taylor series estimate tells us that phi(b) does not
                // decrease enough => let's help it
                cx = ctheta;
            }

            let c = f(cx);
            if self.wolfe(c, f0_eps, o.2) {
                return Ok(c.0);
            }

            let mut cx;
            if c.2 >= S::zero() {
                cx = secant(b, c);
                ab.1 = c;
            } else if c.1 <= f0_eps {
                cx = secant(a, c);
                ab.0 = c;
            } else {
                ab = match self.ubracket(a, c, &mut f, f0_eps) {
                    BracketResult::Ok(a, b) => (a, b),
                    BracketResult::MaxIterReached(n) => {
                        return Err(LineSearchError::UBracketMaxIterReached(n))
                    }
                };

                continue;
            }
            let (a, b) = ab;

            if cx <= a.0 || b.0 <= cx {
                // here we diverge from the secant2 method: if the second
                // secant produces a point outside of the bracket interval,
                // let's bisect
                cx = a.0 + self.theta * (b.0 - a.0);
            }

            let c = f(cx);
            if self.wolfe(c, f0_eps, o.2) {
                return Ok(c.0);
            }

            if c.2 >= S::zero() {
                ab.1 = c;
            } else if c.1 <= f0_eps {
                ab.0 = c;
            } else {
                ab = match self.ubracket(a, c, &mut f, f0_eps) {
                    BracketResult::Ok(a, b) => (a, b),
                    BracketResult::MaxIterReached(n) => {
                        return Err(LineSearchError::UBracketMaxIterReached(n))
                    }
                };
            }
        }
        Err(LineSearchError::MaxIterReached(self.max_iter))
    }

    // Implementation of U3a--b bracketing loop in [HZ'06]
    //
    // The format of the triples is `(x, f(x), f'(x))`.
    //
    // - `f0_eps` is `\phi(0) + \epsilon_k`
    fn ubracket<Func>(
        &self,
        mut a: (S, S, S),
        mut b: (S, S, S),
        mut f: Func,
        f0_eps: S,
    ) -> BracketResult<S>
    where
        Func: FnMut(S) -> (S, S, S),
    {
        // preconditions
        assert!(a.0 < b.0);
        assert!(a.2 < S::zero());
        assert!(b.2 < S::zero());
        assert!(a.1 <= f0_eps && f0_eps < b.1);

        for _ in 0..self.ubracket_max_iter {
            let cx = a.0 + self.theta * (b.0 - a.0);
            let c = f(cx);

            if c.2 >= S::zero() {
                return BracketResult::Ok(a, c);
            } else if c.1 <= f0_eps {
                a = c;
            } else {
                b = c;
            }
        }

        BracketResult::MaxIterReached(self.ubracket_max_iter)
    }

    // Initial bracketing: `bracket(c)` method in [HZ'06]
    fn bracket<Func>(&self, mut a: (S, S, S), mut b: (S, S, S), mut f: Func) -> BracketResult<S>
    where
        Func: FnMut(S) -> (S, S, S),
    {
        // preconditions
        assert!(a.0 < b.0);
        assert!(a.2 < S::zero());

        let o = a;
        let f0_eps = o.1 + self.epsilon;

        for _ in 0..self.init_bracket_max_iter {
            if b.2 >= S::zero() {
                return BracketResult::Ok(a, b);
            } else if b.1 > f0_eps {
                return self.ubracket(o, b, f, f0_eps);
            } else {
                a = b;
                let bx = self.rho * b.0;
                b = f(bx);
            }
        }

        BracketResult::MaxIterReached(self.init_bracket_max_iter)
    }

    fn wolfe(&self, c: (S, S, S), f0_eps: S, fd0: S) -> bool {
        // approximate Wolfe condition
        // ϕ(x)≤ϕ(0)+ε && σϕ'(0)≤ϕ'(x)≤(2δ-1)ϕ'(0)
        c.1 <= f0_eps
            && self.sigma * fd0 <= c.2
            && c.2 <= (self.delta + self.delta - S::one()) * fd0
    }
}

impl<S: Float> LineSearch<S> for Secant2<S> {
    fn search(
        &self,
        phi: &mut dyn FnMut(S) -> (S, S),
        cache: &mut LineSearchCache<S>,
        c: S,
        mayterminate: bool,
    ) -> Result<S, LineSearchError> {
        let hint = cache.first().map(|(_, v, d)| (v, d));
        let mut f = |t: S| {
            let (v, d) = phi(t);
            cache.push(t, v, d);
            (v, d)
        };
        self.find_wolfe(c, &mut f, hint, mayterminate)
    }
}

fn secant<S: Float>(a: (S, S, S), b: (S, S, S)) -> S {
    (a.0 * b.2 - b.0 * a.2) / (b.2 - a.2)
}
