//! Preconditioned nonlinear conjugate gradient minimization.
//!
//! Implements the `CG_DESCENT` family of _Hager & Zhang_ with the HZ2012
//! hybrid direction update, an optional preconditioner (identity, diagonal
//! or general) and a swappable Wolfe-condition line search (`secant2` from
//! [HZ'06] by default).
//!
//! ```rust
//! use pncg::NonlinearCG;
//!
//! let m = NonlinearCG::<f64>::new();
//! let r = m
//!     .minimize(&[1., 1.], |x, gr| {
//!         gr[0] = 2. * x[0];
//!         gr[1] = 20. * x[1];
//!         x[0].powi(2) + 10. * x[1].powi(2)
//!     })
//!     .unwrap();
//! assert!(r.flags.converged);
//! ```

pub mod lin;

mod alpha;
mod convergence;
mod ncg;
mod precond;
mod secant2;
mod trace;

pub use alpha::{alphainit, alphatry, AlphaTry};
pub use convergence::{Convergence, ConvergenceFlags, DefaultConvergence, Tolerances};
pub use ncg::{NonlinearCG, NonlinearCGError, Solution, Termination};
pub use precond::{GeneralPreconditioner, Preconditioner};
pub use secant2::{LineSearch, LineSearchCache, LineSearchError, Secant2};
pub use trace::{ExtendedRecord, IterationRecord, TraceFlags};
