//! Preconditioning of the conjugate gradient direction update.
//!
//! A preconditioner is a symmetric positive definite linear map `P` used by
//! the direction update in three fixed ways: applying `P` to a vector and
//! forming the weighted inner products `aᵀ P b` and `aᵀ P⁻¹ b`. The closed
//! set of variants is {identity, diagonal, general}; anything beyond a
//! diagonal weighting plugs in through [`GeneralPreconditioner`].

use std::fmt;

use num_traits::Float;

use crate::lin;

/// A custom preconditioner exposing the same three operations as the
/// built-in variants.
///
/// Implementations must be symmetric positive definite for the direction
/// update to stay well defined, and must not retain references into the
/// driver's buffers.
pub trait GeneralPreconditioner<S: Float>: fmt::Debug {
    /// Writes `P a` into `out`. `out` and `a` are always distinct buffers.
    fn forward(&self, out: &mut [S], a: &[S]);

    /// Returns `aᵀ P b`.
    fn forward_dot(&self, a: &[S], b: &[S]) -> S;

    /// Returns `aᵀ P⁻¹ b`.
    fn inverse_dot(&self, a: &[S], b: &[S]) -> S;
}

/// Preconditioner for the nonlinear CG direction update.
///
/// Owned by the caller and read-only to the driver; a `precondprep`
/// callback may refresh it once per iteration (see
/// [`NonlinearCG::minimize_preconditioned`](crate::NonlinearCG::minimize_preconditioned)).
#[derive(Debug, Default)]
pub enum Preconditioner<S: Float> {
    /// Identity: all three operations reduce to copies and plain dot
    /// products.
    #[default]
    None,
    /// Diagonal weighting. Entries must be nonzero: `inverse_dot` divides
    /// by them without a runtime check.
    Diagonal(Vec<S>),
    /// Arbitrary symmetric positive definite map.
    General(Box<dyn GeneralPreconditioner<S>>),
}

impl<S: Float> Preconditioner<S> {
    /// Writes `P a` into `out`.
    ///
    /// `out` and `a` must be distinct buffers of equal length.
    pub fn forward(&self, out: &mut [S], a: &[S]) {
        assert_eq!(out.len(), a.len());
        match self {
            Preconditioner::None => out.copy_from_slice(a),
            Preconditioner::Diagonal(p) => {
                assert_eq!(p.len(), a.len());
                for i in 0..a.len() {
                    out[i] = p[i] * a[i];
                }
            }
            Preconditioner::General(g) => g.forward(out, a),
        }
    }

    /// Returns `aᵀ P b`.
    pub fn forward_dot(&self, a: &[S], b: &[S]) -> S {
        assert_eq!(a.len(), b.len());
        match self {
            Preconditioner::None => lin::dot(a, b),
            Preconditioner::Diagonal(p) => {
                assert_eq!(p.len(), a.len());
                a.iter()
                    .zip(p.iter().zip(b.iter()))
                    .fold(S::zero(), |sum, (&ai, (&pi, &bi))| sum + ai * (pi * bi))
            }
            Preconditioner::General(g) => g.forward_dot(a, b),
        }
    }

    /// Returns `aᵀ P⁻¹ b`.
    pub fn inverse_dot(&self, a: &[S], b: &[S]) -> S {
        assert_eq!(a.len(), b.len());
        match self {
            Preconditioner::None => lin::dot(a, b),
            Preconditioner::Diagonal(p) => {
                assert_eq!(p.len(), a.len());
                a.iter()
                    .zip(p.iter().zip(b.iter()))
                    .fold(S::zero(), |sum, (&ai, (&pi, &bi))| sum + ai * bi / pi)
            }
            Preconditioner::General(g) => g.inverse_dot(a, b),
        }
    }
}
