//! Slice-based vector arithmetic primitives.
//!
//! All minimization state lives in plain `Vec<S>` buffers that are reused
//! in place across iterations; these helpers provide the handful of
//! reductions and elementwise updates the driver needs. Every binary
//! operation asserts that both slices have the same length.

use num_traits::Float;

/// Dot product (inner product).
pub fn dot<S: Float>(a: &[S], b: &[S]) -> S {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(S::zero(), |sum, (&x, &y)| sum + x * y)
}

/// Euclidean norm.
pub fn norm<S: Float>(a: &[S]) -> S {
    dot(a, a).sqrt()
}

/// Infinity norm: the largest absolute entry (zero for an empty slice).
pub fn norm_inf<S: Float>(a: &[S]) -> S {
    a.iter().fold(S::zero(), |m, &x| m.max(x.abs()))
}

/// Infinity norm of the difference `a - b`.
pub fn dist_inf<S: Float>(a: &[S], b: &[S]) -> S {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(S::zero(), |m, (&x, &y)| m.max((x - y).abs()))
}

/// In-place axpy: `x += t * d`.
pub fn ray_to<S: Float>(x: &mut [S], d: &[S], t: S) {
    assert_eq!(x.len(), d.len());
    for (xi, &di) in x.iter_mut().zip(d.iter()) {
        *xi = *xi + di * t;
    }
}

/// In-place linear combination: `x = a * x + b * other`.
pub fn combine<S: Float>(x: &mut [S], a: S, other: &[S], b: S) {
    assert_eq!(x.len(), other.len());
    for (xi, &oi) in x.iter_mut().zip(other.iter()) {
        *xi = *xi * a + oi * b;
    }
}

/// Writes `out = -a`.
pub fn neg_into<S: Float>(out: &mut [S], a: &[S]) {
    assert_eq!(out.len(), a.len());
    for (oi, &ai) in out.iter_mut().zip(a.iter()) {
        *oi = -ai;
    }
}

/// True when every entry is finite (neither NaN nor infinite).
pub fn all_finite<S: Float>(a: &[S]) -> bool {
    a.iter().all(|x| x.is_finite())
}
