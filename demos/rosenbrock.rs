//! Minimizes the Rosenbrock function, with and without a diagonal
//! preconditioner refreshed at every iterate.

use pncg::{NonlinearCG, Preconditioner};

fn rosenbrock(x: &[f64], grad: &mut [f64]) -> f64 {
    let (a, b) = (x[0], x[1]);
    grad[0] = -2. * (1. - a) - 400. * a * (b - a * a);
    grad[1] = 200. * (b - a * a);
    (1. - a).powi(2) + 100. * (b - a * a).powi(2)
}

fn main() {
    let mut m = NonlinearCG::<f64>::new();
    m.max_iter = 10_000;

    let x0 = [-1.2, 1.];

    match m.minimize(&x0, rosenbrock) {
        Ok(r) => println!(
            "plain:          x = {:?}, f = {:.3e}, {} iterations, {} evaluations",
            r.x, r.f_x, r.iterations, r.f_calls
        ),
        Err(e) => println!("plain:          failed: {}", e),
    }

    // crude diagonal preconditioner from the Hessian diagonal of the
    // quadratic term
    let mut p = Preconditioner::Diagonal(vec![1.; 2]);
    let prep = |p: &mut Preconditioner<f64>, x: &[f64]| {
        if let Preconditioner::Diagonal(d) = p {
            d[0] = 1. / (2. + 1200. * x[0] * x[0] - 400. * x[1]).abs().max(1.);
            d[1] = 1. / 200.;
        }
    };
    match m.minimize_preconditioned(&x0, rosenbrock, &mut p, prep, |_, _| {}) {
        Ok(r) => println!(
            "preconditioned: x = {:?}, f = {:.3e}, {} iterations, {} evaluations",
            r.x, r.f_x, r.iterations, r.f_calls
        ),
        Err(e) => println!("preconditioned: failed: {}", e),
    }
}
