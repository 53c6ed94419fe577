//! Minimizes two small quadratics and prints the iteration trace.

use pncg::NonlinearCG;

fn quad2d(x: &[f64], grad: &mut [f64]) -> f64 {
    assert_eq!(x.len(), 2);
    assert_eq!(grad.len(), 2);

    grad[0] = 2. * x[0];
    grad[1] = 20. * x[1];

    x[0].powi(2) + 10. * x[1].powi(2)
}

fn main() {
    let m = NonlinearCG::<f64>::new();

    println!("f(x) = x^2");
    let r = m.minimize(&[1.], |x, grad| {
        grad[0] = 2. * x[0];
        x[0] * x[0]
    });
    println!("\tresult: {:?}", r.map(|s| (s.x, s.f_x, s.iterations)));

    println!("f(x) = x1^2 + 10 x2^2");
    let r = m.minimize_with_trace(&[1., 1.], quad2d, |x, info| {
        println!("\t{:?}, {:?}", x, info);
    });
    match r {
        Ok(s) => println!(
            "\tminimum {:?} at {:?} after {} iterations ({} evaluations)",
            s.f_x, s.x, s.iterations, s.f_calls
        ),
        Err(e) => println!("\tfailed: {}", e),
    }
}
