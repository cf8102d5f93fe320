/// The factorial of a non-negative integer. Anything else yields NaN, and
/// results beyond the range of `f64` are infinite.
pub fn factorial(x: f64) -> f64 {
    if x < 0.0 || x.fract() != 0.0 {
        return f64::NAN;
    }

    let mut n = x;
    let mut result = 1f64;
    while n >= 2. && result != f64::INFINITY {
        result *= n;
        n -= 1.;
    }
    result
}
