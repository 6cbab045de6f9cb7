//! Log-gamma, digamma, and trigamma functions.
//!
//! Fitting Dirichlet-family models requires lnΓ for objective values and
//! ψ, ψ′ for gradients and Hessians. These are implemented directly
//! (Lanczos approximation for lnΓ, recurrence plus asymptotic expansion
//! for ψ and ψ′) so the crate carries no special-function dependency.

/// Lanczos parameter g.
const LANCZOS_G: f64 = 7.0;

/// Lanczos series coefficients (g = 7, n = 9), from Paul Godfrey / Boost.
const LANCZOS_COEFFS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];

/// Argument above which the asymptotic expansions of ψ and ψ′ are accurate.
const ASYMPTOTIC_THRESHOLD: f64 = 6.0;

/// B_{2k}/(2k) for k = 1..7; the digamma asymptotic tail is
/// ψ(x) ≈ ln x − 1/(2x) − Σ B_{2k}/(2k · x^{2k}).
const DIGAMMA_TAIL: [f64; 7] = [
    1.0 / 12.0,
    -1.0 / 120.0,
    1.0 / 252.0,
    -1.0 / 240.0,
    1.0 / 132.0,
    -691.0 / 32760.0,
    1.0 / 12.0,
];

/// B_{2k} for k = 1..7; the trigamma asymptotic tail is
/// ψ′(x) ≈ 1/x + 1/(2x²) + Σ B_{2k}/x^{2k+1}.
const TRIGAMMA_TAIL: [f64; 7] = [
    1.0 / 6.0,
    -1.0 / 30.0,
    1.0 / 42.0,
    -1.0 / 30.0,
    5.0 / 66.0,
    -691.0 / 2730.0,
    7.0 / 6.0,
];

/// Evaluate the Lanczos series Ag(z) = c0 + c1/(z+1) + c2/(z+2) + ...
#[inline]
fn lanczos_sum(z: f64) -> f64 {
    let mut sum = LANCZOS_COEFFS[0];
    for (i, &c) in LANCZOS_COEFFS[1..].iter().enumerate() {
        sum += c / (z + (i + 1) as f64);
    }
    sum
}

/// Natural logarithm of the gamma function, ln Γ(x).
///
/// Uses the Lanczos approximation in log space to avoid overflow for
/// large arguments and the reflection formula for x < 0.5. Returns
/// infinity at non-positive integer poles and NaN for NaN input.
pub fn ln_gamma(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }

    // Non-positive integers are poles
    if x <= 0.0 && x == x.floor() {
        return f64::INFINITY;
    }

    // Reflection in log space for x < 0.5
    if x < 0.5 {
        let sin_pi_x = (std::f64::consts::PI * x).sin().abs();
        if sin_pi_x == 0.0 {
            return f64::INFINITY;
        }
        return std::f64::consts::PI.ln() - sin_pi_x.ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let t = z + LANCZOS_G + 0.5;
    let half_ln_two_pi = 0.5 * std::f64::consts::TAU.ln();

    half_ln_two_pi + (z + 0.5) * t.ln() - t + lanczos_sum(z).ln()
}

/// Digamma function ψ(x) = d/dx ln Γ(x).
///
/// Shifts the argument into the asymptotic region via the recurrence
/// ψ(x+1) = ψ(x) + 1/x, then applies a 7-term expansion in 1/x². For
/// x < 0 the reflection formula ψ(x) = ψ(1−x) − π/tan(πx) is used.
/// Returns NaN at non-positive integer poles.
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if x <= 0.0 && x == x.floor() {
        return f64::NAN;
    }
    if x < 0.0 {
        let pi = std::f64::consts::PI;
        return digamma(1.0 - x) - pi / (pi * x).tan();
    }

    let mut result = 0.0;
    let mut xx = x;
    while xx < ASYMPTOTIC_THRESHOLD {
        result -= 1.0 / xx;
        xx += 1.0;
    }

    result += xx.ln() - 0.5 / xx;
    let inv_x2 = 1.0 / (xx * xx);
    let mut term = inv_x2;
    for &c in &DIGAMMA_TAIL {
        result -= c * term;
        term *= inv_x2;
    }
    result
}

/// Trigamma function ψ′(x) = d²/dx² ln Γ(x).
///
/// Same strategy as [`digamma`]: the recurrence ψ′(x) = ψ′(x+1) + 1/x²
/// shifts into the asymptotic region, followed by the Bernoulli-number
/// tail. For x < 0 the reflection ψ′(x) = π²/sin²(πx) − ψ′(1−x) applies.
/// Returns NaN at non-positive integer poles.
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if x <= 0.0 && x == x.floor() {
        return f64::NAN;
    }
    if x < 0.0 {
        let pi = std::f64::consts::PI;
        let sin_pi_x = (pi * x).sin();
        return pi * pi / (sin_pi_x * sin_pi_x) - trigamma(1.0 - x);
    }

    let mut result = 0.0;
    let mut xx = x;
    while xx < ASYMPTOTIC_THRESHOLD {
        result += 1.0 / (xx * xx);
        xx += 1.0;
    }

    // 1/x + 1/(2x^2) + sum of B_2k / x^(2k+1)
    let inv_x = 1.0 / xx;
    let inv_x2 = inv_x * inv_x;
    result += inv_x + 0.5 * inv_x2;
    let mut term = inv_x * inv_x2;
    for &c in &TRIGAMMA_TAIL {
        result += c * term;
        term *= inv_x2;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EULER_MASCHERONI: f64 = 0.5772156649015329;

    #[test]
    fn test_ln_gamma_known_values() {
        // ln Γ(1) = ln Γ(2) = 0
        assert_abs_diff_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-13);
        assert_abs_diff_eq!(ln_gamma(2.0), 0.0, epsilon = 1e-13);
        // Γ(5) = 24
        assert_abs_diff_eq!(ln_gamma(5.0), 24.0_f64.ln(), epsilon = 1e-12);
        // Γ(0.5) = sqrt(pi)
        assert_abs_diff_eq!(
            ln_gamma(0.5),
            0.5 * std::f64::consts::PI.ln(),
            epsilon = 1e-12
        );
        // Large argument, no overflow
        assert_abs_diff_eq!(ln_gamma(100.0), 359.1342053695754, epsilon = 1e-8);
    }

    #[test]
    fn test_ln_gamma_recurrence() {
        // ln Γ(x+1) = ln Γ(x) + ln x
        for &x in &[0.7, 1.3, 4.5, 23.0, 150.5] {
            assert_abs_diff_eq!(ln_gamma(x + 1.0), ln_gamma(x) + x.ln(), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_ln_gamma_poles() {
        assert!(ln_gamma(0.0).is_infinite());
        assert!(ln_gamma(-3.0).is_infinite());
        assert!(ln_gamma(f64::NAN).is_nan());
    }

    #[test]
    fn test_digamma_known_values() {
        // psi(1) = -gamma
        assert_abs_diff_eq!(digamma(1.0), -EULER_MASCHERONI, epsilon = 1e-12);
        // psi(2) = 1 - gamma
        assert_abs_diff_eq!(digamma(2.0), 1.0 - EULER_MASCHERONI, epsilon = 1e-12);
        // psi(1/2) = -gamma - 2 ln 2
        assert_abs_diff_eq!(
            digamma(0.5),
            -EULER_MASCHERONI - 2.0 * 2.0_f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_digamma_recurrence() {
        for &x in &[0.3, 1.7, 5.5, 42.0] {
            assert_abs_diff_eq!(digamma(x + 1.0), digamma(x) + 1.0 / x, epsilon = 1e-11);
        }
    }

    #[test]
    fn test_trigamma_known_values() {
        // psi'(1) = pi^2 / 6
        let pi2 = std::f64::consts::PI * std::f64::consts::PI;
        assert_abs_diff_eq!(trigamma(1.0), pi2 / 6.0, epsilon = 1e-11);
        // psi'(1/2) = pi^2 / 2
        assert_abs_diff_eq!(trigamma(0.5), pi2 / 2.0, epsilon = 1e-11);
    }

    #[test]
    fn test_trigamma_recurrence() {
        for &x in &[0.4, 2.2, 9.5, 77.0] {
            assert_abs_diff_eq!(
                trigamma(x + 1.0),
                trigamma(x) - 1.0 / (x * x),
                epsilon = 1e-11
            );
        }
    }

    #[test]
    fn test_poles_are_nan() {
        assert!(digamma(0.0).is_nan());
        assert!(digamma(-2.0).is_nan());
        assert!(trigamma(0.0).is_nan());
        assert!(trigamma(-1.0).is_nan());
    }
}
