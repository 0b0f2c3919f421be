//! Probability distributions used by the significance tests.
//!
//! The tests depend on the [`DistributionProvider`] trait rather than on
//! concrete functions, so a provider returning tabulated reference values can
//! be substituted in tests. [`StatrsDistributions`] is the stateless default:
//! F and Student t tails come from `statrs`, the studentized range
//! distribution is integrated numerically.
//!
//! # Studentized range
//!
//! For `k` groups and `ν` error degrees of freedom:
//!
//! ```text
//! P_R(w; k)    = k ∫ φ(z) [Φ(z) - Φ(z - w)]^(k-1) dz
//! P(Q ≤ q)     = ∫₀^∞ g_ν(s) P_R(q·s; k) ds
//! g_ν(s)       = ν^(ν/2) / (Γ(ν/2) 2^(ν/2-1)) · s^(ν-1) · exp(-ν s² / 2)
//! ```
//!
//! where `g_ν` is the density of `sqrt(χ²_ν / ν)`. The outer integral is
//! taken over `u = ln s`. Both integrals use composite Simpson's rule over
//! truncated supports.
//!
//! # References
//!
//! - Copenhaver, M.D. & Holland, B. (1988). "Computation of the distribution
//!   of the maximum studentized range statistic", *J. Statist. Comput. Simul.* 30, pp. 1-15.
//! - Lund, R.E. & Lund, J.R. (1983). "Algorithm AS 190", *Applied Statistics* 32(2).

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;

/// Distribution functions needed by ANOVA, Tukey HSD and the t-test.
///
/// Implementations must be pure: identical arguments give identical results.
/// Invalid parameters yield `NaN`.
pub trait DistributionProvider {
    /// P(F > f) for the F distribution with (`df1`, `df2`) degrees of freedom.
    fn f_upper_tail(&self, f: f64, df1: f64, df2: f64) -> f64;

    /// P(T > t) for Student's t with `df` degrees of freedom.
    fn t_upper_tail(&self, t: f64, df: f64) -> f64;

    /// P(Q ≤ q) for the studentized range of `groups` means with `df` error
    /// degrees of freedom. `df = ∞` is allowed.
    fn studentized_range_cdf(&self, q: f64, groups: usize, df: f64) -> f64;

    /// Smallest `q` with P(Q ≤ q) ≥ `p`.
    fn studentized_range_quantile(&self, p: f64, groups: usize, df: f64) -> f64;

    /// P(Q > q).
    fn studentized_range_upper_tail(&self, q: f64, groups: usize, df: f64) -> f64 {
        (1.0 - self.studentized_range_cdf(q, groups, df)).clamp(0.0, 1.0)
    }
}

/// Default provider backed by `statrs` and numerical integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatrsDistributions;

/// Simpson intervals for the inner (normal range) integral. Must be even.
const INNER_INTERVALS: usize = 160;
/// Simpson intervals for the outer (log-chi) integral. Must be even.
const OUTER_INTERVALS: usize = 400;
/// The log-chi integrand below `u = -LOG_TAIL / df` is under `e^-LOG_TAIL`.
const LOG_TAIL: f64 = 36.0;
/// Half-width of the truncated standard normal support.
const NORMAL_SUPPORT: f64 = 8.0;
/// Beyond this many degrees of freedom the chi factor is treated as 1.
const INFINITE_DF: f64 = 25_000.0;

impl DistributionProvider for StatrsDistributions {
    fn f_upper_tail(&self, f: f64, df1: f64, df2: f64) -> f64 {
        if f.is_nan() {
            return f64::NAN;
        }
        if f <= 0.0 {
            return 1.0;
        }
        if f.is_infinite() {
            return 0.0;
        }
        match FisherSnedecor::new(df1, df2) {
            Ok(dist) => (1.0 - dist.cdf(f)).clamp(0.0, 1.0),
            Err(_) => f64::NAN,
        }
    }

    fn t_upper_tail(&self, t: f64, df: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        match StudentsT::new(0.0, 1.0, df) {
            Ok(dist) => (1.0 - dist.cdf(t)).clamp(0.0, 1.0),
            Err(_) => f64::NAN,
        }
    }

    fn studentized_range_cdf(&self, q: f64, groups: usize, df: f64) -> f64 {
        if q.is_nan() || groups < 2 || df.is_nan() || df < 1.0 {
            return f64::NAN;
        }
        if q <= 0.0 {
            return 0.0;
        }
        if q.is_infinite() {
            return 1.0;
        }
        if df > INFINITE_DF {
            return normal_range_cdf(q, groups);
        }

        // Outer integral in u = ln s. For small df the chi density keeps
        // heavy mass far below s = 1, reached only on a logarithmic grid.
        let sd = (2.0 * df).sqrt().recip();
        let tail = -LOG_TAIL / df;
        let lo = if 10.0 * sd < 1.0 {
            (1.0 - 10.0 * sd).ln().min(tail)
        } else {
            tail
        };
        let hi = (1.0 + 10.0 * sd).ln();
        let ln_norm = 0.5 * df * df.ln() - ln_gamma(0.5 * df) - (0.5 * df - 1.0) * 2f64.ln();

        let value = simpson(lo, hi, OUTER_INTERVALS, |u| {
            // ln(g(s) · s) with s = e^u
            let ln_weight = ln_norm + df * u - 0.5 * df * (2.0 * u).exp();
            if ln_weight < -690.0 {
                0.0
            } else {
                ln_weight.exp() * normal_range_cdf(q * u.exp(), groups)
            }
        });
        value.clamp(0.0, 1.0)
    }

    fn studentized_range_quantile(&self, p: f64, groups: usize, df: f64) -> f64 {
        if !(p > 0.0 && p < 1.0) || groups < 2 || df.is_nan() || df < 1.0 {
            return f64::NAN;
        }

        let mut lo = 0.0;
        let mut hi = 8.0;
        while self.studentized_range_cdf(hi, groups, df) < p {
            lo = hi;
            hi *= 2.0;
            if hi > 1e6 {
                return f64::INFINITY;
            }
        }
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            if self.studentized_range_cdf(mid, groups, df) < p {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < 1e-7 {
                break;
            }
        }
        0.5 * (lo + hi)
    }
}

/// Standard normal CDF.
fn phi_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal density.
fn phi_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// CDF of the range of `k` independent standard normals.
fn normal_range_cdf(w: f64, k: usize) -> f64 {
    if w <= 0.0 {
        return 0.0;
    }
    let exponent = (k - 1) as i32;
    let value = simpson(-NORMAL_SUPPORT, NORMAL_SUPPORT, INNER_INTERVALS, |z| {
        let band = phi_cdf(z) - phi_cdf(z - w);
        phi_pdf(z) * band.max(0.0).powi(exponent)
    });
    (k as f64 * value).clamp(0.0, 1.0)
}

/// Composite Simpson's rule with `n` (even) intervals.
fn simpson<F: Fn(f64) -> f64>(a: f64, b: f64, n: usize, f: F) -> f64 {
    let h = (b - a) / n as f64;
    let interior: f64 = (1..n)
        .map(|i| {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            weight * f(a + i as f64 * h)
        })
        .sum();
    (f(a) + interior + f(b)) * h / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: StatrsDistributions = StatrsDistributions;

    #[test]
    fn test_simpson_polynomial_exact() {
        let v = simpson(0.0, 2.0, 10, |x| x * x * x);
        assert!((v - 4.0).abs() < 1e-12, "v = {v}");
    }

    #[test]
    fn test_normal_range_k2_closed_form() {
        // Range of two normals: P(|Z1 - Z2| ≤ w) = 2Φ(w/√2) - 1
        for &w in &[0.5, 1.0, 2.0, 3.5] {
            let expected = 2.0 * phi_cdf(w / std::f64::consts::SQRT_2) - 1.0;
            let got = normal_range_cdf(w, 2);
            assert!((got - expected).abs() < 1e-6, "w={w}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_studentized_range_quantiles_match_tables() {
        // Harter (1960) tables, alpha = 0.05
        let cases = [
            (3, 12.0, 3.773),
            (4, 20.0, 3.958),
            (2, 10.0, 3.151),
            (5, 60.0, 3.977),
            (3, f64::INFINITY, 3.314),
        ];
        for (k, df, expected) in cases {
            let q = D.studentized_range_quantile(0.95, k, df);
            assert!((q - expected).abs() < 0.01, "k={k}, df={df}: q={q}, expected {expected}");
        }
    }

    #[test]
    fn test_studentized_range_cdf_monotone_and_bounded() {
        let mut prev = 0.0;
        for i in 1..=20 {
            let q = i as f64 * 0.5;
            let p = D.studentized_range_cdf(q, 4, 15.0);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= prev - 1e-9, "not monotone at q={q}");
            prev = p;
        }
        assert_eq!(D.studentized_range_cdf(0.0, 4, 15.0), 0.0);
    }

    #[test]
    fn test_studentized_range_small_df() {
        // q(0.95; 2, 1) = 17.97
        let q = D.studentized_range_quantile(0.95, 2, 1.0);
        assert!((q - 17.97).abs() < 0.1, "q = {q}");
    }

    #[test]
    fn test_studentized_range_one_df_tables() {
        // q(0.99; 2, 1) = sqrt(2) tan(0.495 pi) = 90.03, q(0.95; 5, 1) = 37.08
        let q = D.studentized_range_quantile(0.99, 2, 1.0);
        assert!((q - 90.03).abs() < 0.5, "q = {q}");
        let q = D.studentized_range_quantile(0.95, 5, 1.0);
        assert!((q - 37.08).abs() < 0.2, "q = {q}");
    }

    #[test]
    fn test_studentized_range_one_df_cauchy_tail() {
        // With k = 2 and df = 1, Q / sqrt(2) is |Cauchy|.
        for &q in &[5.0, 50.0, 200.0] {
            let exact = 1.0 - 2.0 / std::f64::consts::PI * (q / 2f64.sqrt()).atan();
            let tail = 1.0 - D.studentized_range_cdf(q, 2, 1.0);
            assert!((tail - exact).abs() < 1e-4, "q = {q}: {tail} vs {exact}");
        }
    }

    #[test]
    fn test_invalid_parameters_are_nan() {
        assert!(D.studentized_range_cdf(2.0, 1, 10.0).is_nan());
        assert!(D.studentized_range_quantile(1.5, 3, 10.0).is_nan());
        assert!(D.f_upper_tail(f64::NAN, 2.0, 10.0).is_nan());
    }

    #[test]
    fn test_f_upper_tail() {
        // F(0.95; 2, 12) = 3.885
        let p = D.f_upper_tail(3.885, 2.0, 12.0);
        assert!((p - 0.05).abs() < 1e-3, "p = {p}");
        assert_eq!(D.f_upper_tail(0.0, 2.0, 12.0), 1.0);
        assert_eq!(D.f_upper_tail(f64::INFINITY, 2.0, 12.0), 0.0);
    }

    #[test]
    fn test_t_upper_tail() {
        // t(0.975; 10) = 2.228
        let p = D.t_upper_tail(2.228, 10.0);
        assert!((p - 0.025).abs() < 1e-3, "p = {p}");
    }
}
