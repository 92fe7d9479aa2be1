//! Distribution functions used by the significance evaluator.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Upper tail probability of the chi-square distribution with 1 degree
/// of freedom.
pub fn chi_square_p_value(statistic: f64) -> f64 {
    if statistic <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(1.0) {
        Ok(chi2) => chi2.sf(statistic).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Quantile of the chi-square distribution with 1 degree of freedom:
/// the critical value a statistic must reach to be significant at
/// `level`.
pub fn chi_square_quantile(level: f64) -> f64 {
    if level <= 0.0 {
        return 0.0;
    }
    if level >= 1.0 {
        return f64::INFINITY;
    }
    match ChiSquared::new(1.0) {
        Ok(chi2) => chi2.inverse_cdf(level),
        Err(_) => f64::INFINITY,
    }
}

/// Kolmogorov-Smirnov significance function `Q_KS(lambda)`.
pub fn ks_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1e-3;
    const EPS2: f64 = 1e-8;
    if lambda <= 0.0 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j = j as f64;
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= EPS1 * previous || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    1.0
}

/// Two-sample Kolmogorov-Smirnov test on sorted samples.
///
/// Returns `(d, p)`: the maximum distance between the empirical CDFs and
/// the probability of a distance at least that large under the null.
pub fn ks_two_sample(sorted_a: &[f64], sorted_b: &[f64]) -> (f64, f64) {
    let (n1, n2) = (sorted_a.len(), sorted_b.len());
    if n1 == 0 || n2 == 0 {
        return (0.0, 1.0);
    }
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < n1 && j < n2 {
        let (x, y) = (sorted_a[i], sorted_b[j]);
        if x <= y {
            i += 1;
        }
        if y <= x {
            j += 1;
        }
        let diff = (i as f64 / n1 as f64 - j as f64 / n2 as f64).abs();
        d = d.max(diff);
    }
    let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
    let p = ks_q((en + 0.12 + 0.11 / en) * d);
    (d, p)
}
