//! Descriptive statistics and rank correlation.
//!
//! Degenerate inputs return 0.0 instead of NaN so aggregates stay finite.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom; 0.0 when `n <= ddof`.
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - ddof) as f64
}

pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// `max - min`; 0.0 for an empty slice.
pub fn value_range(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if values.is_empty() {
        0.0
    } else {
        max - min
    }
}

/// Pearson correlation; 0.0 for fewer than two pairs or a constant side.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));

    let mut cov = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        cov += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (cov / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Kendall's τ over paired positions: `(concordant - discordant) / C(n, 2)`.
///
/// Tied pairs count toward neither side. Fewer than two items gives 0.0.
pub fn kendall_tau(a: &[usize], b: &[usize]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mut balance: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let da = (a[i] as i64 - a[j] as i64).signum();
            let db = (b[i] as i64 - b[j] as i64).signum();
            balance += da * db;
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    balance as f64 / pairs
}

/// Percentile of an ascending-sorted slice with linear interpolation between
/// closest ranks. `q` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = (q / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mean_and_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&v), 5.0));
        assert!(close(variance(&v, 0), 4.0));
        assert!(close(std_dev(&v, 0), 2.0));
        assert!(close(variance(&v, 1), 32.0 / 7.0));
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[3.0], 1), 0.0);
        assert_eq!(value_range(&[]), 0.0);
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(kendall_tau(&[1], &[1]), 0.0);
    }

    #[test]
    fn pearson_signs() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0));
    }

    #[test]
    fn kendall_identity_and_reverse() {
        let ranks = [1, 2, 3, 4, 5];
        let reversed = [5, 4, 3, 2, 1];
        assert_eq!(kendall_tau(&ranks, &ranks), 1.0);
        assert_eq!(kendall_tau(&ranks, &reversed), -1.0);
    }

    #[test]
    fn kendall_single_swap() {
        // One discordant pair out of six
        let tau = kendall_tau(&[1, 2, 3, 4], &[2, 1, 3, 4]);
        assert!(close(tau, (5.0 - 1.0) / 6.0));
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile(&sorted, 50.0), Some(3.0));
        assert_eq!(percentile(&sorted, 100.0), Some(5.0));
        assert!(close(percentile(&sorted, 2.5).unwrap(), 1.1));
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[7.0], 97.5), Some(7.0));
    }

    #[test]
    fn range_spans_extremes() {
        assert_eq!(value_range(&[0.5, -1.25, 2.0]), 3.25);
    }
}
