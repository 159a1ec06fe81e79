//! Price-series math shared by the metric implementations

/// Day-over-day percent changes of a price series
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Annualized volatility in percent, assuming 252 trading days
///
/// Input is a close-price series; returns `None` below three points, where a
/// deviation of returns is undefined.
pub fn annualized_volatility_pct(closes: &[f64]) -> Option<f64> {
    let returns = daily_returns(closes);
    std_dev(&returns).map(|sd| sd * (252.0f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert!((returns[0] - 10.0).abs() < 1e-9);
        assert!((returns[1] - -10.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_returns_skips_zero_base() {
        let returns = daily_returns(&[0.0, 10.0, 20.0]);
        assert_eq!(returns.len(), 1);
    }

    #[test]
    fn test_constant_series_has_zero_volatility() {
        let vol = annualized_volatility_pct(&[50.0, 50.0, 50.0, 50.0]).unwrap();
        assert!(vol.abs() < 1e-9);
    }

    #[test]
    fn test_volatility_needs_three_points() {
        assert!(annualized_volatility_pct(&[100.0, 101.0]).is_none());
        assert!(annualized_volatility_pct(&[100.0, 101.0, 103.0]).is_some());
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138).abs() < 1e-3);
    }
}
