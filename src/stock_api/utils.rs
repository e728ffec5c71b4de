use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::policy::{finite_or, DEFAULT_VOLATILITY, TRADING_DAYS_PER_YEAR};

pub fn parse_date(date_str: &str) -> Result<NaiveDate, String> {
    let date_part = date_str.split(' ').next().unwrap_or(date_str);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .map_err(|e| format!("Failed to parse date {:?}: {}", date_str, e))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn is_weekend(date: &NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Moves `date` forward to the next weekday if it falls on a weekend.
pub fn roll_to_weekday(date: NaiveDate) -> NaiveDate {
    let mut d = date;
    while is_weekend(&d) {
        d += Duration::days(1);
    }
    d
}

/// The `count` business days strictly after `last`.
pub fn next_business_days(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = last;
    for _ in 0..count {
        current = roll_to_weekday(current + Duration::days(1));
        dates.push(current);
    }
    dates
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub fn calculate_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

pub fn std_dev(data: &[f64]) -> f64 {
    calculate_variance(data).sqrt()
}

/// Keeps only finite, positive prices.
pub fn validate_data(data: &[f64]) -> Vec<f64> {
    data.iter()
        .filter_map(|&x| if x.is_finite() && x > 0.0 { Some(x) } else { None })
        .collect()
}

/// Day-over-day simple returns, skipping non-finite transitions.
pub fn calculate_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// `stdev(returns) * sqrt(252)`, or the default when there are no returns.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return DEFAULT_VOLATILITY;
    }
    finite_or(std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt(), DEFAULT_VOLATILITY)
}

pub fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    finite_or((to - from) / from * 100.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_next_business_days_skips_weekend() {
        // 2024-01-05 is a Friday
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let dates = next_business_days(friday, 3);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            ]
        );
    }

    #[test]
    fn test_next_business_days_from_saturday() {
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let dates = next_business_days(saturday, 30);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert!(dates.iter().all(|d| !is_weekend(d)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_returns_skip_non_finite() {
        let returns = calculate_returns(&[0.0, 10.0, 11.0, f64::NAN, 12.0]);
        assert_eq!(returns.len(), 1);
        assert_relative_eq!(returns[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_annualized_volatility() {
        assert_eq!(annualized_volatility(&[]), DEFAULT_VOLATILITY);
        assert!(annualized_volatility(&[0.01, 0.01, 0.01]) < 1e-12);
        let vol = annualized_volatility(&[0.01, -0.01]);
        assert_relative_eq!(vol, 0.01 * 252f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01").unwrap(), expected);
        assert_eq!(parse_date("2024/03/01").unwrap(), expected);
        assert_eq!(parse_date("2024-03-01 15:00:00").unwrap(), expected);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_percent_change_guards_zero() {
        assert_eq!(percent_change(0.0, 5.0), 0.0);
        assert_relative_eq!(percent_change(100.0, 110.0), 10.0, epsilon = 1e-12);
    }
}
