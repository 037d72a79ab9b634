use serde::Serialize;

use crate::{PriceSeries, TradeDate};

/// Series shorter than this cannot hold a full trading year.
pub const TRADING_YEAR_OBSERVATIONS: usize = 250;

const ONE_YEAR_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReturnFlags {
    /// The one-year figure is measured from the first trade, not a trailing year.
    pub one_year_since_ipo: bool,
}

/// Price-derived metrics of a series as of one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnMetrics {
    pub current_price: f64,
    pub previous_close: f64,
    pub ytd_return_pct: Option<f64>,
    pub one_year_return_pct: Option<f64>,
    pub flags: ReturnFlags,
}

pub fn compute_returns(prices: &PriceSeries, as_of: TradeDate) -> ReturnMetrics {
    let points = prices.points();
    let current_price = prices.last().close;
    let previous_close = match points {
        [.., previous, _] => previous.close,
        _ => current_price,
    };

    let ytd_return_pct = points
        .iter()
        .find(|point| point.date.year() == as_of.year())
        .and_then(|base| percent_change(base.close, current_price));

    let cutoff = as_of.minus_days(ONE_YEAR_DAYS);
    let trailing_base = points.iter().rev().find(|point| point.date <= cutoff);
    let (base, since_ipo) = match trailing_base {
        Some(base) => (*base, prices.len() < TRADING_YEAR_OBSERVATIONS),
        None => (prices.first(), true),
    };

    ReturnMetrics {
        current_price,
        previous_close,
        ytd_return_pct,
        one_year_return_pct: percent_change(base.close, current_price),
        flags: ReturnFlags {
            one_year_since_ipo: since_ipo,
        },
    }
}

/// `(current - base) / base * 100`, undefined for a zero base.
pub fn percent_change(base: f64, current: f64) -> Option<f64> {
    if base == 0.0 || !base.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - base) / base * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PricePoint;

    fn series(points: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::new(
            points
                .iter()
                .map(|(date, close)| {
                    PricePoint::new(TradeDate::parse(date).expect("date"), *close).expect("point")
                })
                .collect(),
        )
        .expect("series")
    }

    fn date(raw: &str) -> TradeDate {
        TradeDate::parse(raw).expect("date")
    }

    #[test]
    fn zero_base_is_undefined() {
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(10.0, 12.5), Some(25.0));
    }

    #[test]
    fn ytd_uses_first_point_of_the_as_of_year() {
        let prices = series(&[("2023-12-29", 8.0), ("2024-01-02", 10.0), ("2024-03-01", 12.0)]);

        let metrics = compute_returns(&prices, date("2024-03-01"));

        assert_eq!(metrics.current_price, 12.0);
        assert_eq!(metrics.previous_close, 10.0);
        assert_eq!(metrics.ytd_return_pct, Some(20.0));
    }

    #[test]
    fn ytd_is_undefined_without_a_point_in_the_year() {
        let prices = series(&[("2023-12-28", 8.0), ("2023-12-29", 10.0)]);

        let metrics = compute_returns(&prices, date("2024-01-01"));

        assert_eq!(metrics.ytd_return_pct, None);
    }

    #[test]
    fn short_history_falls_back_to_ipo_price() {
        let prices = series(&[("2024-01-10", 20.0), ("2024-03-01", 30.0)]);

        let metrics = compute_returns(&prices, date("2024-03-01"));

        assert_eq!(metrics.one_year_return_pct, Some(50.0));
        assert!(metrics.flags.one_year_since_ipo);
    }

    #[test]
    fn sparse_year_old_history_is_still_flagged_since_ipo() {
        let prices = series(&[("2022-01-03", 10.0), ("2023-01-03", 20.0), ("2024-03-01", 30.0)]);

        let metrics = compute_returns(&prices, date("2024-03-01"));

        // Base is the latest point at least 365 days old.
        assert_eq!(metrics.one_year_return_pct, Some(50.0));
        assert!(metrics.flags.one_year_since_ipo);
    }

    #[test]
    fn full_trading_year_is_a_trailing_return() {
        let start = date("2023-01-02");
        let points = (0..400)
            .map(|offset| (start.plus_days(offset), 10.0 + offset as f64 * 0.01))
            .map(|(day, close)| PricePoint::new(day, close).expect("point"))
            .collect::<Vec<_>>();
        let prices = PriceSeries::new(points).expect("series");
        let as_of = start.plus_days(399);

        let metrics = compute_returns(&prices, as_of);

        let base = 10.0 + 34.0 * 0.01;
        let expected = (metrics.current_price - base) / base * 100.0;
        assert!(!metrics.flags.one_year_since_ipo);
        assert!((metrics.one_year_return_pct.expect("defined") - expected).abs() < 1e-9);
    }
}
