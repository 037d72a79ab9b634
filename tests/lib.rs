//! Shared fixtures for the ipoflow behaviour and contract tests.

pub use ipoflow_core::{PricePoint, PriceSeries, Symbol, TradeDate};

pub fn date(raw: &str) -> TradeDate {
    TradeDate::parse(raw).expect("valid date")
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

/// Closes on the given dates, in the order given.
pub fn price_points(points: &[(&str, f64)]) -> Vec<PricePoint> {
    points
        .iter()
        .map(|(day, close)| PricePoint::new(date(day), *close).expect("valid point"))
        .collect()
}

pub fn series(points: &[(&str, f64)]) -> PriceSeries {
    PriceSeries::new(price_points(points)).expect("valid series")
}
