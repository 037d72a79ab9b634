use serde::{Deserialize, Serialize};

use crate::{Symbol, TradeDate, ValidationError};

/// Sector/industry label used when the provider cannot supply one.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: TradeDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: TradeDate, close: f64) -> Result<Self, ValidationError> {
        validate_non_negative("close", close)?;
        Ok(Self { date, close })
    }
}

/// Full daily close history of a security, ascending by date.
///
/// Never empty and dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        if points.is_empty() {
            return Err(ValidationError::EmptyPriceSeries);
        }

        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::NonIncreasingDates { index: index + 1 });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> PricePoint {
        self.points[0]
    }

    pub fn last(&self) -> PricePoint {
        self.points[self.points.len() - 1]
    }

    /// Date of the first recorded trade.
    pub fn first_trade_date(&self) -> TradeDate {
        self.first().date
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(value: PriceSeries) -> Self {
        value.points
    }
}

/// Resolved listing identity and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub symbol: Symbol,
    pub first_trade_date: TradeDate,
    pub sector: String,
    pub industry: String,
    /// Market capitalization in USD; `0.0` means unknown.
    pub market_cap_usd: f64,
    pub display_name: String,
}

impl Security {
    pub fn new(
        symbol: Symbol,
        first_trade_date: TradeDate,
        sector: impl Into<String>,
        industry: impl Into<String>,
        market_cap_usd: f64,
        display_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("market_cap_usd", market_cap_usd)?;

        Ok(Self {
            symbol,
            first_trade_date,
            sector: sector.into(),
            industry: industry.into(),
            market_cap_usd,
            display_name: display_name.into(),
        })
    }
}

/// A mutual fund holding the security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundHolder {
    pub holder_name: String,
    /// Fraction of float held, `0.0123` meaning 1.23%.
    pub pct_of_float: f64,
}

impl FundHolder {
    pub fn new(holder_name: impl Into<String>, pct_of_float: f64) -> Result<Self, ValidationError> {
        validate_non_negative("pct_of_float", pct_of_float)?;
        Ok(Self {
            holder_name: holder_name.into(),
            pct_of_float,
        })
    }
}

/// Profile field that was replaced by its default during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    Sector,
    Industry,
    MarketCap,
    DisplayName,
}

impl Degradation {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Sector => "sector unavailable, using 'Unknown'",
            Self::Industry => "industry unavailable, using 'Unknown'",
            Self::MarketCap => "market cap unavailable, using 0",
            Self::DisplayName => "company name unavailable, using ticker",
        }
    }
}

/// Immutable per-query bundle consumed by the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub security: Security,
    pub prices: PriceSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_holders: Option<Vec<FundHolder>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
}

impl MarketSnapshot {
    pub fn new(security: Security, prices: PriceSeries) -> Self {
        Self {
            security,
            prices,
            fund_holders: None,
            degradations: Vec::new(),
        }
    }

    pub fn with_degradations(mut self, degradations: Vec<Degradation>) -> Self {
        self.degradations = degradations;
        self
    }

    pub fn with_fund_holders(mut self, fund_holders: Option<Vec<FundHolder>>) -> Self {
        self.fund_holders = fund_holders;
        self
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
