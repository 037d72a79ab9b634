//! # Domain Models
//!
//! Canonical, validated types shared by the resolver and the inference engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, upper-cased ticker |
//! | [`TradeDate`] | Calendar date of a trading session |
//! | [`PricePoint`] / [`PriceSeries`] | Daily close history, ascending, never empty |
//! | [`Security`] | First trade date plus best-effort profile fields |
//! | [`FundHolder`] | Mutual fund holder and fraction of float |
//! | [`MarketSnapshot`] | Immutable bundle handed to the engine |
//!
//! Construction validates invariants, so an engine function receiving a
//! [`PriceSeries`] can rely on it having at least one point.

mod models;
mod symbol;
mod trade_date;

pub use models::{
    Degradation, FundHolder, MarketSnapshot, PricePoint, PriceSeries, Security, UNKNOWN_LABEL,
};
pub use symbol::Symbol;
pub use trade_date::TradeDate;
