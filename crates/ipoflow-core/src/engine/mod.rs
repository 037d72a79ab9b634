//! Catalyst inference engine.
//!
//! Pure functions over a resolved [`MarketSnapshot`]: no I/O, no clock reads.
//! The caller supplies `today`, so identical inputs always yield identical output.
//!
//! | Rule set | Entry point |
//! |----------|-------------|
//! | Price metrics | [`compute_returns`] |
//! | Regulatory deadlines | [`derive_deadlines`] |
//! | Maturity | [`is_mature`] |
//! | Sector bucket | [`classify_sector`] |
//! | Index inclusions | [`predict_inclusions`] |

mod deadlines;
mod inclusion;
mod maturity;
mod returns;

use serde::Serialize;

pub use deadlines::{derive_deadlines, Deadline, DeadlineKind, DeadlineStatus};
pub use inclusion::{
    classify_sector, predict_inclusions, InclusionPrediction, Probability, SectorCategory,
    SectorOverride, LARGE_CAP_THRESHOLD_USD,
};
pub use maturity::{days_public, is_mature, MATURITY_THRESHOLD_DAYS};
pub use returns::{
    compute_returns, percent_change, ReturnFlags, ReturnMetrics, TRADING_YEAR_OBSERVATIONS,
};

use crate::{MarketSnapshot, TradeDate};

/// Everything the engine derives from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalystAssessment {
    pub returns: ReturnMetrics,
    pub deadlines: [Deadline; 3],
    pub days_public: i64,
    pub mature: bool,
    pub category: SectorCategory,
    /// `None` for mature securities, which get fund holders instead.
    pub inclusions: Option<Vec<InclusionPrediction>>,
}

pub fn assess(
    snapshot: &MarketSnapshot,
    today: TradeDate,
    sector_override: SectorOverride,
) -> CatalystAssessment {
    let security = &snapshot.security;
    let first_trade_date = security.first_trade_date;
    let mature = is_mature(first_trade_date, today);
    let category = classify_sector(&security.sector, &security.industry, sector_override);

    CatalystAssessment {
        returns: compute_returns(&snapshot.prices, today),
        deadlines: derive_deadlines(first_trade_date),
        days_public: days_public(first_trade_date, today),
        mature,
        category,
        inclusions: (!mature)
            .then(|| predict_inclusions(first_trade_date, category, security.market_cap_usd)),
    }
}
