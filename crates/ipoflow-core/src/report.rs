//! Presentation-facing catalyst report.
//!
//! [`build_report`] is pure: it formats the engine's [`CatalystAssessment`] of a
//! snapshot into display strings. Renderers (JSON, tables) consume
//! [`CatalystReport`] as-is.

use serde::Serialize;

use crate::engine::{
    assess, CatalystAssessment, Deadline, DeadlineKind, DeadlineStatus, InclusionPrediction,
    ReturnMetrics, SectorCategory, SectorOverride,
};
use crate::{FundHolder, MarketSnapshot, Symbol, TradeDate};

/// Rows shown in a fund holder table.
pub const TOP_HOLDER_ROWS: usize = 5;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityStatus {
    Mature,
    RecentIpo,
}

impl MaturityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mature => "Mature Company",
            Self::RecentIpo => "Recent IPO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub current_price: String,
    pub previous_close: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change: Option<String>,
    pub ytd_return: String,
    pub one_year_return: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineView {
    pub kind: DeadlineKind,
    pub name: String,
    pub date: TradeDate,
    pub display_date: String,
    pub offset_days: i64,
    pub status: DeadlineStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderRow {
    pub fund_name: String,
    pub pct_of_float: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HolderTable {
    Available { rows: Vec<HolderRow> },
    Unavailable,
}

impl HolderTable {
    /// Top [`TOP_HOLDER_ROWS`] holders in provider order.
    pub fn from_holders(holders: Option<&[FundHolder]>) -> Self {
        match holders {
            Some(holders) if !holders.is_empty() => Self::Available {
                rows: holders
                    .iter()
                    .take(TOP_HOLDER_ROWS)
                    .map(|holder| HolderRow {
                        fund_name: holder.holder_name.clone(),
                        pct_of_float: format_fraction_pct(holder.pct_of_float),
                    })
                    .collect(),
            },
            _ => Self::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outlook {
    FundHolders {
        note: String,
        holders: HolderTable,
    },
    Inclusions {
        sector_category: SectorCategory,
        predictions: Vec<InclusionPrediction>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalystReport {
    pub symbol: Symbol,
    pub display_name: String,
    pub as_of: TradeDate,
    pub status: MaturityStatus,
    pub status_label: String,
    pub days_public: i64,
    pub sector: String,
    pub industry: String,
    pub market_cap: String,
    pub metrics: MetricsView,
    pub deadlines: Vec<DeadlineView>,
    pub outlook: Outlook,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub fn build_report(
    snapshot: &MarketSnapshot,
    today: TradeDate,
    sector_override: SectorOverride,
) -> CatalystReport {
    let assessment = assess(snapshot, today, sector_override);
    let security = &snapshot.security;
    let status = if assessment.mature {
        MaturityStatus::Mature
    } else {
        MaturityStatus::RecentIpo
    };

    CatalystReport {
        symbol: security.symbol.clone(),
        display_name: security.display_name.clone(),
        as_of: today,
        status,
        status_label: status.label().to_owned(),
        days_public: assessment.days_public,
        sector: security.sector.clone(),
        industry: security.industry.clone(),
        market_cap: format_market_cap(security.market_cap_usd),
        metrics: metrics_view(&assessment.returns),
        deadlines: deadline_views(&assessment.deadlines, today),
        outlook: outlook(snapshot, assessment),
        warnings: snapshot
            .degradations
            .iter()
            .map(|degradation| degradation.describe().to_owned())
            .collect(),
    }
}

pub fn deadline_views(deadlines: &[Deadline], today: TradeDate) -> Vec<DeadlineView> {
    deadlines
        .iter()
        .map(|deadline| DeadlineView {
            kind: deadline.kind,
            name: deadline.name().to_owned(),
            date: deadline.date,
            display_date: deadline.date.format_long(),
            offset_days: deadline.offset_days,
            status: deadline.status(today),
        })
        .collect()
}

fn outlook(snapshot: &MarketSnapshot, assessment: CatalystAssessment) -> Outlook {
    match assessment.inclusions {
        Some(predictions) => Outlook::Inclusions {
            sector_category: assessment.category,
            predictions,
        },
        None => Outlook::FundHolders {
            note: format!(
                "{} has been public for more than a year; lock-ups no longer drive flows, \
                 the funds below do.",
                snapshot.security.symbol
            ),
            holders: HolderTable::from_holders(snapshot.fund_holders.as_deref()),
        },
    }
}

fn metrics_view(returns: &ReturnMetrics) -> MetricsView {
    let current = returns.current_price;
    let previous = returns.previous_close;
    let one_year = format_return_pct(returns.one_year_return_pct);

    MetricsView {
        current_price: format_price(current),
        previous_close: format_price(previous),
        day_change: (current != 0.0 && previous != 0.0)
            .then(|| format!("{:+.2}", current - previous)),
        ytd_return: format_return_pct(returns.ytd_return_pct),
        one_year_return: if returns.flags.one_year_since_ipo
            && returns.one_year_return_pct.is_some()
        {
            format!("{one_year} (Since IPO)")
        } else {
            one_year
        },
    }
}

/// `"$1.23B"`, or `"Unknown"` for a zero or unusable cap.
pub fn format_market_cap(market_cap_usd: f64) -> String {
    if market_cap_usd > 0.0 && market_cap_usd.is_finite() {
        format!("${:.2}B", market_cap_usd / 1e9)
    } else {
        crate::UNKNOWN_LABEL.to_owned()
    }
}

pub fn format_price(price: f64) -> String {
    if price > 0.0 {
        format!("${price:.2}")
    } else {
        NOT_AVAILABLE.to_owned()
    }
}

pub fn format_return_pct(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |pct| format!("{pct:+.2}%"))
}

/// Formats a fraction (`0.0123`) as a percentage (`"1.23%"`).
pub fn format_fraction_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
