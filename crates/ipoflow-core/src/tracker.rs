//! End-to-end catalyst pipeline: resolve, classify maturity, then either look
//! up fund holders (mature) or predict index inclusions (recent IPO).

use tracing::info;

use crate::engine::{is_mature, SectorOverride};
use crate::provider::MarketDataProvider;
use crate::report::{build_report, CatalystReport};
use crate::resolver::{ResolveError, SnapshotResolver};
use crate::{Symbol, TradeDate};

pub async fn track<P>(
    resolver: &SnapshotResolver<P>,
    symbol: &Symbol,
    today: TradeDate,
    sector_override: SectorOverride,
) -> Result<CatalystReport, ResolveError>
where
    P: MarketDataProvider,
{
    let mut snapshot = resolver.resolve(symbol).await?;

    if is_mature(snapshot.security.first_trade_date, today) {
        let holders = resolver.fund_holders(symbol).await;
        snapshot = snapshot.with_fund_holders(holders);
    }

    let report = build_report(&snapshot, today, sector_override);
    info!(%symbol, status = report.status.label(), "catalyst report ready");
    Ok(report)
}
