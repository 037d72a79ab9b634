use ipoflow_core::engine::{
    classify_sector, days_public, derive_deadlines, is_mature, predict_inclusions,
};
use ipoflow_core::report::{deadline_views, DeadlineView};
use ipoflow_core::{
    InclusionPrediction, MaturityStatus, ProviderId, SectorCategory, TradeDate, ValidationError,
    UNKNOWN_LABEL,
};
use serde::Serialize;

use crate::cli::DeadlinesArgs;
use crate::error::CliError;
use crate::output;

use super::CommandResult;

#[derive(Debug, Serialize)]
pub struct DeadlinesData {
    pub first_trade_date: TradeDate,
    pub as_of: TradeDate,
    pub days_public: i64,
    pub status: MaturityStatus,
    pub deadlines: Vec<DeadlineView>,
    pub sector_category: SectorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusions: Option<Vec<InclusionPrediction>>,
}

pub fn run(args: &DeadlinesArgs, today: TradeDate) -> Result<CommandResult, CliError> {
    let first_trade_date = TradeDate::parse(&args.first_trade)?;
    let market_cap = validated_market_cap(args.market_cap)?;
    let sector = args.sector_name.as_deref().unwrap_or(UNKNOWN_LABEL);
    let industry = args.industry.as_deref().unwrap_or(UNKNOWN_LABEL);

    let mature = is_mature(first_trade_date, today);
    let sector_category = classify_sector(sector, industry, args.sector.into());
    let data = DeadlinesData {
        first_trade_date,
        as_of: today,
        days_public: days_public(first_trade_date, today),
        status: if mature {
            MaturityStatus::Mature
        } else {
            MaturityStatus::RecentIpo
        },
        deadlines: deadline_views(&derive_deadlines(first_trade_date), today),
        sector_category,
        inclusions: (!mature)
            .then(|| predict_inclusions(first_trade_date, sector_category, market_cap)),
    };

    let table = output::deadlines_table(&data);
    Ok(CommandResult::ok(
        serde_json::to_value(&data)?,
        table,
        vec![ProviderId::Static],
    ))
}

fn validated_market_cap(value: Option<f64>) -> Result<f64, ValidationError> {
    let Some(value) = value else {
        return Ok(0.0);
    };
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue {
            field: "market_cap",
        });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: "market_cap",
        });
    }
    Ok(value)
}
