use ipoflow_core::{track, Symbol, TradeDate};

use crate::cli::ReportArgs;
use crate::error::CliError;
use crate::output;

use super::{CommandResult, Resolver};

pub async fn run(
    args: &ReportArgs,
    resolver: &Resolver,
    today: TradeDate,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    match track(resolver, &symbol, today, args.sector.into()).await {
        Ok(report) => {
            let data = serde_json::to_value(&report)?;
            let table = output::report_table(&report);
            Ok(CommandResult::ok(data, table, vec![resolver.provider_id()])
                .with_warnings(report.warnings))
        }
        Err(error) => CommandResult::failed(error, resolver.provider_id()),
    }
}
