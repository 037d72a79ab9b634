use ipoflow_core::{HolderTable, Symbol};
use serde::Serialize;

use crate::cli::HoldersArgs;
use crate::error::CliError;
use crate::output;

use super::{CommandResult, Resolver};

#[derive(Debug, Serialize)]
struct HoldersData {
    symbol: Symbol,
    holders: HolderTable,
}

pub async fn run(args: &HoldersArgs, resolver: &Resolver) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let holders = resolver.fund_holders(&symbol).await;
    let table = HolderTable::from_holders(holders.as_deref());

    let warnings = match table {
        HolderTable::Unavailable => vec![String::from("fund holder data unavailable")],
        HolderTable::Available { .. } => Vec::new(),
    };
    let lines = output::holders_table(&symbol, &table);
    let data = serde_json::to_value(HoldersData {
        symbol,
        holders: table,
    })?;

    Ok(CommandResult::ok(data, lines, vec![resolver.provider_id()]).with_warnings(warnings))
}
