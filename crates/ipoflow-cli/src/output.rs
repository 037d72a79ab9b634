use ipoflow_core::report::DeadlineView;
use ipoflow_core::{CatalystReport, Envelope, HolderTable, InclusionPrediction, Outlook, Symbol};
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::deadlines::DeadlinesData;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    table: &[String],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            for line in table_lines(envelope, table) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn table_lines(envelope: &Envelope<Value>, body: &[String]) -> Vec<String> {
    let mut lines = body.to_vec();

    if !envelope.meta.warnings.is_empty() {
        lines.push(String::new());
        lines.push(String::from("Warnings:"));
        lines.extend(envelope.meta.warnings.iter().map(|warning| format!("  - {warning}")));
    }

    if !envelope.errors.is_empty() {
        lines.push(String::from("Errors:"));
        lines.extend(
            envelope
                .errors
                .iter()
                .map(|error| format!("  - {}: {}", error.code, error.message)),
        );
    }

    let sources = envelope
        .meta
        .source_chain
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(",");
    lines.push(String::new());
    lines.push(format!(
        "request {} | source {} | {} ms",
        envelope.meta.request_id, sources, envelope.meta.latency_ms
    ));
    lines
}

pub fn report_table(report: &CatalystReport) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", report.symbol, report.display_name),
        format!("Status:         {} ({} days public)", report.status_label, report.days_public),
        format!("Sector:         {}", report.sector),
        format!("Industry:       {}", report.industry),
        format!("Market Cap:     {}", report.market_cap),
        String::new(),
        format!(
            "Current Price:  {}{}",
            report.metrics.current_price,
            report
                .metrics
                .day_change
                .as_deref()
                .map(|change| format!(" ({change})"))
                .unwrap_or_default()
        ),
        format!("Previous Close: {}", report.metrics.previous_close),
        format!("YTD Return:     {}", report.metrics.ytd_return),
        format!("1-Year Return:  {}", report.metrics.one_year_return),
        String::new(),
    ];

    lines.extend(deadline_rows(&report.deadlines));
    lines.push(String::new());

    match &report.outlook {
        Outlook::FundHolders { note, holders } => {
            lines.push(note.clone());
            lines.extend(holder_rows(holders));
        }
        Outlook::Inclusions {
            sector_category,
            predictions,
        } => {
            lines.push(format!(
                "Index inclusion targets (sector: {})",
                sector_category.label()
            ));
            lines.extend(inclusion_rows(predictions));
        }
    }

    lines
}

pub fn holders_table(symbol: &Symbol, holders: &HolderTable) -> Vec<String> {
    let mut lines = vec![format!("Top passive holders of {symbol}")];
    lines.extend(holder_rows(holders));
    lines
}

pub fn deadlines_table(data: &DeadlinesData) -> Vec<String> {
    let mut lines = vec![
        format!("First trade:    {}", data.first_trade_date.format_long()),
        format!(
            "Status:         {} ({} days public as of {})",
            data.status.label(),
            data.days_public,
            data.as_of
        ),
        String::new(),
    ];
    lines.extend(deadline_rows(&data.deadlines));

    if let Some(predictions) = &data.inclusions {
        lines.push(String::new());
        lines.push(format!(
            "Index inclusion targets (sector: {})",
            data.sector_category.label()
        ));
        lines.extend(inclusion_rows(predictions));
    }

    lines
}

fn deadline_rows(deadlines: &[DeadlineView]) -> Vec<String> {
    let mut rows = vec![format!("{:<28} {:<14} {}", "Deadline", "Date", "Status")];
    rows.extend(deadlines.iter().map(|deadline| {
        format!(
            "{:<28} {:<14} {}",
            deadline.name,
            deadline.display_date,
            deadline.status.label().to_ascii_uppercase()
        )
    }));
    rows
}

fn inclusion_rows(predictions: &[InclusionPrediction]) -> Vec<String> {
    let mut rows = vec![format!(
        "{:<28} {:<34} {}",
        "Index", "Target", "Probability"
    )];
    for prediction in predictions {
        rows.push(format!(
            "{:<28} {:<34} {}",
            prediction.index_name, prediction.target_window, prediction.probability
        ));
        if let Some(rationale) = &prediction.rationale {
            rows.push(format!("    {rationale}"));
        }
    }
    rows
}

fn holder_rows(holders: &HolderTable) -> Vec<String> {
    match holders {
        HolderTable::Available { rows } => {
            let mut lines = vec![format!("{:<48} {}", "Fund Name", "% of Float Owned")];
            lines.extend(
                rows.iter()
                    .map(|row| format!("{:<48} {}", row.fund_name, row.pct_of_float)),
            );
            lines
        }
        HolderTable::Unavailable => vec![String::from("Fund data temporarily unavailable.")],
    }
}
