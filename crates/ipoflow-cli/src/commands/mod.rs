pub(crate) mod deadlines;
mod holders;
mod report;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ipoflow_core::{
    CachedProvider, Envelope, EnvelopeError, MarketDataProvider, ProviderId, ProviderPolicy,
    ReqwestHttpClient, ResolveError, ResolverConfig, RetryPolicy, SnapshotResolver, TradeDate,
    YahooAdapter,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

pub type Resolver = SnapshotResolver<Arc<dyn MarketDataProvider>>;

/// Requests one provider call may chain on a cold session: cookie, crumb, data
/// and the data retry after a session refresh.
const REQUESTS_PER_CALL: u32 = 4;

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub table: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub failure: Option<ResolveError>,
    pub cache_hit: bool,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, table: Vec<String>, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            table,
            warnings: Vec::new(),
            errors: Vec::new(),
            failure: None,
            cache_hit: false,
            source_chain,
        }
    }

    /// A resolution failure rendered as an envelope error with `data: null`.
    pub fn failed(error: ResolveError, source: ProviderId) -> Result<Self, CliError> {
        let envelope_error = EnvelopeError::new(error.code(), error.to_string())?
            .with_retryable(error.retryable())
            .with_source(source);

        Ok(Self {
            data: Value::Null,
            table: Vec::new(),
            warnings: Vec::new(),
            errors: vec![envelope_error],
            failure: Some(error),
            cache_hit: false,
            source_chain: vec![source],
        })
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

/// Envelope ready to render plus the failure that decides the exit code.
pub struct CommandOutcome {
    pub envelope: Envelope<Value>,
    pub table: Vec<String>,
    pub failure: Option<ResolveError>,
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    let today = match &cli.as_of {
        Some(raw) => TradeDate::parse(raw)?,
        None => TradeDate::today_utc(),
    };
    debug!(%today, mock = cli.mock, "running command");

    let started = Instant::now();
    let command_result = match &cli.command {
        Command::Report(args) => report::run(args, &build_resolver(cli), today).await?,
        Command::Holders(args) => holders::run(args, &build_resolver(cli)).await?,
        Command::Deadlines(args) => deadlines::run(args, today)?,
    };
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let CommandResult {
        data,
        table,
        warnings,
        errors,
        failure,
        cache_hit,
        source_chain,
    } = command_result;

    let meta = Metadata::new(source_chain, latency_ms, cache_hit)?
        .with_warnings(warnings)
        .into_envelope_meta()?;

    Ok(CommandOutcome {
        envelope: Envelope::with_errors(meta, data, errors)?,
        table,
        failure,
    })
}

fn build_resolver(cli: &Cli) -> Resolver {
    let timeout = Duration::from_millis(cli.timeout_ms);
    let policy = ProviderPolicy::yahoo_default().with_request_timeout(timeout);

    let adapter = if cli.mock {
        YahooAdapter::default()
    } else {
        YahooAdapter::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
    .with_policy(policy);

    let provider: Arc<dyn MarketDataProvider> = if cli.no_cache {
        Arc::new(adapter)
    } else {
        Arc::new(CachedProvider::new(adapter))
    };

    SnapshotResolver::with_config(provider, resolver_config(cli))
}

fn resolver_config(cli: &Cli) -> ResolverConfig {
    ResolverConfig {
        retry: RetryPolicy {
            max_retries: cli.max_retries,
            ..RetryPolicy::default()
        },
        call_timeout: Duration::from_millis(cli.timeout_ms).saturating_mul(REQUESTS_PER_CALL),
    }
}
