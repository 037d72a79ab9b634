use std::fmt::{Display, Formatter};

use ipoflow_core::{EnvelopeMeta, ProviderId, ValidationError};
use uuid::Uuid;

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// 16-byte hex trace id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-invocation metadata, turned into [`EnvelopeMeta`] once the command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub request_id: RequestId,
    pub trace_id: TraceId,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(
        source_chain: Vec<ProviderId>,
        latency_ms: u64,
        cache_hit: bool,
    ) -> Result<Self, ValidationError> {
        if source_chain.is_empty() {
            return Err(ValidationError::EmptySourceChain);
        }

        Ok(Self {
            request_id: RequestId::new_v4(),
            trace_id: TraceId::new(),
            source_chain,
            latency_ms,
            cache_hit,
            warnings: Vec::new(),
        })
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn into_envelope_meta(self) -> Result<EnvelopeMeta, ValidationError> {
        Ok(EnvelopeMeta::new(
            self.request_id.to_string(),
            self.source_chain,
            self.latency_ms,
            self.cache_hit,
        )?
        .with_trace_id(self.trace_id.as_str())?
        .with_warnings(self.warnings))
    }
}
