//! Application metric record and its canonical JSON codec
//!
//! The collector emits one [`AppMetric`] per application per aggregation
//! window. Records are immutable once constructed; comparison is structural.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-application resource usage and HTTP response-class counters.
///
/// Wire names follow the collector's canonical form: `app`, `cpu` and
/// `memory` are lowercase, the monotonic counters keep their bare upstream
/// field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMetric {
    pub app: String,
    pub cpu: f32,
    pub memory: i64,
    #[serde(rename = "Request")]
    pub request: i64,
    #[serde(rename = "Response")]
    pub response: i64,
    #[serde(rename = "Response2xx")]
    pub response_2xx: i64,
    #[serde(rename = "Response4xx")]
    pub response_4xx: i64,
    #[serde(rename = "Response5xx")]
    pub response_5xx: i64,
    #[serde(rename = "Response5xxRoute")]
    pub response_5xx_route: i64,
}

/// Strict decoding rejects unknown fields; lenient decoding ignores them.
/// Encoders always emit the full field set, so the mode only affects decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Strict,
    Lenient,
}

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("failed to parse metric record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid metric record: {0}")]
    Invalid(String),
}

// Mirror of AppMetric used only for strict decoding.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictAppMetric {
    app: String,
    cpu: f32,
    memory: i64,
    #[serde(rename = "Request")]
    request: i64,
    #[serde(rename = "Response")]
    response: i64,
    #[serde(rename = "Response2xx")]
    response_2xx: i64,
    #[serde(rename = "Response4xx")]
    response_4xx: i64,
    #[serde(rename = "Response5xx")]
    response_5xx: i64,
    #[serde(rename = "Response5xxRoute")]
    response_5xx_route: i64,
}

impl From<StrictAppMetric> for AppMetric {
    fn from(m: StrictAppMetric) -> Self {
        AppMetric {
            app: m.app,
            cpu: m.cpu,
            memory: m.memory,
            request: m.request,
            response: m.response,
            response_2xx: m.response_2xx,
            response_4xx: m.response_4xx,
            response_5xx: m.response_5xx,
            response_5xx_route: m.response_5xx_route,
        }
    }
}

impl AppMetric {
    /// Check the record's well-formedness invariants.
    pub fn validate(&self) -> Result<(), MetricError> {
        if self.app.is_empty() {
            return Err(MetricError::Invalid("app identifier is empty".to_string()));
        }
        if !self.cpu.is_finite() || self.cpu < 0.0 {
            return Err(MetricError::Invalid(format!(
                "cpu must be finite and non-negative, got {}",
                self.cpu
            )));
        }
        let counters = [
            ("Request", self.request),
            ("Response", self.response),
            ("Response2xx", self.response_2xx),
            ("Response4xx", self.response_4xx),
            ("Response5xx", self.response_5xx),
            ("Response5xxRoute", self.response_5xx_route),
        ];
        for (name, value) in counters {
            if value < 0 {
                return Err(MetricError::Invalid(format!(
                    "counter {} is negative: {}",
                    name, value
                )));
            }
        }
        let classified = self
            .response_2xx
            .checked_add(self.response_4xx)
            .and_then(|sum| sum.checked_add(self.response_5xx))
            .ok_or_else(|| {
                MetricError::Invalid("response class counters overflow when summed".to_string())
            })?;
        if classified > self.response {
            return Err(MetricError::Invalid(format!(
                "classified responses ({}) exceed total responses ({})",
                classified, self.response
            )));
        }
        if self.response_5xx_route > self.response_5xx {
            return Err(MetricError::Invalid(format!(
                "Response5xxRoute ({}) exceeds Response5xx ({})",
                self.response_5xx_route, self.response_5xx
            )));
        }
        Ok(())
    }

    /// Encode to the canonical textual form with stable field names.
    pub fn to_canonical_json(&self) -> Result<String, MetricError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON and validate the record's invariants.
    pub fn from_json(input: &str, mode: DecodeMode) -> Result<AppMetric, MetricError> {
        let metric: AppMetric = match mode {
            DecodeMode::Strict => serde_json::from_str::<StrictAppMetric>(input)?.into(),
            DecodeMode::Lenient => serde_json::from_str(input)?,
        };
        metric.validate()?;
        Ok(metric)
    }
}
