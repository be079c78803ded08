use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::ProbeError;
use crate::status::HealthStatus;

/// 1 回の Probe 実行結果。
///
/// 実行ごとにちょうど 1 つ生成され、生成後は変更されない。
/// `duration` は実行コアが計測した値で上書きされる。
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<ProbeError>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

impl Outcome {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            description: None,
            data: BTreeMap::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy)
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded).with_description(description)
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy).with_description(description)
    }

    /// 分離境界で捕捉したエラーから Outcome を生成する。
    pub fn from_error(status: HealthStatus, error: ProbeError) -> Self {
        let mut outcome = Self::new(status).with_description(error.to_string());
        if error.is_timeout() {
            outcome = outcome.with_data("timed_out", true);
        }
        outcome.error = Some(error);
        outcome
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ProbeError) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.error.as_ref().is_some_and(ProbeError::is_timeout)
    }
}

fn serialize_error<S: Serializer>(error: &Option<ProbeError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_str(&e.to_string()),
        None => s.serialize_none(),
    }
}

pub(crate) fn serialize_duration_ms<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
