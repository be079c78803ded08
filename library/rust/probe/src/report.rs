use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outcome::{serialize_duration_ms, Outcome};
use crate::status::HealthStatus;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// 1 回の実行で生成される集約結果。永続化はせず、実行のたびに新しく生成する。
///
/// `entries` は登録順で、タスクの完了順には依存しない。
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub entries: Vec<ReportEntry>,
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_duration_ms")]
    pub total_duration: Duration,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(entries: Vec<ReportEntry>, total_duration: Duration) -> Self {
        Self {
            status: aggregate(&entries),
            entries,
            total_duration,
            checked_at: Utc::now(),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.outcome)
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 全エントリのうち最も重いステータスを返す。エントリが無い場合は Healthy。
pub fn aggregate<'a>(entries: impl IntoIterator<Item = &'a ReportEntry>) -> HealthStatus {
    entries
        .into_iter()
        .map(|e| e.outcome.status)
        .max()
        .unwrap_or_default()
}
