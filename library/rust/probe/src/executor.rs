use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::composite::run_composite;
use crate::config::ExecutorConfig;
use crate::guard::run_guarded;
use crate::outcome::Outcome;
use crate::probe::ProbeContext;
use crate::registration::{ProbeKind, ProbeRegistration};
use crate::report::{HealthReport, ReportEntry};

/// 登録された Probe 群を並列に実行し、結果を Report にまとめる実行コア。
///
/// 各 Probe は独立したタイムアウトとキャンセルスコープの中で実行され、
/// エラー・panic・タイムアウトはすべて登録時の失敗ステータスを持つ Outcome に変換される。
/// `execute` / `execute_one` が呼び出し元にエラーを返すことはない。
#[derive(Debug, Clone, Default)]
pub struct ProbeExecutor {
    config: ExecutorConfig,
}

impl ProbeExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// すべての登録を並列に実行し、全件の Outcome が揃うまで待つ。
    pub async fn execute(
        &self,
        registrations: &[Arc<ProbeRegistration>],
        cancel: &CancellationToken,
    ) -> HealthReport {
        let started = Instant::now();

        let runs: Vec<_> = registrations
            .iter()
            .map(|registration| self.execute_one(registration, cancel))
            .collect();
        let outcomes = join_all(runs).await;

        let entries = registrations
            .iter()
            .zip(outcomes)
            .map(|(registration, outcome)| ReportEntry {
                name: registration.name().to_string(),
                outcome,
            })
            .collect();

        let report = HealthReport::new(entries, started.elapsed());
        tracing::debug!(
            status = %report.status,
            probes = report.len(),
            elapsed_ms = u64::try_from(report.total_duration.as_millis()).unwrap_or(u64::MAX),
            "Probe の実行が完了しました"
        );
        report
    }

    /// 1 件の登録を実行する。
    pub async fn execute_one(
        &self,
        registration: &ProbeRegistration,
        cancel: &CancellationToken,
    ) -> Outcome {
        let ctx = self.context(registration);
        let timeout = ctx.timeout;
        let started = Instant::now();

        let result = match registration.kind() {
            ProbeKind::Single(probe) => {
                let probe = probe.clone();
                let ctx = ctx.clone();
                run_guarded(timeout, cancel, move |scope| async move {
                    probe.run(&ctx, &scope).await
                })
                .await
            }
            ProbeKind::Composite(probe) => {
                let probe = probe.clone();
                let ctx = ctx.clone();
                let deadline = tokio::time::Instant::now() + timeout;
                run_guarded(timeout, cancel, move |scope| {
                    run_composite(probe, ctx, deadline, scope)
                })
                .await
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    probe = %ctx.name,
                    failure_status = %ctx.failure_status,
                    error = %e,
                    "Probe の実行に失敗しました"
                );
                Outcome::from_error(ctx.failure_status, e)
            }
        };

        outcome.with_duration(started.elapsed())
    }

    fn context(&self, registration: &ProbeRegistration) -> ProbeContext {
        ProbeContext {
            name: registration.name().to_string(),
            tags: registration.tags().clone(),
            failure_status: registration
                .failure_status()
                .unwrap_or(self.config.default_failure_status),
            timeout: registration
                .timeout()
                .unwrap_or(self.config.default_timeout),
        }
    }
}
