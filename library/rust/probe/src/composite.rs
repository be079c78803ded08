use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::guard::run_guarded;
use crate::outcome::Outcome;
use crate::probe::{CompositeProbe, ProbeContext};
use crate::status::HealthStatus;

/// Composite Probe のサブターゲット 1 件の検査結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTargetResult {
    pub target_id: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubTargetResult {
    pub fn ok(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            succeeded: true,
            detail: None,
        }
    }

    pub fn failed(target_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            succeeded: false,
            detail: Some(detail.into()),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "target_id": self.target_id,
            "succeeded": self.succeeded,
            "detail": self.detail,
        })
    }
}

/// 現時点のサブターゲット一覧を取得する。
///
/// 結果は実行ごとに問い合わせ、キャッシュしない。出力を安定させるため ID 順に整列し、
/// 重複を取り除く。列挙そのものの失敗は `ProbeError::ResolveFailed` にまとめる。
pub async fn resolve(
    probe: &dyn CompositeProbe,
    cancel: &CancellationToken,
) -> Result<Vec<String>, ProbeError> {
    let mut targets = probe.list_targets(cancel).await.map_err(|e| match e {
        ProbeError::ResolveFailed(_) | ProbeError::Cancelled => e,
        other => ProbeError::ResolveFailed(other.to_string()),
    })?;
    targets.sort();
    targets.dedup();
    Ok(targets)
}

/// 畳み込みのために外側の期限から差し引く時間の上限。
const MAX_FOLD_MARGIN: Duration = Duration::from_millis(50);

/// サブターゲットに割り当てる時間。外側の期限より必ず手前で打ち切り、
/// 応答しないサブターゲットもそのターゲット単体の失敗として記録できるようにする。
fn sub_target_timeout(deadline: Instant, now: Instant) -> Duration {
    let remaining = deadline.saturating_duration_since(now);
    remaining.saturating_sub((remaining / 10).min(MAX_FOLD_MARGIN))
}

/// サブターゲットを列挙し、1 件ずつ分離して並列に検査した結果を 1 つの Outcome に畳み込む。
///
/// `deadline` は Composite 全体を囲む分離境界の期限。
pub(crate) async fn run_composite(
    probe: Arc<dyn CompositeProbe>,
    ctx: ProbeContext,
    deadline: Instant,
    scope: CancellationToken,
) -> Result<Outcome, ProbeError> {
    let targets = resolve(probe.as_ref(), &scope).await?;
    let timeout = sub_target_timeout(deadline, Instant::now());
    tracing::debug!(
        probe = %ctx.name,
        targets = targets.len(),
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "サブターゲットを検査します"
    );

    let checks: Vec<_> = targets
        .into_iter()
        .map(|target| {
            let probe = probe.clone();
            let scope = &scope;
            async move {
                let id = target.clone();
                let result = run_guarded(timeout, scope, move |sub| async move {
                    probe.check_one(&target, &sub).await
                })
                .await;
                match result {
                    Ok(r) => SubTargetResult {
                        target_id: id,
                        succeeded: r.succeeded,
                        detail: r.detail,
                    },
                    Err(e) => SubTargetResult::failed(id, e.to_string()),
                }
            }
        })
        .collect();
    let results = join_all(checks).await;

    Ok(fold(ctx.failure_status, results))
}

/// サブターゲット結果を集約する。
///
/// 1 件でも失敗があれば `failure_status`、すべて成功なら Healthy。
/// 0 件の場合も Healthy だが、`evaluated = 0` と説明文で全件成功と区別できるようにする。
pub fn fold(failure_status: HealthStatus, mut results: Vec<SubTargetResult>) -> Outcome {
    results.sort_by(|a, b| a.target_id.cmp(&b.target_id));

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.succeeded)
        .map(|r| r.target_id.as_str())
        .collect();

    let outcome = if results.is_empty() {
        Outcome::healthy().with_description("0 targets evaluated")
    } else if failed.is_empty() {
        Outcome::healthy().with_description(format!("all {} targets passed", results.len()))
    } else {
        Outcome::new(failure_status).with_description(format!(
            "resources with failed conditions: {}",
            failed.join(",")
        ))
    };

    let failed_json: Vec<serde_json::Value> = failed.iter().map(|id| (*id).into()).collect();
    let targets_json: Vec<serde_json::Value> = results.iter().map(SubTargetResult::to_json).collect();

    outcome
        .with_data("evaluated", results.len())
        .with_data("failed", failed_json)
        .with_data("targets", targets_json)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[test]
    fn test_sub_target_timeout_ends_before_deadline() {
        let now = Instant::now();
        let timeout = sub_target_timeout(now + Duration::from_millis(100), now);
        assert_eq!(timeout, Duration::from_millis(90));

        let timeout = sub_target_timeout(now + Duration::from_secs(30), now);
        assert_eq!(timeout, Duration::from_secs(30) - MAX_FOLD_MARGIN);
    }

    #[test]
    fn test_sub_target_timeout_after_deadline_is_zero() {
        let now = Instant::now();
        assert_eq!(sub_target_timeout(now, now + Duration::from_millis(5)), Duration::ZERO);
    }

    #[test]
    fn test_fold_reports_failing_targets() {
        let outcome = fold(
            HealthStatus::Unhealthy,
            vec![
                SubTargetResult::ok("c"),
                SubTargetResult::failed("b", "condition Ready=False"),
                SubTargetResult::ok("a"),
            ],
        );

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert_eq!(
            outcome.description.as_deref(),
            Some("resources with failed conditions: b")
        );
        assert_eq!(outcome.data["evaluated"], serde_json::json!(3));
        assert_eq!(outcome.data["failed"], serde_json::json!(["b"]));
        let ids: Vec<&str> = outcome.data["targets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["target_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            outcome.data["targets"][1]["detail"],
            serde_json::json!("condition Ready=False")
        );
    }

    #[test]
    fn test_fold_uses_configured_failure_status() {
        let outcome = fold(
            HealthStatus::Degraded,
            vec![SubTargetResult::failed("x", "down")],
        );
        assert_eq!(outcome.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_fold_all_passed() {
        let outcome = fold(
            HealthStatus::Unhealthy,
            vec![SubTargetResult::ok("a"), SubTargetResult::ok("b")],
        );
        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert_eq!(outcome.description.as_deref(), Some("all 2 targets passed"));
        assert_eq!(outcome.data["evaluated"], serde_json::json!(2));
        assert_eq!(outcome.data["failed"], serde_json::json!([]));
    }

    #[test]
    fn test_fold_empty_is_distinguishable_from_all_passed() {
        let outcome = fold(HealthStatus::Unhealthy, vec![]);
        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert_eq!(outcome.description.as_deref(), Some("0 targets evaluated"));
        assert_eq!(outcome.data["evaluated"], serde_json::json!(0));
    }

    struct Listing(Result<Vec<String>, ProbeError>);

    #[async_trait]
    impl CompositeProbe for Listing {
        fn name(&self) -> &str {
            "listing"
        }
        async fn list_targets(&self, _cancel: &CancellationToken) -> Result<Vec<String>, ProbeError> {
            self.0.clone()
        }
        async fn check_one(
            &self,
            target: &str,
            _cancel: &CancellationToken,
        ) -> Result<SubTargetResult, ProbeError> {
            Ok(SubTargetResult::ok(target))
        }
    }

    #[tokio::test]
    async fn test_resolve_sorts_and_dedups() {
        let probe = Listing(Ok(vec![
            "pod-b".to_string(),
            "pod-a".to_string(),
            "pod-b".to_string(),
        ]));
        let targets = resolve(&probe, &CancellationToken::new()).await.unwrap();
        assert_eq!(targets, vec!["pod-a", "pod-b"]);
    }

    #[tokio::test]
    async fn test_resolve_wraps_listing_errors() {
        let probe = Listing(Err(ProbeError::Connection("apiserver unreachable".to_string())));
        let err = resolve(&probe, &CancellationToken::new()).await.unwrap_err();
        match err {
            ProbeError::ResolveFailed(message) => {
                assert_eq!(message, "connection error: apiserver unreachable");
            }
            other => panic!("ResolveFailed が期待される: {:?}", other),
        }
    }
}
