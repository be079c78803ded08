use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::composite::SubTargetResult;
use crate::error::ProbeError;
use crate::outcome::Outcome;
use crate::status::HealthStatus;

/// Probe 実行時に渡される登録情報のスナップショット。
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub name: String,
    pub tags: BTreeSet<String>,
    /// 失敗時に報告すべきステータス。
    pub failure_status: HealthStatus,
    /// 実行コアが適用するタイムアウト。
    pub timeout: Duration,
}

impl ProbeContext {
    /// 登録時に指定された失敗ステータスで Outcome を生成する。
    pub fn failure(&self, description: impl Into<String>) -> Outcome {
        Outcome::new(self.failure_status).with_description(description)
    }
}

/// 依存先 1 つの死活を判定する Probe。
///
/// 判定結果として不健全を返す場合は `Ok(ctx.failure(..))` を返す。
/// 予期しないエラーは `Err` で返してよい。実行コアが捕捉して Outcome に変換する。
/// `cancel` が発火したら速やかに I/O を中断すること。中断しない Probe も
/// 実行コア側のタイムアウトで打ち切られる。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    /// 登録名を省略した場合に使われる既定名。
    fn name(&self) -> &str;
    async fn run(&self, ctx: &ProbeContext, cancel: &CancellationToken) -> Result<Outcome, ProbeError>;
}

/// 実行時に列挙されるサブターゲット群を個別に検査する Probe。
///
/// 例: ラベルセレクタに一致するクラスタ上のリソース群。列挙結果は実行ごとに変わりうるため、
/// 実行コアは毎回 `list_targets` を呼び出し、結果をキャッシュしない。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CompositeProbe: Send + Sync {
    fn name(&self) -> &str;
    /// 現時点のサブターゲット ID を列挙する。外部システムの状態を変更してはならない。
    async fn list_targets(&self, cancel: &CancellationToken) -> Result<Vec<String>, ProbeError>;
    async fn check_one(
        &self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<SubTargetResult, ProbeError>;
}
