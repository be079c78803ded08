//! Probe 実行の分離境界。
//!
//! 作業をランタイム上のタスクとして起動し、タスクの完了・タイムアウト・呼び出し元の
//! キャンセルを競わせる。先に解決したものを採用し、負けたタスクは子トークンの
//! キャンセルと abort で打ち切る。打ち切ったタスクを待ち合わせることはない。
//! `run_guarded` の future 自体が破棄された場合も同様にタスクを打ち切る。

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::error::ProbeError;

/// `work` を `timeout` と `parent` のキャンセルで囲んで実行する。
///
/// `work` には `parent` の子トークンが渡される。タイムアウトや `parent` のキャンセルで
/// 打ち切られた場合も子トークンが発火するため、協調的な Probe はそこで I/O を中断できる。
/// タスク内の panic は `ProbeError::Panicked` として返り、呼び出し元には伝播しない。
pub async fn run_guarded<T, F, Fut>(
    timeout: Duration,
    parent: &CancellationToken,
    work: F,
) -> Result<T, ProbeError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ProbeError>> + Send + 'static,
    T: Send + 'static,
{
    if parent.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }

    let scope = parent.child_token();
    let _scope_guard = scope.clone().drop_guard();
    let mut handle = AbortOnDropHandle::new(tokio::spawn(work(scope)));

    let result = tokio::select! {
        biased;
        joined = &mut handle => match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ProbeError::Panicked(panic_message(e.into_panic()))),
            Err(_) => Err(ProbeError::Cancelled),
        },
        () = parent.cancelled() => Err(ProbeError::Cancelled),
        () = tokio::time::sleep(timeout) => Err(ProbeError::Timeout { after: timeout }),
    };

    // スコープのキャンセルとタスクの abort は drop 時に行う。完了済みのタスクには影響しない
    result
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
