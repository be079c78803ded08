use std::fmt::Display;
use std::future::Future;

use moka::future::Cache;

use crate::{CachedClient, ResourceCacheError};

/// ResourceCache はキーごとに遅延生成されるクライアントハンドルを保持する。
///
/// moka::future::Cache の `try_get_with` を使用し、同一キーに対する同時呼び出しでは
/// ファクトリが 1 回だけ実行され、後続の呼び出し元は勝者のハンドルを受け取る。
/// ファクトリが失敗した場合はエントリを残さず、次の呼び出しで再生成を試みる。
///
/// プロセス起動時に 1 つ生成して `Arc` で Probe に注入する。テストではテストごとに
/// 独立したインスタンスを生成できる。
pub struct ResourceCache<T> {
    inner: Cache<String, CachedClient<T>>,
}

impl<T> ResourceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// 有効期限・容量上限なしのキャッシュを作成する。
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    /// key に対応するハンドルを返す。存在しなければ factory で生成して登録する。
    pub async fn get_or_create<F, Fut, E>(&self, key: &str, factory: F) -> Result<T, ResourceCacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Send + Sync + 'static,
    {
        let owned_key = key.to_string();
        let init = async move {
            tracing::debug!(key = %owned_key, "リソースを生成します");
            let handle = factory().await?;
            Ok::<_, E>(CachedClient::new(owned_key, handle))
        };

        match self.inner.try_get_with(key.to_string(), init).await {
            Ok(client) => Ok(client.handle),
            Err(e) => {
                tracing::warn!(key, error = %e, "リソースの生成に失敗しました");
                Err(ResourceCacheError::CreateFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// 生成済みのエントリを取得する。未生成の場合は None を返す。
    pub async fn get(&self, key: &str) -> Option<CachedClient<T>> {
        self.inner.get(key).await
    }

    /// key のハンドルを破棄する。エントリが存在した場合は true を返す。
    ///
    /// 接続断を検知した Probe が呼び出し、次回の `get_or_create` で再接続させる。
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.inner.remove(key).await.is_some();
        if removed {
            tracing::info!(key, "リソースを破棄しました");
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// 保持しているエントリ数。保留中の内部処理を反映してから数える。
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// すべてのハンドルを破棄する。プロセス終了時に使用する。
    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

impl<T> Default for ResourceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
