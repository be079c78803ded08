use chrono::{DateTime, Utc};

/// キャッシュに保持されるクライアントハンドル。
///
/// 同じキーを提示するすべての Probe で共有され、単一の Probe 実行が所有することはない。
#[derive(Debug, Clone)]
pub struct CachedClient<T> {
    pub key: String,
    pub handle: T,
    pub created_at: DateTime<Utc>,
}

impl<T> CachedClient<T> {
    pub fn new(key: impl Into<String>, handle: T) -> Self {
        Self {
            key: key.into(),
            handle,
            created_at: Utc::now(),
        }
    }
}
