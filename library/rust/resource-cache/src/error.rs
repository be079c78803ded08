use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ResourceCacheError {
    #[error("リソースの生成に失敗しました: {key}: {message}")]
    CreateFailed { key: String, message: String },
}
