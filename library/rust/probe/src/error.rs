use std::time::Duration;

use k1s0_resource_cache::ResourceCacheError;
use thiserror::Error;

/// Probe 実行中に発生したエラー。
///
/// 実行コアの分離境界でいずれも Outcome に変換され、`execute` の呼び出し元には伝播しない。
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("health check failed: {0}")]
    CheckFailed(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("timeout: probe did not complete within {after:?}")]
    Timeout { after: Duration },
    #[error("cancelled: probe execution was cancelled")]
    Cancelled,
    #[error("probe panicked: {0}")]
    Panicked(String),
    #[error("failed to resolve targets: {0}")]
    ResolveFailed(String),
    #[error(transparent)]
    Resource(#[from] ResourceCacheError),
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// 登録・参照時の構成エラー。登録時点で即座に呼び出し元へ返す。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("probe name must not be empty")]
    EmptyName,
    #[error("probe '{name}' is already registered")]
    DuplicateName { name: String },
    #[error("probe '{name}' is not registered")]
    NotFound { name: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
