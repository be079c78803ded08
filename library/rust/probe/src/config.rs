use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::status::HealthStatus;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 実行コアのプロセス共通設定。
///
/// 個々の登録でタイムアウト・失敗ステータスが省略された場合に使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub default_timeout: Duration,
    pub default_failure_status: HealthStatus,
}

impl ExecutorConfig {
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_default_failure_status(mut self, status: HealthStatus) -> Self {
        self.default_failure_status = status;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            default_failure_status: HealthStatus::Unhealthy,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    probe: ProbeSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProbeSection {
    default_timeout_ms: u64,
    default_failure_status: HealthStatus,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            default_failure_status: HealthStatus::Unhealthy,
        }
    }
}

/// YAML ファイルを読み込み ExecutorConfig を返す。読み込み後にバリデーションを行う。
pub fn load(path: impl AsRef<Path>) -> Result<ExecutorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

/// YAML 文字列から ExecutorConfig を生成する。`probe` セクションが無い場合は既定値を使う。
pub fn from_yaml_str(content: &str) -> Result<ExecutorConfig, ConfigError> {
    let file: ConfigFile = serde_yaml::from_str(content)?;
    let config = ExecutorConfig {
        default_timeout: Duration::from_millis(file.probe.default_timeout_ms),
        default_failure_status: file.probe.default_failure_status,
    };
    validate(&config)?;
    Ok(config)
}

/// 設定値のバリデーション。
pub fn validate(config: &ExecutorConfig) -> Result<(), ConfigError> {
    if config.default_timeout.is_zero() {
        return Err(ConfigError::Validation(
            "probe.default_timeout_ms must be > 0".into(),
        ));
    }
    if config.default_failure_status == HealthStatus::Healthy {
        return Err(ConfigError::Validation(
            "probe.default_failure_status must be Degraded or Unhealthy".into(),
        ));
    }
    Ok(())
}
