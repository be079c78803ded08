//! k1s0-probe: 依存先 Probe の実行コア。
//!
//! 名前付きで登録された Probe 群を並列に実行し、Probe ごとのタイムアウト・キャンセル・
//! 障害分離を行ったうえで、最も重いステータスを全体ステータスとする Report にまとめる。
//! 実行時に対象が列挙される Composite Probe はサブターゲットごとに分離して検査し、
//! 失敗したサブターゲットを診断データに残す。

pub mod checks;
pub mod composite;
pub mod config;
pub mod error;
pub mod executor;
pub mod guard;
pub mod outcome;
pub mod probe;
pub mod registration;
pub mod registry;
pub mod report;
pub mod status;

pub use composite::SubTargetResult;
pub use config::ExecutorConfig;
pub use error::{ConfigError, ProbeError, RegistryError};
pub use executor::ProbeExecutor;
pub use outcome::Outcome;
pub use probe::{CompositeProbe, Probe, ProbeContext};
pub use registration::{ProbeKind, ProbeRegistration};
pub use registry::ProbeRegistry;
pub use report::{aggregate, HealthReport, ReportEntry};
pub use status::HealthStatus;

pub use k1s0_resource_cache::{CachedClient, ResourceCache};
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "http")]
pub use checks::http::HttpProbe;

#[cfg(feature = "mock")]
pub use probe::{MockCompositeProbe, MockProbe};
