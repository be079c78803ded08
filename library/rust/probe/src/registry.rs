use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ExecutorConfig;
use crate::error::RegistryError;
use crate::executor::ProbeExecutor;
use crate::outcome::Outcome;
use crate::registration::ProbeRegistration;
use crate::report::HealthReport;

/// ProbeRegistry は登録済み Probe を保持し、実行コアへ委譲する。
///
/// 名前の重複・空文字は登録時点でエラーにする。実行時に構成エラーが発生することはない。
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    registrations: Vec<Arc<ProbeRegistration>>,
    index: HashMap<String, usize>,
    executor: ProbeExecutor,
}

impl ProbeRegistry {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            registrations: vec![],
            index: HashMap::new(),
            executor: ProbeExecutor::new(config),
        }
    }

    pub fn register(&mut self, registration: ProbeRegistration) -> Result<(), RegistryError> {
        let name = registration.name();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }

        tracing::debug!(
            probe = %name,
            composite = registration.is_composite(),
            "Probe を登録しました"
        );
        self.index.insert(name.to_string(), self.registrations.len());
        self.registrations.push(Arc::new(registration));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ProbeRegistration>> {
        self.index.get(name).map(|&i| &self.registrations[i])
    }

    /// 登録順の Probe 名一覧。
    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn executor(&self) -> &ProbeExecutor {
        &self.executor
    }

    /// すべての Probe を実行する。
    pub async fn execute(&self, cancel: &CancellationToken) -> HealthReport {
        if self.registrations.is_empty() {
            tracing::warn!("Probe が 1 件も登録されていません。Healthy を返しますが構成を確認してください");
        }
        self.executor.execute(&self.registrations, cancel).await
    }

    /// predicate を満たす Probe のみ実行する。Report 内の順序は登録順のまま。
    pub async fn execute_filtered<P>(&self, predicate: P, cancel: &CancellationToken) -> HealthReport
    where
        P: Fn(&ProbeRegistration) -> bool,
    {
        let selected: Vec<Arc<ProbeRegistration>> = self
            .registrations
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        if selected.is_empty() {
            tracing::warn!("条件に一致する Probe がありません");
        }
        self.executor.execute(&selected, cancel).await
    }

    /// 指定タグを持つ Probe のみ実行する（例: "live" / "ready"）。
    pub async fn execute_tagged(&self, tag: &str, cancel: &CancellationToken) -> HealthReport {
        self.execute_filtered(|r| r.has_tag(tag), cancel).await
    }

    /// 名前を指定して 1 件だけ再実行する。未登録の名前はエラーを返し、レジストリは変更しない。
    pub async fn execute_one(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome, RegistryError> {
        let registration = self.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;
        Ok(self.executor.execute_one(registration, cancel).await)
    }
}
