use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::probe::{CompositeProbe, Probe};
use crate::status::HealthStatus;

/// 登録された Probe の種別。
#[derive(Clone)]
pub enum ProbeKind {
    Single(Arc<dyn Probe>),
    Composite(Arc<dyn CompositeProbe>),
}

/// 名前・タグ・失敗ステータス・タイムアウトを伴う Probe の登録。
///
/// ビルダーメソッドで組み立て、レジストリへ登録した後は変更できない。
#[derive(Clone)]
pub struct ProbeRegistration {
    name: String,
    tags: BTreeSet<String>,
    failure_status: Option<HealthStatus>,
    timeout: Option<Duration>,
    kind: ProbeKind,
}

impl ProbeRegistration {
    /// 単一 Probe を登録する。名前は Probe の既定名になる。
    pub fn new(probe: impl Probe + 'static) -> Self {
        Self::from_probe(Arc::new(probe))
    }

    pub fn from_probe(probe: Arc<dyn Probe>) -> Self {
        Self::with_kind(probe.name().to_string(), ProbeKind::Single(probe))
    }

    /// Composite Probe を登録する。名前は Probe の既定名になる。
    pub fn composite(probe: impl CompositeProbe + 'static) -> Self {
        Self::from_composite(Arc::new(probe))
    }

    pub fn from_composite(probe: Arc<dyn CompositeProbe>) -> Self {
        Self::with_kind(probe.name().to_string(), ProbeKind::Composite(probe))
    }

    fn with_kind(name: String, kind: ProbeKind) -> Self {
        Self {
            name,
            tags: BTreeSet::new(),
            failure_status: None,
            timeout: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// 失敗時に報告するステータス。未指定なら実行コアの既定値（Unhealthy）を使う。
    #[must_use]
    pub fn with_failure_status(mut self, status: HealthStatus) -> Self {
        self.failure_status = Some(status);
        self
    }

    /// この Probe 専用のタイムアウト。未指定なら実行コアの既定値を使う。
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn failure_status(&self) -> Option<HealthStatus> {
        self.failure_status
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn kind(&self) -> &ProbeKind {
        &self.kind
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, ProbeKind::Composite(_))
    }
}

impl fmt::Debug for ProbeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistration")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("failure_status", &self.failure_status)
            .field("timeout", &self.timeout)
            .field("composite", &self.is_composite())
            .finish()
    }
}
