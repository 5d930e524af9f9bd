//! 수집 서비스 생명주기
//!
//! [`SyslogService`]는 수집 루프를 백그라운드 태스크로 시작하고 정지합니다.
//! 정지 시 취소 신호를 보낸 뒤 최대 [`SHUTDOWN_GRACE`] 동안 루프 종료를 기다리고,
//! 그 안에 끝나지 않으면 태스크를 abort하여 소켓을 강제로 닫습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logwell_collector::{CollectorConfig, SyslogService};
//!
//! let mut service = SyslogService::new(CollectorConfig::default());
//! service.start().await?;
//! // ...
//! service.stop().await?;
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use logwell_core::error::{LogwellError, ServiceError};
use logwell_core::types::HealthStatus;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::listener::SyslogUdpCollector;
use crate::receive::DatagramSource;
use crate::registry::WriterRegistry;
use crate::resolver::{IdentityResolver, ReverseLookup, SystemLookup};

/// 정지 요청 후 수집 루프 종료를 기다리는 최대 시간
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// 서비스 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// 생성됨, 아직 시작하지 않음
    Idle,
    /// 수집 중
    Running,
    /// 정지됨
    Stopped,
    /// 시작 실패 또는 수집 루프가 스스로 종료됨
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// UDP syslog 수집 서비스
///
/// 신원 캐시와 writer 레지스트리는 서비스가 생성될 때 한 번 만들어지며,
/// 정지 후 다시 시작해도 그대로 유지됩니다.
pub struct SyslogService<L = SystemLookup> {
    config: CollectorConfig,
    state: ServiceState,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), CollectorError>>>,
    local_addr: Option<SocketAddr>,
    resolver: Arc<IdentityResolver<L>>,
    registry: Arc<WriterRegistry>,
}

impl SyslogService<SystemLookup> {
    /// OS 리졸버를 사용하는 서비스를 생성합니다.
    pub fn new(config: CollectorConfig) -> Self {
        Self::with_lookup(config, SystemLookup)
    }
}

impl<L: ReverseLookup> SyslogService<L> {
    /// 지정한 역방향 조회 구현으로 서비스를 생성합니다.
    pub fn with_lookup(config: CollectorConfig, lookup: L) -> Self {
        Self {
            resolver: Arc::new(IdentityResolver::with_lookup(lookup)),
            registry: Arc::new(WriterRegistry::from_config(&config)),
            config,
            state: ServiceState::Idle,
            cancel: CancellationToken::new(),
            task: None,
            local_addr: None,
        }
    }

    /// 소켓을 바인드하고 수집 루프를 시작합니다.
    ///
    /// 바인드에 실패하면 상태가 `Failed`가 되고 에러를 반환합니다.
    pub async fn start(&mut self) -> Result<(), LogwellError> {
        if self.state() == ServiceState::Running {
            return Err(ServiceError::AlreadyRunning.into());
        }

        info!(addr = %self.config.bind_addr, "starting syslog service");

        let bound = SyslogUdpCollector::bind_shared(
            self.config.clone(),
            Arc::clone(&self.resolver),
            Arc::clone(&self.registry),
        )
        .await;
        let collector = match bound {
            Ok(collector) => collector,
            Err(e) => {
                error!(error = %e, "failed to start syslog service");
                self.state = ServiceState::Failed;
                return Err(e.into());
            }
        };

        self.local_addr = Some(collector.local_addr()?);
        self.launch(collector);

        info!("syslog service started");
        Ok(())
    }

    fn launch<S: DatagramSource>(&mut self, collector: SyslogUdpCollector<L, S>) {
        // 이전 실행에서 취소된 토큰은 재사용할 수 없음
        self.cancel = CancellationToken::new();
        self.task = Some(tokio::spawn(collector.run(self.cancel.clone())));
        self.state = ServiceState::Running;
    }

    /// 취소 신호를 보내고 수집 루프 종료를 기다립니다.
    pub async fn stop(&mut self) -> Result<(), LogwellError> {
        if self.state != ServiceState::Running {
            return Err(ServiceError::NotRunning.into());
        }

        info!("stopping syslog service");
        self.cancel.cancel();

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
                Ok(Ok(Ok(()))) => debug!("ingestion loop exited"),
                Ok(Ok(Err(e))) => warn!(error = %e, "ingestion loop had already failed"),
                Ok(Err(e)) => warn!(error = %e, "ingestion task panicked or was cancelled"),
                Err(_) => {
                    warn!(
                        grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                        "ingestion loop did not stop in time, aborting"
                    );
                    task.abort();
                }
            }
        }

        self.state = ServiceState::Stopped;
        info!("syslog service stopped");
        Ok(())
    }

    /// 현재 상태
    ///
    /// 실행 중 수집 루프가 스스로 끝났다면 `Failed`를 반환합니다.
    pub fn state(&self) -> ServiceState {
        match (&self.state, &self.task) {
            (ServiceState::Running, Some(task)) if task.is_finished() => ServiceState::Failed,
            (state, _) => *state,
        }
    }

    /// 바인드된 주소 (시작 전에는 `None`)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 등록된 writer 수
    pub async fn writer_count(&self) -> usize {
        self.registry.len().await
    }

    /// 신원 캐시에 기록된 주소 수
    pub async fn cached_identities(&self) -> usize {
        self.resolver.cache_len().await
    }

    /// 헬스 상태를 반환합니다.
    pub fn health_check(&self) -> HealthStatus {
        match self.state() {
            ServiceState::Running => HealthStatus::Healthy,
            ServiceState::Idle => HealthStatus::Unhealthy("not started".to_owned()),
            ServiceState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            ServiceState::Failed => HealthStatus::Unhealthy("ingestion loop exited".to_owned()),
        }
    }
}
