//! 수집기 설정
//!
//! [`CollectorConfig`]는 core의 [`CollectorSection`](logwell_core::config::CollectorSection)을
//! 수집기가 실행 중에 사용하는 불변 값으로 변환한 것입니다.
//! 회전 임계값은 바이트로, 로그 디렉토리는 절대 경로로 해석됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use logwell_core::config::LogwellConfig;
//! use logwell_collector::config::CollectorConfig;
//!
//! let core_config = LogwellConfig::default();
//! let config = CollectorConfig::from_core(&core_config.collector)?;
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use logwell_core::config::{CollectorSection, MAX_DATAGRAM_SIZE};

use crate::error::CollectorError;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 수집기 런타임 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// UDP 바인드 주소
    pub bind_addr: SocketAddr,
    /// 로그 파일 디렉토리 (절대 경로)
    pub log_dir: PathBuf,
    /// 회전 임계 크기 (바이트)
    pub rotate_size_bytes: u64,
    /// 보관할 백업 파일 수
    pub rotate_count: u32,
    /// 송신자가 넣은 날짜/시각을 타임스탬프로 사용
    pub show_remote_date_and_time: bool,
    /// 수신 버퍼 크기 (바이트)
    pub max_datagram_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 514),
            log_dir: resolve_log_dir("Log"),
            rotate_size_bytes: 10 * BYTES_PER_MB,
            rotate_count: 5,
            show_remote_date_and_time: false,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl CollectorConfig {
    /// core 설정 섹션에서 수집기 설정을 생성합니다.
    pub fn from_core(core: &CollectorSection) -> Result<Self, CollectorError> {
        let ip: IpAddr = core
            .bind_address
            .parse()
            .map_err(|_| CollectorError::Config {
                field: "bind_address".to_owned(),
                reason: format!("'{}' is not an IP address", core.bind_address),
            })?;

        let config = Self {
            bind_addr: SocketAddr::new(ip, core.port),
            log_dir: resolve_log_dir(&core.log_directory),
            rotate_size_bytes: core.rotate_size_mb.saturating_mul(BYTES_PER_MB),
            rotate_count: core.rotate_count,
            show_remote_date_and_time: core.show_remote_date_and_time,
            max_datagram_size: core.max_datagram_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.rotate_size_bytes == 0 {
            return Err(CollectorError::Config {
                field: "rotate_size_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.rotate_count == 0 {
            return Err(CollectorError::Config {
                field: "rotate_count".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_datagram_size == 0 || self.max_datagram_size > MAX_DATAGRAM_SIZE {
            return Err(CollectorError::Config {
                field: "max_datagram_size".to_owned(),
                reason: format!("must be 1-{MAX_DATAGRAM_SIZE}"),
            });
        }

        Ok(())
    }
}

/// 로그 디렉토리 경로를 해석합니다.
///
/// 절대 경로는 그대로 사용하고, 상대 경로는 실행 파일이 있는 디렉토리 기준으로
/// 해석합니다. 실행 파일 경로를 알 수 없으면 현재 디렉토리 기준 상대 경로가 됩니다.
pub fn resolve_log_dir(dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        Some(base) => base.join(path),
        None => path.to_path_buf(),
    }
}

/// 수집기 설정 빌더
#[derive(Default)]
pub struct CollectorConfigBuilder {
    config: CollectorConfig,
}

impl CollectorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 바인드 주소를 설정합니다.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// 로그 디렉토리를 설정합니다.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    /// 회전 임계 크기(바이트)를 설정합니다.
    pub fn rotate_size_bytes(mut self, bytes: u64) -> Self {
        self.config.rotate_size_bytes = bytes;
        self
    }

    /// 백업 파일 수를 설정합니다.
    pub fn rotate_count(mut self, count: u32) -> Self {
        self.config.rotate_count = count;
        self
    }

    /// 원격 타임스탬프 사용 여부를 설정합니다.
    pub fn show_remote_date_and_time(mut self, enabled: bool) -> Self {
        self.config.show_remote_date_and_time = enabled;
        self
    }

    /// 설정을 검증하고 `CollectorConfig`를 생성합니다.
    pub fn build(self) -> Result<CollectorConfig, CollectorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
