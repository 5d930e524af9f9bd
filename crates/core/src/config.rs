//! 설정 관리 -- logwell.toml 파싱 및 런타임 설정
//!
//! [`LogwellConfig`]는 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`LOGWELL_COLLECTOR_PORT=5514` 형식)
//! 3. 설정 파일 (`logwell.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwell_core::error::LogwellError> {
//! use logwell_core::config::LogwellConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogwellConfig::load("logwell.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogwellConfig::parse("[collector]\nport = 5514")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, LogwellError};

/// UDP 데이터그램 최대 크기
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// logwell 통합 설정
///
/// `logwell.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogwellConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// syslog 수집기 설정
    #[serde(default)]
    pub collector: CollectorSection,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogwellConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogwellError> {
        let config = Self::load_unvalidated(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// 파일 + 환경변수까지만 적용하고 검증은 하지 않습니다.
    ///
    /// CLI 오버라이드처럼 이후 단계가 남아 있을 때 사용하며,
    /// 호출자는 마지막 단계 뒤에 [`validate`](Self::validate)를 호출해야 합니다.
    pub async fn load_unvalidated(path: impl AsRef<Path>) -> Result<Self, LogwellError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값으로 파일을 생성한 뒤 로드합니다.
    ///
    /// 최초 실행 시 사용자가 편집할 수 있는 설정 파일을 남겨둡니다.
    pub async fn load_or_create(path: impl AsRef<Path>) -> Result<Self, LogwellError> {
        let path = path.as_ref();
        Self::create_if_missing(path).await?;
        Self::load(path).await
    }

    /// 설정 파일이 없으면 기본값으로 생성합니다. 생성했으면 `true`.
    pub async fn create_if_missing(path: impl AsRef<Path>) -> Result<bool, LogwellError> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await? {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, Self::default().to_toml_string()?).await?;
        info!(path = %path.display(), "config file not found, wrote defaults");
        Ok(true)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogwellError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogwellError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogwellError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogwellError> {
        toml::from_str(toml_str).map_err(|e| {
            LogwellError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 설정을 TOML 문자열로 직렬화합니다.
    pub fn to_toml_string(&self) -> Result<String, LogwellError> {
        toml::to_string_pretty(self).map_err(|e| {
            LogwellError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWELL_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGWELL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWELL_GENERAL_LOG_FORMAT");

        // Collector
        override_string(
            &mut self.collector.bind_address,
            "LOGWELL_COLLECTOR_BIND_ADDRESS",
        );
        override_parsed(&mut self.collector.port, "LOGWELL_COLLECTOR_PORT");
        override_string(
            &mut self.collector.log_directory,
            "LOGWELL_COLLECTOR_LOG_DIRECTORY",
        );
        override_parsed(
            &mut self.collector.rotate_size_mb,
            "LOGWELL_COLLECTOR_ROTATE_SIZE_MB",
        );
        override_parsed(
            &mut self.collector.rotate_count,
            "LOGWELL_COLLECTOR_ROTATE_COUNT",
        );
        override_parsed(
            &mut self.collector.show_remote_date_and_time,
            "LOGWELL_COLLECTOR_SHOW_REMOTE_DATE_AND_TIME",
        );
        override_parsed(
            &mut self.collector.max_datagram_size,
            "LOGWELL_COLLECTOR_MAX_DATAGRAM_SIZE",
        );

        // Metrics
        override_parsed(&mut self.metrics.enabled, "LOGWELL_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGWELL_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "LOGWELL_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogwellError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.collector.port == 0 {
            return Err(invalid("collector.port", "must be 1-65535".to_owned()));
        }

        if self.collector.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(invalid(
                "collector.bind_address",
                format!("'{}' is not an IP address", self.collector.bind_address),
            ));
        }

        if self.collector.log_directory.trim().is_empty() {
            return Err(invalid(
                "collector.log_directory",
                "must not be empty".to_owned(),
            ));
        }

        if self.collector.rotate_size_mb == 0 {
            return Err(invalid(
                "collector.rotate_size_mb",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.collector.rotate_count == 0 {
            return Err(invalid(
                "collector.rotate_count",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.collector.max_datagram_size == 0
            || self.collector.max_datagram_size > MAX_DATAGRAM_SIZE
        {
            return Err(invalid(
                "collector.max_datagram_size",
                format!("must be 1-{MAX_DATAGRAM_SIZE}"),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid(
                "metrics.port",
                "must be 1-65535 when metrics are enabled".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> LogwellError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// syslog 수집기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSection {
    /// 바인드 IP 주소
    pub bind_address: String,
    /// UDP 수신 포트
    pub port: u16,
    /// 로그 디렉토리 (상대 경로면 실행 파일 디렉토리 기준)
    pub log_directory: String,
    /// 회전 임계 크기 (MB)
    pub rotate_size_mb: u64,
    /// 보관할 백업 파일 수
    pub rotate_count: u32,
    /// 송신자가 메시지에 넣은 날짜/시각을 타임스탬프로 사용
    pub show_remote_date_and_time: bool,
    /// 수신 버퍼 크기 (바이트)
    pub max_datagram_size: usize,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_owned(),
            port: 514,
            log_directory: "Log".to_owned(),
            rotate_size_mb: 10,
            rotate_count: 5,
            show_remote_date_and_time: false,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9514,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse env var, ignoring"
            ),
        }
    }
}
