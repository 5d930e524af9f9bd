//! 에러 타입 -- 도메인별 에러 정의

/// logwell 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogwellError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 수집 서비스 생명주기 에러
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 수집 서비스 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 이미 실행 중
    #[error("service is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("service is not running")]
    NotRunning,

    /// 시작 실패 (바인드 실패 등)
    #[error("service start failed: {0}")]
    StartFailed(String),
}
