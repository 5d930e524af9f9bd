//! 수집기 에러 타입
//!
//! [`CollectorError`]는 수집기 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<CollectorError> for LogwellError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use std::path::PathBuf;

use logwell_core::error::{LogwellError, ServiceError};

/// 수집기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// 패킷 디코딩 실패 (PRI 헤더 누락, 범위 초과 등)
    #[error("decode error: {reason}")]
    Decode {
        /// 실패 사유
        reason: String,
    },

    /// UDP 소켓 바인드 실패
    #[error("bind error: {addr}: {reason}")]
    Bind {
        /// 바인드 주소
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 로그 파일 쓰기/회전 실패
    #[error("write error: {}: {reason}", path.display())]
    Write {
        /// 대상 파일 경로
        path: PathBuf,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

impl From<CollectorError> for LogwellError {
    fn from(err: CollectorError) -> Self {
        LogwellError::Service(ServiceError::StartFailed(err.to_string()))
    }
}
