//! logwell 공통 크레이트
//!
//! 수집기(`logwell-collector`)와 데몬(`logwell-daemon`)이 공유하는
//! 타입, 에러, 설정, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `logwell.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록
//! - [`types`]: syslog facility/severity 테이블

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogwellError, ServiceError};

// 설정
pub use config::{CollectorSection, GeneralConfig, LogwellConfig, MetricsConfig};

// 도메인 타입
pub use types::{Facility, HealthStatus, Severity};
