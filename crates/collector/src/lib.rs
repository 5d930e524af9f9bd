//! logwell UDP syslog 수집기
//!
//! UDP로 들어오는 syslog 데이터그램을 디코딩하여 송신자별, 날짜별
//! 로그 파일에 기록합니다. 파일은 크기 기준으로 회전합니다.
//!
//! # 모듈 구성
//!
//! - [`decoder`]: `<PRI>` 헤더 파싱 및 로그 라인 생성
//! - [`resolver`]: 송신 주소 → 신원(역방향 DNS, 캐시, 취소 시 대체값)
//! - [`writer`]: 크기 기반 회전 로그 writer
//! - [`registry`]: composite key별 writer 레지스트리
//! - [`receive`]: 취소 가능한 수신 어댑터, 데이터그램 출처 추상화
//! - [`listener`]: UDP 수집 루프
//! - [`service`]: 시작/정지 생명주기 관리
//! - [`config`]: 수집기 런타임 설정
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! UdpSocket -> recv_cancellable -> IdentityResolver -> decoder -> WriterRegistry -> RotatingLogWriter
//!                   |                    |                              |
//!            CancellationToken     PTR lookup + cache        {identity}_{yyyy-MM-dd}.log
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod listener;
pub mod receive;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod writer;

// --- 주요 타입 re-export ---

// 서비스
pub use service::{SHUTDOWN_GRACE, ServiceState, SyslogService};

// 설정
pub use config::{CollectorConfig, CollectorConfigBuilder};

// 에러
pub use error::CollectorError;

// 수집 파이프라인 구성 요소
pub use decoder::{LogLine, decode};
pub use listener::SyslogUdpCollector;
pub use receive::{Cancelled, DatagramSource, recv_cancellable};
pub use registry::{WriterRegistry, composite_key, sanitize_file_name};
pub use resolver::{IdentityResolver, ReverseLookup, SystemLookup, fallback_identity};
pub use writer::RotatingLogWriter;
