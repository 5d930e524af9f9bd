//! 도메인 타입 -- syslog facility/severity 테이블
//!
//! PRI 값은 `facility * 8 + severity` 로 인코딩됩니다.
//! 두 테이블의 이름은 수집기가 기록하는 로그 라인에 그대로 출력됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// syslog facility (0-23)
///
/// 인덱스 순서가 곧 facility 코드입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facility {
    /// 커널 메시지
    Kern,
    /// 사용자 레벨 메시지
    User,
    /// 메일 시스템
    Mail,
    /// 시스템 데몬
    Daemon,
    /// 보안/인증 메시지
    Auth,
    /// syslogd 내부 메시지
    Syslog,
    /// 프린터 서브시스템
    Lpr,
    /// 네트워크 뉴스 서브시스템
    News,
    /// UUCP 서브시스템
    Uucp,
    /// 스케줄러 데몬
    Cron,
    /// 보안/인증 메시지 (비공개)
    AuthPriv,
    /// FTP 데몬
    Ftp,
    /// 시스템 예약 (12)
    System1,
    /// 시스템 예약 (13)
    System2,
    /// 시스템 예약 (14)
    System3,
    /// 시스템 예약 (15)
    System4,
    /// 로컬 용도 0
    Local0,
    /// 로컬 용도 1
    Local1,
    /// 로컬 용도 2
    Local2,
    /// 로컬 용도 3
    Local3,
    /// 로컬 용도 4
    Local4,
    /// 로컬 용도 5
    Local5,
    /// 로컬 용도 6
    Local6,
    /// 로컬 용도 7
    Local7,
}

impl Facility {
    /// facility 테이블 크기
    pub const COUNT: usize = 24;

    const ALL: [Facility; Self::COUNT] = [
        Self::Kern,
        Self::User,
        Self::Mail,
        Self::Daemon,
        Self::Auth,
        Self::Syslog,
        Self::Lpr,
        Self::News,
        Self::Uucp,
        Self::Cron,
        Self::AuthPriv,
        Self::Ftp,
        Self::System1,
        Self::System2,
        Self::System3,
        Self::System4,
        Self::Local0,
        Self::Local1,
        Self::Local2,
        Self::Local3,
        Self::Local4,
        Self::Local5,
        Self::Local6,
        Self::Local7,
    ];

    /// facility 코드에서 변환합니다. 테이블 범위를 벗어나면 `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// facility 코드
    pub fn code(self) -> u32 {
        self as u32
    }

    /// 로그 라인에 출력되는 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Kern => "KERN",
            Self::User => "USER",
            Self::Mail => "MAIL",
            Self::Daemon => "DAEMON",
            Self::Auth => "AUTH",
            Self::Syslog => "SYSLOG",
            Self::Lpr => "LPR",
            Self::News => "NEWS",
            Self::Uucp => "UUCP",
            Self::Cron => "CRON",
            Self::AuthPriv => "AUTHPRIV",
            Self::Ftp => "FTP",
            Self::System1 => "SYSTEM1",
            Self::System2 => "SYSTEM2",
            Self::System3 => "SYSTEM3",
            Self::System4 => "SYSTEM4",
            Self::Local0 => "LOCAL0",
            Self::Local1 => "LOCAL1",
            Self::Local2 => "LOCAL2",
            Self::Local3 => "LOCAL3",
            Self::Local4 => "LOCAL4",
            Self::Local5 => "LOCAL5",
            Self::Local6 => "LOCAL6",
            Self::Local7 => "LOCAL7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:<6}` 같은 폭 지정이 동작하도록 pad 사용
        f.pad(self.name())
    }
}

/// syslog severity (0-7)
///
/// 3비트로 마스킹된 값이므로 항상 테이블 범위 안에 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// 시스템 사용 불가
    Emerg,
    /// 즉시 조치 필요
    Alert,
    /// 치명적 상태
    Crit,
    /// 에러
    Err,
    /// 경고
    Warning,
    /// 정상이지만 주목할 만한 상태
    Notice,
    /// 정보
    Info,
    /// 디버그
    Debug,
}

impl Severity {
    /// severity 테이블 크기
    pub const COUNT: usize = 8;

    const ALL: [Severity; Self::COUNT] = [
        Self::Emerg,
        Self::Alert,
        Self::Crit,
        Self::Err,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// PRI 값의 하위 3비트에서 severity를 추출합니다.
    pub fn from_priority(priority: u32) -> Self {
        Self::ALL[(priority & 0x7) as usize]
    }

    /// severity 코드
    pub fn code(self) -> u32 {
        self as u32
    }

    /// 로그 라인에 출력되는 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Emerg => "EMERG",
            Self::Alert => "ALERT",
            Self::Crit => "CRIT",
            Self::Err => "ERR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// 서비스 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}
