//! Syslog 패킷 디코더 (RFC 3164 스타일)
//!
//! 원시 데이터그램 텍스트를 송신자별 로그 파일에 기록할 한 줄로 변환합니다.
//!
//! # 출력 형식
//! ```text
//! {timestamp} {SEVERITY:<8} {FACILITY:<6} {message}
//! 2024-01-15 12:00:00.123 INFO     LOCAL0 myhost app: hello world
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use logwell_collector::decoder;
//!
//! let line = decoder::decode("<134>Oct 11 22:14:15 myhost app: hello world", false);
//! assert!(line.is_some());
//! ```

use std::fmt;

use chrono::{DateTime, Local};
use logwell_core::types::{Facility, Severity};

use crate::error::CollectorError;

/// 로컬 수신 시각 타임스탬프 형식 (`yyyy-MM-dd HH:mm:ss.fff`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 메시지 앞에 붙은 원격 타임스탬프 토큰 수 (`Oct 11 22:14:15`)
const REMOTE_TIMESTAMP_TOKENS: usize = 3;

/// 디코딩된 로그 라인
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// 표시용 타임스탬프 (로컬 수신 시각 또는 원격 타임스탬프)
    pub timestamp: String,
    /// severity
    pub severity: Severity,
    /// facility
    pub facility: Facility,
    /// 메시지 본문
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<8} {:<6} {}",
            self.timestamp, self.severity, self.facility, self.message
        )
    }
}

/// 현재 로컬 시각 기준으로 패킷을 디코딩합니다.
///
/// 형식이 잘못된 패킷은 `None`을 반환합니다.
pub fn decode(raw: &str, show_remote_date_and_time: bool) -> Option<LogLine> {
    try_decode(raw, &Local::now(), show_remote_date_and_time).ok()
}

/// 패킷을 디코딩하고, 실패 시 사유를 담은 에러를 반환합니다.
///
/// `received_at`은 원격 타임스탬프를 쓰지 않을 때 표시되는 수신 시각입니다.
pub fn try_decode(
    raw: &str,
    received_at: &DateTime<Local>,
    show_remote_date_and_time: bool,
) -> Result<LogLine, CollectorError> {
    if !raw.starts_with('<') {
        return Err(CollectorError::decode("missing PRI field (expected '<' at offset 0)"));
    }

    let pri_end = raw
        .find('>')
        .ok_or_else(|| CollectorError::decode("unterminated PRI field (missing '>')"))?;

    // 숫자 앞뒤의 공백은 허용 (`< 13>`)
    let pri_str = &raw[1..pri_end];
    let priority: u32 = pri_str
        .trim_ascii()
        .parse()
        .map_err(|_| CollectorError::decode(format!("invalid PRI value: '{pri_str}'")))?;

    let facility = Facility::from_code(priority >> 3).ok_or_else(|| {
        CollectorError::decode(format!(
            "facility {} out of range (0-{})",
            priority >> 3,
            Facility::COUNT - 1
        ))
    })?;
    let severity = Severity::from_priority(priority);

    let body = raw[pri_end + 1..].trim();
    let token_count = body.split_whitespace().count();

    // "Mon dd HH:mm:ss" 접두어가 있다고 보고 앞 3개 토큰을 제거
    let message = if token_count > REMOTE_TIMESTAMP_TOKENS + 1 {
        skip_tokens(body, REMOTE_TIMESTAMP_TOKENS)
    } else {
        body
    };

    let timestamp = if show_remote_date_and_time && token_count > REMOTE_TIMESTAMP_TOKENS {
        body.split_whitespace()
            .take(REMOTE_TIMESTAMP_TOKENS)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        received_at.format(TIMESTAMP_FORMAT).to_string()
    };

    Ok(LogLine {
        timestamp,
        severity,
        facility,
        message: message.to_owned(),
    })
}

/// 앞에서부터 `n`개의 공백 구분 토큰을 건너뛴 나머지를 반환합니다.
///
/// 나머지 부분의 내부 공백은 원문 그대로 유지됩니다.
fn skip_tokens(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest.trim_start()
}
