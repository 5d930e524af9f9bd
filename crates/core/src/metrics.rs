//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 수집기는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 모두 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logwell_`
//! - 접미어: `_total` (counter), 없음 (gauge)

use metrics::{describe_counter, describe_gauge};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (resolved, fallback, cancelled)
pub const LABEL_RESULT: &str = "result";

// ─── Collector 메트릭 ──────────────────────────────────────────────

/// 수신된 데이터그램 수 (counter)
pub const COLLECTOR_PACKETS_RECEIVED_TOTAL: &str = "logwell_collector_packets_received_total";

/// 디코딩 실패로 버려진 데이터그램 수 (counter)
pub const COLLECTOR_PACKETS_DROPPED_TOTAL: &str = "logwell_collector_packets_dropped_total";

/// 파일에 기록된 라인 수 (counter)
pub const COLLECTOR_LINES_WRITTEN_TOTAL: &str = "logwell_collector_lines_written_total";

/// 쓰기/회전 실패 수 (counter)
pub const COLLECTOR_WRITE_ERRORS_TOTAL: &str = "logwell_collector_write_errors_total";

/// 수행된 로그 파일 회전 수 (counter)
pub const COLLECTOR_ROTATIONS_TOTAL: &str = "logwell_collector_rotations_total";

/// 신원 해석 결과 수 (counter, label: result)
pub const COLLECTOR_IDENTITY_LOOKUPS_TOTAL: &str = "logwell_collector_identity_lookups_total";

/// 현재 등록된 writer 수 (gauge)
pub const COLLECTOR_ACTIVE_WRITERS: &str = "logwell_collector_active_writers";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    describe_counter!(
        COLLECTOR_PACKETS_RECEIVED_TOTAL,
        "Total syslog datagrams received"
    );
    describe_counter!(
        COLLECTOR_PACKETS_DROPPED_TOTAL,
        "Datagrams dropped because they could not be decoded"
    );
    describe_counter!(
        COLLECTOR_LINES_WRITTEN_TOTAL,
        "Log lines appended to per-sender files"
    );
    describe_counter!(
        COLLECTOR_WRITE_ERRORS_TOTAL,
        "Failed appends or rotations"
    );
    describe_counter!(COLLECTOR_ROTATIONS_TOTAL, "Log file rotations performed");
    describe_counter!(
        COLLECTOR_IDENTITY_LOOKUPS_TOTAL,
        "Sender identity resolutions by outcome"
    );
    describe_gauge!(
        COLLECTOR_ACTIVE_WRITERS,
        "Rotating writers currently registered"
    );
}
