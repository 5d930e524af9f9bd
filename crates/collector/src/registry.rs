//! Composite key별 writer 레지스트리
//!
//! 키(`{identity}_{yyyy-MM-dd}`) 하나당 [`RotatingLogWriter`] 하나를 보장합니다.
//! 엔트리는 처음 사용될 때 만들어지고 프로세스 수명 동안 재사용되며 제거되지 않습니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use logwell_core::metrics as m;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::CollectorConfig;
use crate::writer::RotatingLogWriter;

/// 파일 이름에 쓸 수 없는 문자
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// 신원과 날짜로 composite key를 만듭니다.
///
/// 신원의 `.`은 `-`로 바뀝니다 (`pc1.example.com` → `pc1-example-com_2024-01-15`).
pub fn composite_key(identity: &str, date: NaiveDate) -> String {
    format!("{}_{}", identity.replace('.', "-"), date.format("%Y-%m-%d"))
}

/// 키를 파일 시스템에 안전한 이름으로 바꿉니다.
pub fn sanitize_file_name(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// writer 레지스트리
#[derive(Debug)]
pub struct WriterRegistry {
    dir: PathBuf,
    max_bytes: u64,
    max_backups: u32,
    writers: Mutex<HashMap<String, Arc<RotatingLogWriter>>>,
}

impl WriterRegistry {
    /// 새 레지스트리를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64, max_backups: u32) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            max_backups,
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// 수집기 설정의 디렉토리와 회전 설정으로 레지스트리를 생성합니다.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(
            config.log_dir.clone(),
            config.rotate_size_bytes,
            config.rotate_count,
        )
    }

    /// 로그 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 키에 해당하는 writer를 반환하고, 없으면 생성합니다.
    ///
    /// 동시에 처음 호출되어도 키당 writer는 하나만 만들어집니다.
    pub async fn get_or_create(&self, key: &str) -> Arc<RotatingLogWriter> {
        let mut writers = self.writers.lock().await;
        if let Some(writer) = writers.get(key) {
            return Arc::clone(writer);
        }

        let path = self.dir.join(format!("{}.log", sanitize_file_name(key)));
        debug!(key, path = %path.display(), "creating log writer");

        let writer = Arc::new(RotatingLogWriter::new(path, self.max_bytes, self.max_backups));
        writers.insert(key.to_owned(), Arc::clone(&writer));
        metrics::gauge!(m::COLLECTOR_ACTIVE_WRITERS).set(writers.len() as f64);
        writer
    }

    /// 등록된 writer 수
    pub async fn len(&self) -> usize {
        self.writers.lock().await.len()
    }

    /// 등록된 writer가 없으면 true
    pub async fn is_empty(&self) -> bool {
        self.writers.lock().await.is_empty()
    }
}
