//! 크기 기반 회전 로그 writer
//!
//! 하나의 로그 파일에 라인을 추가하고, 파일이 임계 크기에 도달하면
//! 쓰기 직전에 `file.log → file.log.1 → … → file.log.N` 순으로 회전합니다.
//! 가장 오래된 백업(`.N`)은 다음 회전에서 삭제됩니다.
//!
//! 파일별 잠금이 회전, 추가, flush 전체를 감싸므로 같은 파일에 대한
//! 쓰기와 회전은 절대 섞이지 않습니다. 다른 파일끼리는 잠금을 공유하지 않습니다.

use std::io;
use std::path::{Path, PathBuf};

use logwell_core::metrics as m;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::CollectorError;

/// 라인 종결자
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// 라인 종결자
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// 단일 파일용 회전 writer
#[derive(Debug)]
pub struct RotatingLogWriter {
    path: PathBuf,
    max_bytes: u64,
    max_backups: u32,
    lock: Mutex<()>,
}

impl RotatingLogWriter {
    /// 새 writer를 생성합니다. 파일은 첫 쓰기 때 만들어집니다.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_backups: u32) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            max_backups,
            lock: Mutex::new(()),
        }
    }

    /// 현재(live) 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `index`번째 백업 파일 경로 (`file.log.{index}`)
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// 라인 하나를 추가합니다.
    ///
    /// 실패는 error 레벨로 기록된 뒤 반환됩니다. writer는 실패 후에도 계속 사용할 수 있습니다.
    pub async fn append(&self, line: &str) -> Result<(), CollectorError> {
        let _guard = self.lock.lock().await;

        let result = self.append_locked(line).await;
        match &result {
            Ok(()) => metrics::counter!(m::COLLECTOR_LINES_WRITTEN_TOTAL).increment(1),
            Err(e) => {
                metrics::counter!(m::COLLECTOR_WRITE_ERRORS_TOTAL).increment(1);
                error!(path = %self.path.display(), error = %e, "failed to append log line");
            }
        }
        result
    }

    async fn append_locked(&self, line: &str) -> Result<(), CollectorError> {
        if self.needs_rotation().await.map_err(|e| self.write_error(e))? {
            self.rotate().await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        let mut buf = String::with_capacity(line.len() + LINE_ENDING.len());
        buf.push_str(line);
        buf.push_str(LINE_ENDING);

        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| self.write_error(e))?;
        file.flush().await.map_err(|e| self.write_error(e))?;
        Ok(())
    }

    /// live 파일이 존재하고 크기가 임계값 이상이면 true
    async fn needs_rotation(&self) -> io::Result<bool> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() >= self.max_bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 백업 체인을 한 칸씩 밀어냅니다.
    async fn rotate(&self) -> Result<(), CollectorError> {
        for index in (0..self.max_backups).rev() {
            let source = if index == 0 {
                self.path.clone()
            } else {
                self.backup_path(index)
            };

            if !fs::try_exists(&source)
                .await
                .map_err(|e| self.write_error(e))?
            {
                continue;
            }

            let dest = self.backup_path(index + 1);
            if fs::try_exists(&dest)
                .await
                .map_err(|e| self.write_error(e))?
            {
                fs::remove_file(&dest)
                    .await
                    .map_err(|e| self.write_error(e))?;
            }

            fs::rename(&source, &dest)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        metrics::counter!(m::COLLECTOR_ROTATIONS_TOTAL).increment(1);
        debug!(path = %self.path.display(), backups = self.max_backups, "rotated log file");
        Ok(())
    }

    fn write_error(&self, err: io::Error) -> CollectorError {
        CollectorError::Write {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn appends_terminated_lines() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingLogWriter::new(dir.path().join("host_2024-01-15.log"), 1024, 3);

        writer.append("first").await.unwrap();
        writer.append("second").await.unwrap();

        let content = read(writer.path());
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["first", "second"]);
        assert!(content.ends_with(LINE_ENDING));
    }

    #[tokio::test]
    async fn no_rotation_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingLogWriter::new(dir.path().join("a.log"), 1024, 3);

        writer.append("small").await.unwrap();
        writer.append("small").await.unwrap();
        assert!(!writer.backup_path(1).exists());
    }

    #[tokio::test]
    async fn rotates_once_before_writing_to_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingLogWriter::new(dir.path().join("a.log"), 10, 3);

        // 첫 쓰기 후 파일 크기가 임계값을 넘어섬 (회전은 다음 쓰기 직전)
        writer.append("0123456789").await.unwrap();
        assert!(!writer.backup_path(1).exists());

        writer.append("next").await.unwrap();
        assert_eq!(read(&writer.backup_path(1)).trim_end(), "0123456789");
        assert_eq!(read(writer.path()).trim_end(), "next");
        assert!(!writer.backup_path(2).exists());
    }

    #[tokio::test]
    async fn backup_chain_caps_at_rotate_count() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingLogWriter::new(dir.path().join("a.log"), 1, 2);

        for i in 1..=5 {
            writer.append(&format!("line{i}")).await.unwrap();
        }

        assert_eq!(read(writer.path()).trim_end(), "line5");
        assert_eq!(read(&writer.backup_path(1)).trim_end(), "line4");
        assert_eq!(read(&writer.backup_path(2)).trim_end(), "line3");
        assert!(!writer.backup_path(3).exists());

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 3);
    }

    #[tokio::test]
    async fn failure_is_reported_and_writer_stays_usable() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("missing");
        let writer = RotatingLogWriter::new(nested.join("a.log"), 1024, 1);

        let err = writer.append("lost").await.unwrap_err();
        assert!(matches!(err, CollectorError::Write { .. }));

        std::fs::create_dir(&nested).unwrap();
        writer.append("kept").await.unwrap();
        assert_eq!(read(writer.path()).trim_end(), "kept");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(RotatingLogWriter::new(
            dir.path().join("a.log"),
            u64::MAX,
            1,
        ));

        let mut handles = Vec::new();
        for task in 0..32 {
            let writer = Arc::clone(&writer);
            handles.push(tokio::spawn(async move {
                for n in 0..10 {
                    let line = format!("task{task:02}-{n:02}-{}", "x".repeat(200));
                    writer.append(&line).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = read(writer.path());
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 320);
        for line in lines {
            assert!(line.starts_with("task"));
            assert_eq!(line.len(), "task00-00-".len() + 200);
        }
    }
}
