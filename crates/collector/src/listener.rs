//! UDP syslog 수집 루프
//!
//! 데이터그램 하나마다 다음 순서로 처리합니다.
//!
//! ```text
//! recv (취소 가능) -> UTF-8 (lossy) -> 신원 해석 -> composite key
//!   -> 디코딩 (실패 시 warn 후 다음 패킷) -> writer 조회/생성 -> append 태스크 분기
//! ```
//!
//! 패킷은 수신 순서대로 처리되며, 파일 쓰기는 [`TaskTracker`]로 분기되어
//! 다음 수신을 막지 않습니다. 같은 파일에 대한 순서는 writer 잠금이 보장합니다.
//! 루프가 어떤 경로로 끝나든 진행 중인 쓰기를 기다린 뒤 소켓을 닫습니다.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Local;
use logwell_core::metrics as m;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::config::CollectorConfig;
use crate::decoder;
use crate::error::CollectorError;
use crate::receive::{Cancelled, DatagramSource, recv_cancellable};
use crate::registry::{WriterRegistry, composite_key};
use crate::resolver::{IdentityResolver, ReverseLookup, SystemLookup};

/// UDP syslog 수집기
///
/// 신원 캐시와 writer 레지스트리는 공유 핸들로 받으므로, 서비스가 재시작되어도
/// 같은 인스턴스가 이어서 사용됩니다.
pub struct SyslogUdpCollector<L = SystemLookup, S = UdpSocket> {
    config: CollectorConfig,
    source: S,
    resolver: Arc<IdentityResolver<L>>,
    registry: Arc<WriterRegistry>,
    tracker: TaskTracker,
}

impl SyslogUdpCollector<SystemLookup> {
    /// OS 리졸버를 사용하는 수집기를 바인드합니다.
    pub async fn bind(config: CollectorConfig) -> Result<Self, CollectorError> {
        Self::bind_with_lookup(config, SystemLookup).await
    }
}

impl<L: ReverseLookup> SyslogUdpCollector<L> {
    /// 새 캐시와 레지스트리로 수집기를 바인드합니다.
    pub async fn bind_with_lookup(
        config: CollectorConfig,
        lookup: L,
    ) -> Result<Self, CollectorError> {
        let resolver = Arc::new(IdentityResolver::with_lookup(lookup));
        let registry = Arc::new(WriterRegistry::from_config(&config));
        Self::bind_shared(config, resolver, registry).await
    }

    /// 로그 디렉토리를 만들고 UDP 소켓을 바인드합니다.
    ///
    /// `resolver`와 `registry`는 호출자가 소유한 인스턴스를 그대로 사용합니다.
    pub async fn bind_shared(
        config: CollectorConfig,
        resolver: Arc<IdentityResolver<L>>,
        registry: Arc<WriterRegistry>,
    ) -> Result<Self, CollectorError> {
        tokio::fs::create_dir_all(&config.log_dir)
            .await
            .map_err(|e| CollectorError::Write {
                path: config.log_dir.clone(),
                reason: format!("failed to create log directory: {e}"),
            })?;

        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|e| CollectorError::Bind {
                addr: config.bind_addr.to_string(),
                reason: e.to_string(),
            })?;

        let local_addr = socket.local_addr()?;
        info!(
            addr = %local_addr,
            log_dir = %config.log_dir.display(),
            rotate_size_bytes = config.rotate_size_bytes,
            rotate_count = config.rotate_count,
            show_remote_date_and_time = config.show_remote_date_and_time,
            "UDP syslog collector bound"
        );

        Ok(Self::with_source(config, socket, resolver, registry))
    }
}

impl<L: ReverseLookup, S: DatagramSource> SyslogUdpCollector<L, S> {
    /// 이미 준비된 데이터그램 출처로 수집기를 구성합니다.
    pub fn with_source(
        config: CollectorConfig,
        source: S,
        resolver: Arc<IdentityResolver<L>>,
        registry: Arc<WriterRegistry>,
    ) -> Self {
        Self {
            config,
            source,
            resolver,
            registry,
            tracker: TaskTracker::new(),
        }
    }

    /// 실제 바인드된 주소 (포트 0으로 바인드한 경우 할당된 포트 포함)
    pub fn local_addr(&self) -> Result<SocketAddr, CollectorError> {
        Ok(self.source.local_addr()?)
    }

    /// writer 레지스트리
    pub fn registry(&self) -> Arc<WriterRegistry> {
        Arc::clone(&self.registry)
    }

    /// 수집 루프를 실행합니다.
    ///
    /// 취소되면 `Ok(())`, 예상하지 못한 소켓 에러로 끝나면 `Err`를 반환합니다.
    /// 반환 시점에는 분기된 쓰기가 모두 끝나 있고 소켓은 닫힙니다.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), CollectorError> {
        if cancel.is_cancelled() {
            info!("UDP syslog collector cancelled before start");
            return Ok(());
        }

        info!("UDP syslog collector listening");
        let result = self.receive_loop(&cancel).await;

        if let Err(e) = &result {
            error!(error = %e, "UDP syslog collector stopped on error");
        }

        self.tracker.close();
        if !self.tracker.is_empty() {
            debug!(pending = self.tracker.len(), "waiting for in-flight appends");
        }
        self.tracker.wait().await;

        info!("UDP syslog collector stopped");
        result
    }

    async fn receive_loop(&self, cancel: &CancellationToken) -> Result<(), CollectorError> {
        let mut buf = vec![0u8; self.config.max_datagram_size];

        loop {
            let recv = self.source.recv_from(&mut buf);
            let received = match recv_cancellable(recv, Some(cancel)).await {
                Ok(received) => received,
                Err(Cancelled) => {
                    info!("UDP syslog collector received shutdown signal");
                    return Ok(());
                }
            };

            match received {
                Ok((len, peer)) => self.handle_datagram(&buf[..len], peer, cancel).await,
                // Windows는 이전 송신의 ICMP port unreachable을 recv 에러로 돌려줌
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                    debug!(error = %e, "ignoring connection reset on UDP socket");
                }
                Err(e) => return Err(CollectorError::Io(e)),
            }
        }
    }

    async fn handle_datagram(&self, data: &[u8], peer: SocketAddr, cancel: &CancellationToken) {
        metrics::counter!(m::COLLECTOR_PACKETS_RECEIVED_TOTAL).increment(1);
        trace!(%peer, bytes = data.len(), "received datagram");

        let text = String::from_utf8_lossy(data);
        let identity = self.resolver.resolve(peer.ip(), cancel).await;

        let now = Local::now();
        let key = composite_key(&identity, now.date_naive());

        let line = match decoder::try_decode(&text, &now, self.config.show_remote_date_and_time) {
            Ok(line) => line,
            Err(e) => {
                metrics::counter!(m::COLLECTOR_PACKETS_DROPPED_TOTAL).increment(1);
                warn!(%peer, error = %e, "dropping malformed syslog packet");
                return;
            }
        };

        let writer = self.registry.get_or_create(&key).await;
        let rendered = line.to_string();
        trace!(%peer, key, "dispatching log line");

        self.tracker.spawn(async move {
            // 실패는 writer가 기록함
            let _ = writer.append(&rendered).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::net::IpAddr;
    use std::time::Duration;

    struct NamedLookup(&'static str);

    impl ReverseLookup for NamedLookup {
        async fn lookup(&self, _addr: IpAddr) -> io::Result<String> {
            Ok(self.0.to_owned())
        }
    }

    /// 미리 정한 수신 결과를 차례로 돌려주고, 다 쓰면 영원히 대기하는 출처
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<io::Result<(Vec<u8>, SocketAddr)>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<io::Result<(Vec<u8>, SocketAddr)>>) -> Self {
            Self {
                script: std::sync::Mutex::new(script.into()),
            }
        }
    }

    impl DatagramSource for ScriptedSource {
        async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok((data, peer))) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok((data.len(), peer))
                }
                Some(Err(e)) => Err(e),
                None => std::future::pending().await,
            }
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok("127.0.0.1:514".parse().unwrap())
        }
    }

    fn test_config(dir: &std::path::Path) -> CollectorConfig {
        crate::config::CollectorConfigBuilder::new()
            .bind_addr("127.0.0.1:0".parse().unwrap())
            .log_dir(dir)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn bind_creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("Log");
        let config = test_config(&log_dir);

        let collector = SyslogUdpCollector::bind_with_lookup(config, NamedLookup("h"))
            .await
            .unwrap();
        assert!(log_dir.is_dir());
        assert_ne!(collector.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = crate::config::CollectorConfigBuilder::new()
            .bind_addr(taken.local_addr().unwrap())
            .log_dir(dir.path())
            .build()
            .unwrap();

        let result = SyslogUdpCollector::bind_with_lookup(config, NamedLookup("h")).await;
        assert!(matches!(result, Err(CollectorError::Bind { .. })));
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            SyslogUdpCollector::bind_with_lookup(test_config(dir.path()), NamedLookup("h"))
                .await
                .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_millis(100), collector.run(cancel))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn writes_decoded_line_and_drops_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            SyslogUdpCollector::bind_with_lookup(test_config(dir.path()), NamedLookup("pc1.lan"))
                .await
                .unwrap();
        let addr = collector.local_addr().unwrap();
        let registry = collector.registry();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(collector.run(cancel.clone()));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"not syslog", addr).await.unwrap();
        sender
            .send_to(b"<134>Oct 11 22:14:15 myhost app: hello world", addr)
            .await
            .unwrap();

        let path = dir.path().join(format!(
            "pc1-lan_{}.log",
            Local::now().date_naive().format("%Y-%m-%d")
        ));
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        cancel.cancel();
        task.await.unwrap().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" INFO     LOCAL0 myhost app: hello world"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unexpected_receive_error_ends_loop_after_pending_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let peer: SocketAddr = "10.0.0.7:40000".parse().unwrap();
        let source = ScriptedSource::new(vec![
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
            Ok((b"<13>before the failure".to_vec(), peer)),
            Err(io::Error::from(io::ErrorKind::PermissionDenied)),
            Ok((b"<13>never read".to_vec(), peer)),
        ]);
        let registry = Arc::new(WriterRegistry::from_config(&config));
        let collector = SyslogUdpCollector::with_source(
            config,
            source,
            Arc::new(IdentityResolver::with_lookup(NamedLookup("edge"))),
            Arc::clone(&registry),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            collector.run(CancellationToken::new()),
        )
        .await
        .expect("loop must end on its own");

        match result {
            Err(CollectorError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected io error, got {other:?}"),
        }

        // reset은 무시되고, 에러 전에 받은 라인은 반환 전에 기록됨
        let path = dir.path().join(format!(
            "edge_{}.log",
            Local::now().date_naive().format("%Y-%m-%d")
        ));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("NOTICE   USER   before the failure"));
        assert_eq!(registry.len().await, 1);
    }
}
