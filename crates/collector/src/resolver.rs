//! 송신자 신원 해석기
//!
//! 송신 IP 주소를 사람이 읽을 수 있는 신원(호스트명)으로 변환합니다.
//!
//! - 캐시를 먼저 확인하고, 없으면 역방향 DNS 조회를 별도 태스크로 시작합니다.
//! - 조회와 취소 신호 중 먼저 끝나는 쪽을 따릅니다.
//! - 취소, 조회 실패 모두 주소 기반 대체 신원(`192_168_1_50`)을 캐시하고 반환합니다.
//! - 취소된 조회 태스크는 강제 종료하지 않고 버려지며, 결과는 무시됩니다.
//!
//! 캐시 엔트리는 프로세스 수명 동안 유지되며 만료되거나 제거되지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use logwell_core::metrics as m;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// 역방향 조회 추상화
///
/// 운영 환경에서는 [`SystemLookup`]을, 테스트에서는 mock 구현을 사용합니다.
pub trait ReverseLookup: Send + Sync + 'static {
    /// 주소에 대한 호스트명을 조회합니다.
    fn lookup(&self, addr: IpAddr) -> impl Future<Output = io::Result<String>> + Send;
}

/// OS 리졸버(`getnameinfo`)를 사용하는 역방향 조회
///
/// 블로킹 호출이므로 tokio 블로킹 풀에서 실행됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl ReverseLookup for SystemLookup {
    async fn lookup(&self, addr: IpAddr) -> io::Result<String> {
        let name = tokio::task::spawn_blocking(move || {
            dns_lookup::lookup_addr(&addr).map_err(io::Error::from)
        })
        .await
        .map_err(io::Error::other)??;

        // PTR 레코드가 없으면 getnameinfo가 숫자 주소를 그대로 돌려줌
        if name.parse::<IpAddr>().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no PTR record for {addr}"),
            ));
        }
        Ok(name)
    }
}

/// 주소 기반 대체 신원을 만듭니다 (`.` → `_`).
pub fn fallback_identity(addr: &IpAddr) -> String {
    addr.to_string().replace('.', "_")
}

/// 캐시를 갖춘 신원 해석기
pub struct IdentityResolver<L = SystemLookup> {
    lookup: Arc<L>,
    cache: Mutex<HashMap<IpAddr, String>>,
}

impl IdentityResolver<SystemLookup> {
    /// OS 리졸버를 사용하는 해석기를 생성합니다.
    pub fn new() -> Self {
        Self::with_lookup(SystemLookup)
    }
}

impl Default for IdentityResolver<SystemLookup> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ReverseLookup> IdentityResolver<L> {
    /// 지정한 조회 구현으로 해석기를 생성합니다.
    pub fn with_lookup(lookup: L) -> Self {
        Self {
            lookup: Arc::new(lookup),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 주소의 신원을 해석합니다.
    ///
    /// 실패하지 않으며, 취소 신호가 설정되면 조회 완료를 기다리지 않고 바로 반환합니다.
    pub async fn resolve(&self, addr: IpAddr, cancel: &CancellationToken) -> String {
        if let Some(hit) = self.cache.lock().await.get(&addr) {
            trace!(%addr, identity = %hit, "identity cache hit");
            return hit.clone();
        }

        if cancel.is_cancelled() {
            trace!(%addr, "identity lookup skipped, shutdown in progress");
            return self.remember(addr, fallback_identity(&addr), "cancelled").await;
        }

        let lookup = Arc::clone(&self.lookup);
        let mut task = tokio::spawn(async move { lookup.lookup(addr).await });

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            joined = &mut task => Some(joined),
        };

        match joined {
            None => {
                // JoinHandle을 drop하면 태스크는 분리되어 계속 실행되고 결과는 버려짐
                drop(task);
                trace!(%addr, "identity lookup cancelled, using fallback");
                self.remember(addr, fallback_identity(&addr), "cancelled").await
            }
            Some(Ok(Ok(name))) => {
                trace!(%addr, identity = %name, "resolved identity");
                self.remember(addr, name, "resolved").await
            }
            Some(Ok(Err(e))) => {
                trace!(%addr, error = %e, "could not resolve identity, using fallback");
                self.remember(addr, fallback_identity(&addr), "fallback").await
            }
            Some(Err(e)) => {
                trace!(%addr, error = %e, "identity lookup task failed, using fallback");
                self.remember(addr, fallback_identity(&addr), "fallback").await
            }
        }
    }

    /// 캐시된 신원을 조회합니다.
    pub async fn cached(&self, addr: &IpAddr) -> Option<String> {
        self.cache.lock().await.get(addr).cloned()
    }

    /// 캐시된 주소 수를 반환합니다.
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// 캐시에 기록합니다. 이미 값이 있으면 먼저 기록된 값을 유지합니다.
    async fn remember(&self, addr: IpAddr, identity: String, result: &'static str) -> String {
        metrics::counter!(m::COLLECTOR_IDENTITY_LOOKUPS_TOTAL, m::LABEL_RESULT => result)
            .increment(1);
        self.cache
            .lock()
            .await
            .entry(addr)
            .or_insert(identity)
            .clone()
    }
}
