//! 취소 가능한 수신 어댑터
//!
//! 자체 취소 수단이 없는 수신 future를 외부 취소 신호와 경쟁시킵니다.
//! 취소가 먼저 오면 [`Cancelled`]를 반환하며, 원래 future는 drop되어
//! 결과가 버려집니다. 호출자는 이를 재시도 대상이 아닌 종료 조건으로 취급해야 합니다.
//!
//! 수집 루프가 읽는 데이터그램 출처는 [`DatagramSource`]로 추상화되어 있으며,
//! 운영 환경에서는 [`UdpSocket`]을 사용합니다.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// 데이터그램 수신 추상화
pub trait DatagramSource: Send + Sync + 'static {
    /// 데이터그램 하나를 `buf`에 받아 길이와 송신 주소를 반환합니다.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// 수신 중인 로컬 주소
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramSource for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

/// 취소 신호가 수신보다 먼저 도착했음을 나타냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("receive cancelled")]
pub struct Cancelled;

/// 수신 future를 취소 신호와 경쟁시킵니다.
///
/// `token`이 `None`이면 단순히 future를 await합니다.
/// 이미 취소된 토큰이면 future를 poll하지 않고 바로 `Cancelled`를 반환합니다.
pub async fn recv_cancellable<F>(
    fut: F,
    token: Option<&CancellationToken>,
) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    let Some(token) = token else {
        return Ok(fut.await);
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}
