//! Async NETLINK_GENERIC socket on top of `netlink-sys`.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::trace;

use super::error::Result;

/// Large enough for a full split wiphy dump chunk or a scan-result batch.
const RECV_BUF_SIZE: usize = 32768;

pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    seq: AtomicU32,
    /// Port id the kernel bound us to.
    port: u32,
}

fn recv_datagram(socket: &Socket) -> io::Result<Bytes> {
    let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);
    let n = socket.recv(&mut buf, 0)?;
    trace!(bytes = n, "netlink datagram");
    Ok(buf.freeze())
}

impl NetlinkSocket {
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)?;
        socket.set_non_blocking(true)?;

        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;

        // Older kernels reject extended ACK.
        if let Err(e) = socket.set_ext_ack(true) {
            trace!(error = %e, "extended ACK unavailable");
        }

        Ok(Self {
            port: addr.port_number(),
            seq: AtomicU32::new(1),
            fd: AsyncFd::new(socket)?,
        })
    }

    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    /// Join a multicast group by id.
    pub fn join_group(&mut self, group: u32) -> Result<()> {
        self.fd.get_mut().add_membership(group)?;
        Ok(())
    }

    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        self.fd
            .async_io(Interest::WRITABLE, |socket| socket.send(msg, 0))
            .await?;
        Ok(())
    }

    /// Receive one datagram; it may hold several netlink messages.
    pub async fn recv(&self) -> Result<Bytes> {
        Ok(self.fd.async_io(Interest::READABLE, recv_datagram).await?)
    }

    /// Poll-based receive for `Stream` implementations.
    pub fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<Bytes>> {
        loop {
            let mut guard = match self.fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e.into())),
                Poll::Pending => return Poll::Pending,
            };

            if let Ok(result) = guard.try_io(|inner| recv_datagram(inner.get_ref())) {
                return Poll::Ready(result.map_err(Into::into));
            }
        }
    }
}
