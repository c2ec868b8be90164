//! Transport boundary and the production nl80211 transport.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, trace, warn};

use super::packet::Nl80211Packet;
use super::{NL80211_GENL_NAME, NL80211_GENL_VERSION, NL80211_MULTICAST_GROUPS};
use crate::netlink::genl::{FamilyInfo, GenlConnection};
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};
use crate::netlink::{Error, MessageIter, NetlinkSocket, Result};

/// Receiver of asynchronously arriving nl80211 packets.
pub trait EventListener: Send + Sync {
    fn on_event(&self, packet: &Nl80211Packet);
}

/// Request/reply exchange with the kernel.
///
/// Each call carries one request and resolves once the kernel has answered
/// it completely. Kernel rejections come back as [`Error::Kernel`] so they
/// stay distinguishable from socket failures.
pub trait Transport {
    /// Send a request and collect its replies up to the ACK.
    fn send_request(
        &self,
        packet: Nl80211Packet,
    ) -> impl Future<Output = Result<Vec<Nl80211Packet>>> + Send;

    /// Send a dump request and collect every reply up to `NLMSG_DONE`.
    fn send_dump(
        &self,
        packet: Nl80211Packet,
    ) -> impl Future<Output = Result<Vec<Nl80211Packet>>> + Send;

    /// Send a request that only expects an ACK.
    fn send_ack(&self, packet: Nl80211Packet) -> impl Future<Output = Result<()>> + Send;

    /// Register a listener for multicast packets.
    fn register_event_listener(&self, listener: Arc<dyn EventListener>);
}

/// nl80211 over Generic Netlink sockets.
///
/// Requests go through one socket; a second socket joins the nl80211
/// multicast groups and is drained by [`run_events`](Self::run_events).
pub struct Nl80211Transport {
    conn: GenlConnection,
    events: NetlinkSocket,
    family: FamilyInfo,
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl Nl80211Transport {
    /// Resolve the nl80211 family and join its multicast groups.
    pub async fn new() -> Result<Self> {
        let conn = GenlConnection::new()?;
        let family = conn.get_family(NL80211_GENL_NAME).await?;

        let mut events = NetlinkSocket::new()?;
        for name in NL80211_MULTICAST_GROUPS {
            match family.group(name) {
                Some(group) => {
                    events.join_group(group)?;
                    debug!(group = name, id = group, "joined nl80211 multicast group");
                }
                None => debug!(group = name, "nl80211 multicast group not offered"),
            }
        }

        Ok(Self {
            conn,
            events,
            family,
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn family_id(&self) -> u16 {
        self.family.id
    }

    /// Stream of nl80211 multicast packets.
    pub fn events(&self) -> EventStream<'_> {
        EventStream {
            socket: &self.events,
            family_id: self.family.id,
            pending: VecDeque::new(),
        }
    }

    /// Deliver multicast packets to the registered listeners until the
    /// event socket fails.
    ///
    /// Receive-buffer overruns lose events but are not fatal.
    pub async fn run_events(&self) -> Result<()> {
        let mut stream = self.events();
        while let Some(item) = stream.next().await {
            match item {
                Ok(packet) => self.deliver(&packet),
                Err(Error::Io(e)) if e.raw_os_error() == Some(libc::ENOBUFS) => {
                    warn!("nl80211 event socket overrun, events were lost");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn deliver(&self, packet: &Nl80211Packet) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_event(packet);
        }
    }

    async fn exchange(&self, packet: Nl80211Packet, flags: u16) -> Result<Vec<Nl80211Packet>> {
        debug!(cmd = packet.cmd(), attrs = packet.attrs().len(), "nl80211 request");
        let builder = packet.to_message(self.family.id, flags, NL80211_GENL_VERSION);
        let replies = self.conn.transact(builder).await?;
        replies.iter().map(|p| Nl80211Packet::parse(p)).collect()
    }
}

impl Transport for Nl80211Transport {
    async fn send_request(&self, packet: Nl80211Packet) -> Result<Vec<Nl80211Packet>> {
        self.exchange(packet, NLM_F_REQUEST | NLM_F_ACK).await
    }

    async fn send_dump(&self, packet: Nl80211Packet) -> Result<Vec<Nl80211Packet>> {
        self.exchange(packet, NLM_F_REQUEST | NLM_F_DUMP).await
    }

    async fn send_ack(&self, packet: Nl80211Packet) -> Result<()> {
        self.exchange(packet, NLM_F_REQUEST | NLM_F_ACK).await?;
        Ok(())
    }

    fn register_event_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

/// Stream of multicast packets read from the event socket.
///
/// Messages from other families are skipped; an nl80211 message whose
/// attributes cannot be decoded is logged and dropped.
pub struct EventStream<'a> {
    socket: &'a NetlinkSocket,
    family_id: u16,
    pending: VecDeque<Nl80211Packet>,
}

impl EventStream<'_> {
    fn queue(&mut self, data: &[u8]) {
        for item in MessageIter::new(data) {
            let (header, payload) = match item {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "bad framing on nl80211 event socket");
                    return;
                }
            };

            if header.nlmsg_type != self.family_id {
                trace!(nlmsg_type = header.nlmsg_type, "skipping non-nl80211 message");
                continue;
            }

            match Nl80211Packet::parse(payload) {
                Ok(packet) => self.pending.push_back(packet),
                Err(e) => warn!(error = %e, "dropping undecodable nl80211 event"),
            }
        }
    }
}

impl Stream for EventStream<'_> {
    type Item = Result<Nl80211Packet>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(packet) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(packet)));
            }

            match this.socket.poll_recv(cx) {
                Poll::Ready(Ok(data)) => this.queue(&data),
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
