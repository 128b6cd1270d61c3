//! Ethtool notifications from the `monitor` multicast group.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio_stream::Stream;

use super::connection::{
    header_dev_name, parse_channels, parse_coalesce, parse_msglvl, parse_pause, parse_rings,
};
use super::{ETHTOOL_A_HEADER, EthtoolLinkmodesAttr, EthtoolMsg};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, check_attrs, get};
use crate::netlink::connection::Connection;
use crate::netlink::genl::GenlMsgHdr;
use crate::netlink::message::MessageIter;
use crate::netlink::protocol::Ethtool;
use crate::types::{Channels, Coalesce, Duplex, MsgLevel, Pause, Rings};

/// One configuration change reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthtoolEvent {
    /// Device the change applies to.
    pub ifname: Option<String>,
    #[serde(flatten)]
    pub change: EventKind,
}

/// What changed.
///
/// Families whose notifications only make sense with kernel string sets
/// (features, private flags, WoL modes) are reported without a payload;
/// query the device for the new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    LinkInfo,
    LinkModes {
        speed: Option<u32>,
        duplex: Option<Duplex>,
        autoneg: Option<bool>,
    },
    MsgLevel(MsgLevel),
    Wol,
    Features,
    PrivFlags,
    Rings(Rings),
    Channels(Channels),
    Coalesce(Coalesce),
    Pause(Pause),
    Eee,
    Fec,
    Other { cmd: u8 },
}

/// Stream of notifications on a subscribed connection.
///
/// Created by [`Connection::events`]. Messages that fail to parse are
/// logged and skipped; socket errors end up in the stream.
pub struct EthtoolEvents<'a> {
    conn: &'a Connection<Ethtool>,
    pending: VecDeque<EthtoolEvent>,
}

impl Connection<Ethtool> {
    /// Notifications received after [`subscribe`](Self::subscribe).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use nicctl::netlink::{Connection, Ethtool};
    /// use tokio_stream::StreamExt;
    ///
    /// # async fn example() -> nicctl::Result<()> {
    /// let mut conn = Connection::<Ethtool>::new_async().await?;
    /// conn.subscribe()?;
    ///
    /// let mut events = conn.events();
    /// while let Some(event) = events.next().await {
    ///     println!("{:?}", event?);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn events(&self) -> EthtoolEvents<'_> {
        EthtoolEvents {
            conn: self,
            pending: VecDeque::new(),
        }
    }
}

impl Stream for EthtoolEvents<'_> {
    type Item = Result<EthtoolEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let family = this.conn.state().family.id;

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match this.conn.socket().poll_recv(cx) {
                Poll::Ready(Ok(data)) => this.pending.extend(parse_events(&data, family)),
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Parse every ethtool notification in a datagram, skipping bad ones.
fn parse_events(data: &[u8], family: u16) -> Vec<EthtoolEvent> {
    let mut events = Vec::new();
    for msg in MessageIter::new(data) {
        let (header, payload) = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "malformed netlink message in notification");
                break;
            }
        };
        if header.nlmsg_type != family {
            continue;
        }
        match parse_event(payload) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(error = %e, "skipping malformed ethtool notification"),
        }
    }
    events
}

fn parse_event(payload: &[u8]) -> Result<EthtoolEvent> {
    let (genl, data) = GenlMsgHdr::split(payload)
        .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
    let cmd = genl.cmd;
    check_attrs(data)?;

    let mut ifname = None;
    for (kind, attr) in AttrIter::new(data) {
        if kind == ETHTOOL_A_HEADER {
            ifname = header_dev_name(attr)?;
        }
    }

    let change = match EthtoolMsg::from_u8(cmd) {
        Some(EthtoolMsg::LinkinfoNtf) => EventKind::LinkInfo,
        Some(EthtoolMsg::LinkmodesNtf) => parse_link_modes(data)?,
        Some(EthtoolMsg::DebugNtf) => EventKind::MsgLevel(parse_msglvl(data)?),
        Some(EthtoolMsg::WolNtf) => EventKind::Wol,
        Some(EthtoolMsg::FeaturesNtf) => EventKind::Features,
        Some(EthtoolMsg::PrivflagsNtf) => EventKind::PrivFlags,
        Some(EthtoolMsg::RingsNtf) => EventKind::Rings(parse_rings(data)?),
        Some(EthtoolMsg::ChannelsNtf) => EventKind::Channels(parse_channels(data)?),
        Some(EthtoolMsg::CoalesceNtf) => EventKind::Coalesce(parse_coalesce(data)?),
        Some(EthtoolMsg::PauseNtf) => EventKind::Pause(parse_pause(data)?),
        Some(EthtoolMsg::EeeNtf) => EventKind::Eee,
        Some(EthtoolMsg::FecNtf) => EventKind::Fec,
        _ => EventKind::Other { cmd },
    };

    Ok(EthtoolEvent { ifname, change })
}

fn parse_link_modes(data: &[u8]) -> Result<EventKind> {
    let mut speed = None;
    let mut duplex = None;
    let mut autoneg = None;
    for (kind, payload) in AttrIter::new(data) {
        match kind {
            t if t == EthtoolLinkmodesAttr::Speed as u16 => {
                speed = Some(get::u32_ne(payload)?).filter(|s| *s != u32::MAX && *s != 0);
            }
            t if t == EthtoolLinkmodesAttr::Duplex as u16 => {
                duplex = Some(Duplex::from_u8(get::u8(payload)?));
            }
            t if t == EthtoolLinkmodesAttr::Autoneg as u16 => {
                autoneg = Some(get::bool(payload)?);
            }
            _ => {}
        }
    }
    Ok(EventKind::LinkModes {
        speed,
        duplex,
        autoneg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::genl::GenlMsgHdr;
    use crate::netlink::genl::ethtool::{EthtoolHeaderAttr, EthtoolRingsAttr};

    const FAMILY: u16 = 21;

    fn notification(cmd: EthtoolMsg, dev: &str, body: impl FnOnce(&mut MessageBuilder)) -> Vec<u8> {
        let mut b = MessageBuilder::new(FAMILY, 0);
        b.append_bytes(GenlMsgHdr::new(cmd as u8, 1).as_bytes());
        let hdr = b.nest_start(ETHTOOL_A_HEADER);
        b.append_attr_str(EthtoolHeaderAttr::DevName as u16, dev);
        b.nest_end(hdr);
        body(&mut b);
        b.finish()
    }

    #[test]
    fn rings_notification() {
        let data = notification(EthtoolMsg::RingsNtf, "eth1", |b| {
            b.append_attr_u32(EthtoolRingsAttr::Rx as u16, 1024);
        });
        let events = parse_events(&data, FAMILY);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ifname.as_deref(), Some("eth1"));
        match &events[0].change {
            EventKind::Rings(r) => assert_eq!(r.rx, Some(1024)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_notification_is_skipped() {
        let mut data = notification(EthtoolMsg::RingsNtf, "eth1", |b| {
            b.append_attr(EthtoolRingsAttr::Rx as u16, &[1]);
        });
        data.extend(notification(EthtoolMsg::FeaturesNtf, "eth2", |_| {}));

        let events = parse_events(&data, FAMILY);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change, EventKind::Features);
        assert_eq!(events[0].ifname.as_deref(), Some("eth2"));
    }

    #[test]
    fn other_families_are_ignored() {
        let data = notification(EthtoolMsg::PauseNtf, "eth0", |_| {});
        assert!(parse_events(&data, FAMILY + 1).is_empty());
    }

    #[test]
    fn event_json_is_tagged() {
        let event = EthtoolEvent {
            ifname: Some("eth0".into()),
            change: EventKind::Other { cmd: 99 },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "other");
        assert_eq!(json["cmd"], 99);
        assert_eq!(json["ifname"], "eth0");
    }
}
