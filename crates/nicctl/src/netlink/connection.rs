//! Netlink connection with request/response handling.

use super::attr::{AttrIter, get};
use super::builder::MessageBuilder;
use super::message::{MessageIter, NlMsgError, NlMsgHdr};
use super::protocol::ProtocolState;
use super::socket::NetlinkSocket;
use crate::error::{Error, Result};

/// Set on an error message when the original payload was not echoed back.
const NLM_F_CAPPED: u16 = 0x100;
/// Set on an error message that carries extended-ACK attributes.
const NLM_F_ACK_TLVS: u16 = 0x200;
/// Extended ACK attribute holding a human readable message.
const NLMSGERR_ATTR_MSG: u16 = 1;

/// Typed netlink connection.
///
/// The protocol state `P` records what was learned about the generic
/// netlink family when the connection was opened.
pub struct Connection<P: ProtocolState> {
    socket: NetlinkSocket,
    state: P,
}

impl<P: ProtocolState> Connection<P> {
    pub(crate) fn from_parts(socket: NetlinkSocket, state: P) -> Self {
        Self { socket, state }
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    pub(crate) fn socket_mut(&mut self) -> &mut NetlinkSocket {
        &mut self.socket
    }

    /// Get the protocol state.
    pub fn state(&self) -> &P {
        &self.state
    }

    /// Send a request and collect every reply payload up to the ACK.
    pub async fn transact(&self, builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        transact(&self.socket, builder).await
    }
}

/// Send `builder` (which must carry `NLM_F_ACK` or `NLM_F_DUMP`) and
/// gather the payloads of all replies with the matching sequence number.
///
/// Returns once the kernel sends the ACK or `NLMSG_DONE`. A negative
/// error code becomes [`Error::Kernel`].
pub(crate) async fn transact(
    socket: &NetlinkSocket,
    mut builder: MessageBuilder,
) -> Result<Vec<Vec<u8>>> {
    let seq = socket.next_seq();
    builder.set_seq(seq);
    builder.set_pid(socket.pid());

    let msg = builder.finish();
    socket.send(&msg).await?;

    let mut replies = Vec::new();

    loop {
        let data = socket.recv_msg().await?;

        for result in MessageIter::new(&data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != seq {
                tracing::trace!(
                    expected = seq,
                    got = header.nlmsg_seq,
                    "skipping unrelated message"
                );
                continue;
            }

            if header.is_error() {
                let err = NlMsgError::from_bytes(payload)?;
                if err.is_ack() {
                    return Ok(replies);
                }
                return Err(kernel_error(header, payload, err));
            }

            if header.is_done() {
                return Ok(replies);
            }

            replies.push(payload.to_vec());
        }
    }
}

/// Turn an error message into an [`Error`], using the extended ACK
/// text when the kernel provided one.
fn kernel_error(header: &NlMsgHdr, payload: &[u8], err: &NlMsgError) -> Error {
    let base = Error::from_errno(err.error);

    if header.nlmsg_flags & NLM_F_ACK_TLVS == 0 {
        return base;
    }

    let echoed = if header.nlmsg_flags & NLM_F_CAPPED != 0 {
        std::mem::size_of::<NlMsgHdr>()
    } else {
        err.msg.nlmsg_len as usize
    };
    let tlvs = payload.get(4 + echoed..).unwrap_or(&[]);

    AttrIter::new(tlvs)
        .find(|(kind, _)| *kind == NLMSGERR_ATTR_MSG)
        .and_then(|(_, text)| get::string(text).ok())
        .filter(|text| !text.is_empty())
        .map(|text| base.with_context(text.to_string()))
        .unwrap_or_else(|| Error::from_errno(err.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{NlAttr, nla_align};
    use crate::netlink::message::NLMSG_ERROR;

    fn error_payload(errno: i32, ext_msg: Option<&str>) -> (NlMsgHdr, Vec<u8>) {
        let mut header = NlMsgHdr::new(NLMSG_ERROR, 0);
        let mut payload = errno.to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(21, 0).as_bytes());
        if let Some(text) = ext_msg {
            header.nlmsg_flags = NLM_F_CAPPED | NLM_F_ACK_TLVS;
            let mut value = text.as_bytes().to_vec();
            value.push(0);
            payload.extend_from_slice(NlAttr::new(NLMSGERR_ATTR_MSG, value.len()).as_bytes());
            payload.extend_from_slice(&value);
            payload.resize(nla_align(payload.len()), 0);
        }
        (header, payload)
    }

    #[test]
    fn test_kernel_error_plain() {
        let (header, payload) = error_payload(-libc::EINVAL, None);
        let err = NlMsgError::from_bytes(&payload).unwrap();
        let e = kernel_error(&header, &payload, err);
        assert_eq!(e.errno(), Some(libc::EINVAL));
        assert!(matches!(e, Error::Kernel { .. }));
    }

    #[test]
    fn test_kernel_error_extended_ack() {
        let (header, payload) = error_payload(-libc::EINVAL, Some("unknown FEC mode"));
        let err = NlMsgError::from_bytes(&payload).unwrap();
        let e = kernel_error(&header, &payload, err);
        assert_eq!(e.errno(), Some(libc::EINVAL));
        assert!(e.to_string().starts_with("unknown FEC mode: "));
    }
}
