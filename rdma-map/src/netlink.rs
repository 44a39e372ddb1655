//! Link attribute lookup over rtnetlink
//!
//! A single RTM_GETLINK request by interface name yields the link-layer
//! type (mapped to an encapsulation name such as `ether` or
//! `infiniband`) and the hardware address.

use crate::error::{RdmaMapError, Result};
use log::debug;
use nix::sys::socket::{
    bind, recv, sendto, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol,
    SockType,
};
use serde::Serialize;
use std::io;
use std::os::fd::AsRawFd;

/// Encapsulation of Ethernet (and RoCE) netdevices
pub const ENCAP_ETHER: &str = "ether";
/// Encapsulation of IPoIB netdevices
pub const ENCAP_INFINIBAND: &str = "infiniband";

const NLMSG_HDR_LEN: usize = 16;
const IFINFOMSG_LEN: usize = 16;
const RTA_HDR_LEN: usize = 4;
const NLA_TYPE_MASK: u16 = 0x3fff;
const RECV_BUF_LEN: usize = 64 * 1024;
const REQUEST_SEQ: u32 = 1;

/// Not exported by libc
const ARPHRD_IP6GRE: u16 = 823;

/// Attributes of a network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkAttrs {
    pub name: String,
    pub index: u32,
    /// Encapsulation name, e.g. `ether` or `infiniband`
    pub encap_type: String,
    pub hardware_addr: Vec<u8>,
}

/// Looks up link attributes by interface name
pub trait LinkQuery: Send + Sync {
    /// Fails with [`RdmaMapError::UnknownInterface`] if no such link exists
    fn link_by_name(&self, name: &str) -> Result<LinkAttrs>;
}

/// [`LinkQuery`] backed by a NETLINK_ROUTE socket
///
/// A non-dump RTM_GETLINK request is answered with a single datagram
/// (one RTM_NEWLINK or one NLMSG_ERROR), so one `recv` into a buffer
/// well above the largest link message is enough. A reply cut short by
/// the buffer fails to parse as [`RdmaMapError::Netlink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NetlinkLinkQuery;

impl LinkQuery for NetlinkLinkQuery {
    fn link_by_name(&self, name: &str) -> Result<LinkAttrs> {
        if name.is_empty() || name.len() >= libc::IFNAMSIZ as usize {
            return Err(RdmaMapError::UnknownInterface {
                name: name.to_string(),
                reason: "invalid interface name".to_string(),
            });
        }

        let fd = socket(
            AddressFamily::Netlink,
            SockType::Raw,
            SockFlag::SOCK_CLOEXEC,
            SockProtocol::NetlinkRoute,
        )
        .map_err(|e| RdmaMapError::Netlink(format!("socket: {}", e)))?;

        let kernel = NetlinkAddr::new(0, 0);
        bind(fd.as_raw_fd(), &kernel).map_err(|e| RdmaMapError::Netlink(format!("bind: {}", e)))?;

        let request = build_getlink_request(name, REQUEST_SEQ);
        sendto(fd.as_raw_fd(), &request, &kernel, MsgFlags::empty())
            .map_err(|e| RdmaMapError::Netlink(format!("send: {}", e)))?;

        let mut buf = vec![0u8; RECV_BUF_LEN];
        let len = recv(fd.as_raw_fd(), &mut buf, MsgFlags::empty())
            .map_err(|e| RdmaMapError::Netlink(format!("recv: {}", e)))?;
        debug!("RTM_GETLINK {}: {} byte reply", name, len);

        parse_getlink_response(name, REQUEST_SEQ, &buf[..len])
    }
}

/// Encapsulation name for an ARPHRD link type
pub fn encap_type_name(link_type: u16) -> &'static str {
    match link_type {
        libc::ARPHRD_ETHER => ENCAP_ETHER,
        libc::ARPHRD_INFINIBAND => ENCAP_INFINIBAND,
        libc::ARPHRD_LOOPBACK => "loopback",
        libc::ARPHRD_PPP => "ppp",
        libc::ARPHRD_TUNNEL => "ipip",
        libc::ARPHRD_TUNNEL6 => "tunnel6",
        libc::ARPHRD_SIT => "sit",
        libc::ARPHRD_IPGRE => "gre",
        ARPHRD_IP6GRE => "ip6gre",
        libc::ARPHRD_IEEE80211 => "ieee802.11",
        libc::ARPHRD_CAN => "can",
        libc::ARPHRD_NONE => "none",
        libc::ARPHRD_VOID => "void",
        _ => "unknown",
    }
}

fn align4(len: usize) -> usize {
    (len + 3) & !3
}

fn field<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    buf.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| RdmaMapError::Netlink(format!("truncated reply at offset {}", offset)))
}

/// nlmsghdr + ifinfomsg + IFLA_IFNAME
pub(crate) fn build_getlink_request(name: &str, seq: u32) -> Vec<u8> {
    let attr_len = RTA_HDR_LEN + name.len() + 1;
    let total = NLMSG_HDR_LEN + IFINFOMSG_LEN + align4(attr_len);

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&(total as u32).to_ne_bytes());
    buf.extend_from_slice(&(libc::RTM_GETLINK as u16).to_ne_bytes());
    buf.extend_from_slice(&(libc::NLM_F_REQUEST as u16).to_ne_bytes());
    buf.extend_from_slice(&seq.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());

    buf.push(libc::AF_UNSPEC as u8);
    buf.push(0);
    buf.extend_from_slice(&0u16.to_ne_bytes());
    buf.extend_from_slice(&0i32.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());

    buf.extend_from_slice(&(attr_len as u16).to_ne_bytes());
    buf.extend_from_slice(&(libc::IFLA_IFNAME as u16).to_ne_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
    buf.resize(total, 0);
    buf
}

pub(crate) fn parse_getlink_response(name: &str, seq: u32, buf: &[u8]) -> Result<LinkAttrs> {
    let mut offset = 0;
    while offset + NLMSG_HDR_LEN <= buf.len() {
        let msg_len = u32::from_ne_bytes(field(buf, offset)?) as usize;
        let msg_type = u16::from_ne_bytes(field(buf, offset + 4)?);
        let msg_seq = u32::from_ne_bytes(field(buf, offset + 8)?);
        if msg_len < NLMSG_HDR_LEN || offset + msg_len > buf.len() {
            return Err(RdmaMapError::Netlink(format!(
                "bad message length {} at offset {}",
                msg_len, offset
            )));
        }
        let msg = &buf[offset..offset + msg_len];

        if msg_seq == seq {
            if msg_type == libc::NLMSG_ERROR as u16 {
                let code = i32::from_ne_bytes(field(msg, NLMSG_HDR_LEN)?);
                if code != 0 {
                    return Err(RdmaMapError::UnknownInterface {
                        name: name.to_string(),
                        reason: io::Error::from_raw_os_error(-code).to_string(),
                    });
                }
            } else if msg_type == libc::RTM_NEWLINK as u16 {
                return parse_link_message(name, &msg[NLMSG_HDR_LEN..]);
            }
        }

        offset += align4(msg_len);
    }

    Err(RdmaMapError::UnknownInterface {
        name: name.to_string(),
        reason: "no link in netlink reply".to_string(),
    })
}

fn parse_link_message(name: &str, payload: &[u8]) -> Result<LinkAttrs> {
    let link_type = u16::from_ne_bytes(field(payload, 2)?);
    let index = i32::from_ne_bytes(field(payload, 4)?);

    let mut link = LinkAttrs {
        name: name.to_string(),
        index: index as u32,
        encap_type: encap_type_name(link_type).to_string(),
        hardware_addr: Vec::new(),
    };

    let mut offset = IFINFOMSG_LEN;
    while offset + RTA_HDR_LEN <= payload.len() {
        let rta_len = u16::from_ne_bytes(field(payload, offset)?) as usize;
        let rta_type = u16::from_ne_bytes(field(payload, offset + 2)?) & NLA_TYPE_MASK;
        if rta_len < RTA_HDR_LEN || offset + rta_len > payload.len() {
            break;
        }
        let data = &payload[offset + RTA_HDR_LEN..offset + rta_len];

        if rta_type == libc::IFLA_ADDRESS as u16 {
            link.hardware_addr = data.to_vec();
        } else if rta_type == libc::IFLA_IFNAME as u16 {
            link.name = String::from_utf8_lossy(data)
                .trim_end_matches('\0')
                .to_string();
        }

        offset += align4(rta_len);
    }

    Ok(link)
}
