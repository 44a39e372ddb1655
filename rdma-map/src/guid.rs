//! Node GUID codec
//!
//! sysfs renders a node GUID as four colon-separated groups of four hex
//! digits followed by a newline (`0002:c903:0029:7de1\n`). Colons are
//! ignored when decoding, so the eight-pair `00:1b:21:aa:ff:cc:dd:01`
//! form decodes identically.

use crate::error::{RdmaMapError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a node GUID (EUI-64) in bytes
pub const NODE_GUID_LEN: usize = 8;

const HEX_DIGITS: usize = NODE_GUID_LEN * 2;

/// 8-byte node GUID of an RDMA device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeGuid([u8; NODE_GUID_LEN]);

impl NodeGuid {
    pub const fn from_bytes(bytes: [u8; NODE_GUID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NODE_GUID_LEN] {
        &self.0
    }
}

/// Decode a node GUID attribute
///
/// One trailing newline is stripped if present. The remaining text must
/// hold exactly 16 hex digits; colons anywhere are skipped. Each digit
/// pair packs into one byte, first digit in the high nibble.
pub fn decode_node_guid(text: &str) -> Result<NodeGuid> {
    let body = text.strip_suffix('\n').unwrap_or(text);

    let mut guid = [0u8; NODE_GUID_LEN];
    let mut nibbles = 0usize;
    for c in body.chars() {
        if c == ':' {
            continue;
        }
        let nibble = c.to_digit(16).ok_or_else(|| {
            RdmaMapError::MalformedGuid(format!("invalid hex digit {:?} in {:?}", c, body))
        })? as u8;
        if nibbles == HEX_DIGITS {
            return Err(RdmaMapError::MalformedGuid(format!(
                "more than {} hex digits in {:?}",
                HEX_DIGITS, body
            )));
        }

        if nibbles % 2 == 0 {
            guid[nibbles / 2] = nibble << 4;
        } else {
            guid[nibbles / 2] |= nibble;
        }
        nibbles += 1;
    }

    if nibbles != HEX_DIGITS {
        return Err(RdmaMapError::MalformedGuid(format!(
            "expected {} hex digits, found {} in {:?}",
            HEX_DIGITS, nibbles, body
        )));
    }

    Ok(NodeGuid(guid))
}

impl FromStr for NodeGuid {
    type Err = RdmaMapError;

    fn from_str(s: &str) -> Result<Self> {
        decode_node_guid(s)
    }
}

impl fmt::Display for NodeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for NodeGuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
