//! Node-GUID comparison for IPoIB netdevices

use crate::device::DeviceEnumerator;
use crate::error::{RdmaMapError, Result};
use crate::guid::NODE_GUID_LEN;
use crate::netlink::LinkAttrs;
use log::{debug, info};

/// The trailing 8 bytes of an IPoIB hardware address
///
/// A 20-byte IPoIB address ends with the port's EUI-64. Addresses
/// shorter than 8 bytes are rejected.
pub fn eui64_from_hardware_addr(addr: &[u8]) -> Result<[u8; NODE_GUID_LEN]> {
    let start = addr
        .len()
        .checked_sub(NODE_GUID_LEN)
        .ok_or(RdmaMapError::ShortHardwareAddress { len: addr.len() })?;

    let mut eui64 = [0u8; NODE_GUID_LEN];
    eui64.copy_from_slice(&addr[start..]);
    Ok(eui64)
}

/// Find the RDMA device whose node GUID matches the link's EUI-64
///
/// Every device visited must expose a readable, well-formed node GUID;
/// the first one that does not fails the whole match.
pub fn match_infiniband(
    devices: &DeviceEnumerator<'_>,
    netdev_name: &str,
    link: &LinkAttrs,
) -> Result<Option<String>> {
    let eui64 = eui64_from_hardware_addr(&link.hardware_addr)?;

    for device in devices.list_devices() {
        let guid = devices.read_node_guid(&device)?;
        if guid.as_bytes() == &eui64 {
            info!("{} matches node GUID {} of {}", netdev_name, guid, device);
            return Ok(Some(device));
        }
        debug!("{}: node GUID {} does not match {}", device, guid, netdev_name);
    }

    Ok(None)
}
