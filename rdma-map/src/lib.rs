//! RDMA device discovery
//!
//! Maps network interfaces to the RDMA (InfiniBand/RoCE) devices that
//! back them, and RDMA devices to their `/dev/infiniband` character
//! devices. Everything is read from sysfs plus one rtnetlink link query;
//! nothing is cached and nothing is written.
//!
//! RoCE netdevices (`ether` encapsulation) are matched through the
//! per-port gid-table netdev bindings. IPoIB netdevices (`infiniband`
//! encapsulation) are matched by comparing the EUI-64 at the end of the
//! hardware address with each device's node GUID.

pub mod device;
pub mod error;
pub mod guid;
pub mod matcher;
pub mod netlink;
pub mod resolver;
pub mod sysfs;

pub use device::{CharDevice, CharDeviceKind, DeviceEnumerator};
pub use error::{RdmaMapError, Result};
pub use guid::{decode_node_guid, NodeGuid, NODE_GUID_LEN};
pub use netlink::{LinkAttrs, LinkQuery, NetlinkLinkQuery};
pub use resolver::RdmaMap;
pub use sysfs::{FsSysTree, SysTree, SysfsLayout};

/// Names of the RDMA devices on this host
pub fn rdma_device_list() -> Vec<String> {
    RdmaMap::new().list_devices()
}

/// Character-device paths of `rdma_device`, one per category at most
pub fn rdma_char_devices(rdma_device: &str) -> Vec<CharDevice> {
    RdmaMap::new().list_char_devices(rdma_device)
}

/// RDMA device backing the netdevice `netdev_name`, if any
pub fn rdma_device_for_netdevice(netdev_name: &str) -> Result<Option<String>> {
    RdmaMap::new().resolve_rdma_device_for_netdevice(netdev_name)
}
