//! Netdevice to RDMA device matching
//!
//! Ethernet (RoCE) netdevices are found through the per-port gid-table
//! netdev bindings. IPoIB netdevices are found by comparing the EUI-64 in
//! their hardware address with each device's node GUID.

pub mod ethernet;
pub mod infiniband;

pub use ethernet::match_ethernet;
pub use infiniband::{eui64_from_hardware_addr, match_infiniband};
