//! Netdevice to RDMA device resolution

use crate::device::{CharDevice, DeviceEnumerator};
use crate::error::{RdmaMapError, Result};
use crate::matcher::{match_ethernet, match_infiniband};
use crate::netlink::{LinkQuery, NetlinkLinkQuery, ENCAP_ETHER, ENCAP_INFINIBAND};
use crate::sysfs::{FsSysTree, SysTree, SysfsLayout};
use log::debug;

/// RDMA device discovery over sysfs and rtnetlink
///
/// Holds no cached state: every call re-reads the tree.
pub struct RdmaMap {
    tree: Box<dyn SysTree>,
    layout: SysfsLayout,
    links: Box<dyn LinkQuery>,
}

impl Default for RdmaMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RdmaMap {
    /// Discovery against the live host
    pub fn new() -> Self {
        Self::with_layout(SysfsLayout::default())
    }

    /// Discovery against the host filesystem with custom root paths
    pub fn with_layout(layout: SysfsLayout) -> Self {
        Self::with_parts(Box::new(FsSysTree), layout, Box::new(NetlinkLinkQuery))
    }

    pub fn with_parts(
        tree: Box<dyn SysTree>,
        layout: SysfsLayout,
        links: Box<dyn LinkQuery>,
    ) -> Self {
        Self {
            tree,
            layout,
            links,
        }
    }

    pub fn layout(&self) -> &SysfsLayout {
        &self.layout
    }

    /// Enumerator borrowing this map's tree and layout
    pub fn devices(&self) -> DeviceEnumerator<'_> {
        DeviceEnumerator::new(self.tree.as_ref(), &self.layout)
    }

    pub fn list_devices(&self) -> Vec<String> {
        self.devices().list_devices()
    }

    pub fn list_char_devices(&self, device: &str) -> Vec<CharDevice> {
        self.devices().list_char_devices(device)
    }

    /// Resolve the RDMA device backing `netdev_name`
    ///
    /// Dispatches on the link's encapsulation: `ether` walks gid-table
    /// bindings, `infiniband` compares node GUIDs. `Ok(None)` means no
    /// RDMA device claims the netdevice.
    pub fn resolve_rdma_device_for_netdevice(&self, netdev_name: &str) -> Result<Option<String>> {
        let link = self.links.link_by_name(netdev_name)?;
        debug!(
            "{}: encap {}, hw addr {} bytes",
            netdev_name,
            link.encap_type,
            link.hardware_addr.len()
        );

        match link.encap_type.as_str() {
            ENCAP_ETHER => Ok(match_ethernet(&self.devices(), netdev_name)),
            ENCAP_INFINIBAND => match_infiniband(&self.devices(), netdev_name, &link),
            other => Err(RdmaMapError::UnsupportedEncapsulation(other.to_string())),
        }
    }
}
