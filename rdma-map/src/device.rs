//! RDMA device enumeration
//!
//! Lists RDMA devices, their ports and gid-table netdev bindings, and the
//! character devices that belong to each. Every call re-reads sysfs.

use crate::error::Result;
use crate::guid::{decode_node_guid, NodeGuid};
use crate::sysfs::tree::children_or_empty;
use crate::sysfs::{SysTree, SysfsLayout};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Character-device category exposed for an RDMA device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharDeviceKind {
    /// Userspace connection manager
    Ucm,
    /// Subnet-management "is SM" flag device
    Issm,
    /// Userspace management datagrams
    Umad,
    /// Userspace verbs
    Uverbs,
}

impl CharDeviceKind {
    /// All categories, in the order they are reported
    pub const ALL: [CharDeviceKind; 4] = [Self::Ucm, Self::Issm, Self::Umad, Self::Uverbs];

    /// File-name prefix of class entries in this category
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ucm => "ucm",
            Self::Issm => "issm",
            Self::Umad => "umad",
            Self::Uverbs => "uverbs",
        }
    }

    fn class_dir<'a>(&self, layout: &'a SysfsLayout) -> &'a Path {
        match self {
            Self::Ucm => &layout.ucm_dir,
            Self::Issm | Self::Umad => &layout.mad_dir,
            Self::Uverbs => &layout.verbs_dir,
        }
    }
}

impl fmt::Display for CharDeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A character device node owned by an RDMA device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharDevice {
    pub kind: CharDeviceKind,
    /// Absolute path under the device-node directory
    pub path: PathBuf,
}

/// Enumerates RDMA devices over a [`SysTree`]
#[derive(Clone, Copy)]
pub struct DeviceEnumerator<'a> {
    tree: &'a dyn SysTree,
    layout: &'a SysfsLayout,
}

impl<'a> DeviceEnumerator<'a> {
    pub fn new(tree: &'a dyn SysTree, layout: &'a SysfsLayout) -> Self {
        Self { tree, layout }
    }

    pub fn layout(&self) -> &'a SysfsLayout {
        self.layout
    }

    /// Names of all RDMA devices, empty if the class root is absent
    pub fn list_devices(&self) -> Vec<String> {
        children_or_empty(self.tree, &self.layout.rdma_class_dir)
    }

    /// Char devices of `device`, at most one per category
    ///
    /// Categories without a match are omitted. Results follow
    /// [`CharDeviceKind::ALL`] order.
    pub fn list_char_devices(&self, device: &str) -> Vec<CharDevice> {
        CharDeviceKind::ALL
            .iter()
            .filter_map(|kind| self.char_device(device, *kind))
            .collect()
    }

    /// First class entry of `kind` whose `ibdev` names `device`
    ///
    /// The `ibdev` check is substring containment, and the first entry in
    /// listing order wins.
    pub fn char_device(&self, device: &str, kind: CharDeviceKind) -> Option<CharDevice> {
        let class_dir = kind.class_dir(self.layout);

        for entry in children_or_empty(self.tree, class_dir) {
            if !entry.contains(kind.prefix()) {
                continue;
            }
            if !self.is_entry_for_device(&class_dir.join(&entry), device) {
                continue;
            }

            let path = self.layout.dev_node(&entry);
            debug!("{}: {} device {}", device, kind, path.display());
            return Some(CharDevice { kind, path });
        }

        debug!("{}: no {} device", device, kind);
        None
    }

    pub fn ucm_device(&self, device: &str) -> Option<CharDevice> {
        self.char_device(device, CharDeviceKind::Ucm)
    }

    pub fn issm_device(&self, device: &str) -> Option<CharDevice> {
        self.char_device(device, CharDeviceKind::Issm)
    }

    pub fn umad_device(&self, device: &str) -> Option<CharDevice> {
        self.char_device(device, CharDeviceKind::Umad)
    }

    pub fn uverbs_device(&self, device: &str) -> Option<CharDevice> {
        self.char_device(device, CharDeviceKind::Uverbs)
    }

    fn is_entry_for_device(&self, entry_dir: &Path, device: &str) -> bool {
        let ibdev = SysfsLayout::ibdev_file(entry_dir);
        match self.tree.read_string(&ibdev) {
            Ok(owner) => owner.contains(device),
            Err(e) => {
                debug!("Skipping {}: {}", entry_dir.display(), e);
                false
            }
        }
    }

    /// Port names of `device`, empty if it has none
    pub fn list_ports(&self, device: &str) -> Vec<String> {
        children_or_empty(self.tree, &self.layout.ports_dir(device))
    }

    /// Gid-table netdev index entries of one port
    pub fn list_netdev_indices(&self, device: &str, port: &str) -> Vec<String> {
        children_or_empty(self.tree, &self.layout.netdev_index_dir(device, port))
    }

    /// Netdevice bound at one gid-table index, trailing newline removed
    ///
    /// `None` when the entry cannot be read; bindings are optional state.
    pub fn read_netdev_binding(&self, device: &str, port: &str, index: &str) -> Option<String> {
        let path = self.layout.netdev_index_file(device, port, index);
        match self.tree.read_string(&path) {
            Ok(contents) => Some(
                contents
                    .strip_suffix('\n')
                    .unwrap_or(&contents)
                    .to_string(),
            ),
            Err(e) => {
                debug!("Skipping gid netdev entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Read and decode the node GUID of `device`
    pub fn read_node_guid(&self, device: &str) -> Result<NodeGuid> {
        let path = self.layout.node_guid_file(device);
        let text = self.tree.read_string(&path)?;
        decode_node_guid(&text)
    }
}
