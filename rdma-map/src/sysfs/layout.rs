//! Sysfs path layout
//!
//! The kernel exposes RDMA state under fixed class directories. The
//! layout is injectable so discovery can run against a rebased root
//! (containers, fixtures) instead of the live host.

use crate::error::{RdmaMapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PORTS_DIR: &str = "ports";
const GID_ATTRS_DIR: &str = "gid_attrs";
const GID_ATTR_NDEVS_DIR: &str = "ndevs";
const NODE_GUID_FILE: &str = "node_guid";
const IBDEV_FILE: &str = "ibdev";

/// Root paths of the RDMA class trees and the device-node directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysfsLayout {
    /// RDMA device class root (one entry per RDMA device)
    pub rdma_class_dir: PathBuf,
    /// Connection-manager char-device class (`ucm*`)
    pub ucm_dir: PathBuf,
    /// Management-datagram char-device class (`issm*`, `umad*`)
    pub mad_dir: PathBuf,
    /// User-verbs char-device class (`uverbs*`)
    pub verbs_dir: PathBuf,
    /// Where the char-device nodes live
    pub dev_dir: PathBuf,
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self::with_sysfs_root("/sys")
    }
}

impl SysfsLayout {
    /// Layout with every class directory rebased under `root`
    ///
    /// `root` stands in for `/sys`. The device-node directory stays at
    /// `/dev/infiniband` since it is only used to build returned paths.
    pub fn with_sysfs_root(root: impl AsRef<Path>) -> Self {
        let class = root.as_ref().join("class");
        Self {
            rdma_class_dir: class.join("infiniband"),
            ucm_dir: class.join("infiniband_cm"),
            mad_dir: class.join("infiniband_mad"),
            verbs_dir: class.join("infiniband_verbs"),
            dev_dir: PathBuf::from("/dev/infiniband"),
        }
    }

    /// Load a layout from a JSON file; omitted fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| RdmaMapError::from_io(path, e))?;
        serde_json::from_slice(&data)
            .map_err(|e| RdmaMapError::InvalidLayout(format!("{}: {}", path.display(), e)))
    }

    pub fn device_dir(&self, device: &str) -> PathBuf {
        self.rdma_class_dir.join(device)
    }

    pub fn ports_dir(&self, device: &str) -> PathBuf {
        self.device_dir(device).join(PORTS_DIR)
    }

    /// Gid-attribute netdev directory for one port
    pub fn netdev_index_dir(&self, device: &str, port: &str) -> PathBuf {
        self.ports_dir(device)
            .join(port)
            .join(GID_ATTRS_DIR)
            .join(GID_ATTR_NDEVS_DIR)
    }

    pub fn netdev_index_file(&self, device: &str, port: &str, index: &str) -> PathBuf {
        self.netdev_index_dir(device, port).join(index)
    }

    pub fn node_guid_file(&self, device: &str) -> PathBuf {
        self.device_dir(device).join(NODE_GUID_FILE)
    }

    /// The `ibdev` attribute sitting next to a char-device class entry
    pub(crate) fn ibdev_file(class_entry_dir: &Path) -> PathBuf {
        class_entry_dir.join(IBDEV_FILE)
    }

    /// Absolute device-node path for a char-device class entry
    pub fn dev_node(&self, entry: &str) -> PathBuf {
        self.dev_dir.join(entry)
    }
}
