//! Gid-table walk for Ethernet-encapsulated netdevices

use crate::device::DeviceEnumerator;
use log::{debug, info};

/// Find the RDMA device whose gid table binds `netdev_name`
///
/// Walks device, port and gid index in listing order and stops at the
/// first binding equal to `netdev_name`. If several devices claim the
/// same netdevice, the first one encountered is returned.
pub fn match_ethernet(devices: &DeviceEnumerator<'_>, netdev_name: &str) -> Option<String> {
    for device in devices.list_devices() {
        for port in devices.list_ports(&device) {
            for index in devices.list_netdev_indices(&device, &port) {
                let Some(bound) = devices.read_netdev_binding(&device, &port, &index) else {
                    continue;
                };
                if bound == netdev_name {
                    info!(
                        "{} is bound to {} port {} gid index {}",
                        netdev_name, device, port, index
                    );
                    return Some(device);
                }
            }
        }
    }

    debug!("No gid table entry binds {}", netdev_name);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::tree::MemTree;
    use crate::sysfs::{FsSysTree, SysfsLayout};
    use std::fs;
    use tempfile::TempDir;

    const NDEVS: &str = "/sys/class/infiniband/mlx5_0/ports/1/gid_attrs/ndevs";

    #[test]
    fn test_match_exact_name() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new().file(format!("{}/0", NDEVS), "eth0\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert_eq!(match_ethernet(&devices, "eth0").as_deref(), Some("mlx5_0"));
    }

    #[test]
    fn test_no_fuzzy_match() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new().file(format!("{}/0", NDEVS), "eth0\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert!(match_ethernet(&devices, "eth0 ").is_none());
        assert!(match_ethernet(&devices, "eth").is_none());
        assert!(match_ethernet(&devices, "ETH0").is_none());
    }

    #[test]
    fn test_match_later_port_and_index() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new()
            .file("/sys/class/infiniband/mlx5_0/ports/1/gid_attrs/ndevs/0", "eth0\n")
            .file("/sys/class/infiniband/mlx5_1/ports/1/gid_attrs/ndevs/0", "eth1\n")
            .file("/sys/class/infiniband/mlx5_1/ports/2/gid_attrs/ndevs/0", "eth2\n")
            .file("/sys/class/infiniband/mlx5_1/ports/2/gid_attrs/ndevs/3", "vlan100\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert_eq!(match_ethernet(&devices, "vlan100").as_deref(), Some("mlx5_1"));
        assert_eq!(match_ethernet(&devices, "eth2").as_deref(), Some("mlx5_1"));
    }

    #[test]
    fn test_first_device_wins() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new()
            .file("/sys/class/infiniband/rxe1/ports/1/gid_attrs/ndevs/0", "eth0\n")
            .file("/sys/class/infiniband/rxe0/ports/1/gid_attrs/ndevs/0", "eth0\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert_eq!(match_ethernet(&devices, "eth0").as_deref(), Some("rxe1"));
    }

    #[test]
    fn test_skips_devices_without_ports() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new()
            .dir("/sys/class/infiniband/mlx4_0")
            .dir("/sys/class/infiniband/mlx5_0/ports/1")
            .file("/sys/class/infiniband/mlx5_1/ports/1/gid_attrs/ndevs/0", "eth0\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert_eq!(match_ethernet(&devices, "eth0").as_deref(), Some("mlx5_1"));
    }

    #[test]
    fn test_no_match_on_real_tree() {
        let tmpdir = TempDir::new().unwrap();
        let layout = SysfsLayout::with_sysfs_root(tmpdir.path());
        let ndevs = layout.netdev_index_dir("mlx5_0", "1");
        fs::create_dir_all(&ndevs).unwrap();
        fs::write(ndevs.join("0"), "ens1f0\n").unwrap();

        let devices = DeviceEnumerator::new(&FsSysTree, &layout);
        assert_eq!(match_ethernet(&devices, "ens1f0").as_deref(), Some("mlx5_0"));
        assert!(match_ethernet(&devices, "ens1f1").is_none());
    }

    #[test]
    fn test_missing_index_entry_is_skipped() {
        let layout = SysfsLayout::default();
        let tree = MemTree::new()
            .raw_entry(NDEVS, "0")
            .file(format!("{}/1", NDEVS), "eth0\n");
        let devices = DeviceEnumerator::new(&tree, &layout);

        assert_eq!(match_ethernet(&devices, "eth0").as_deref(), Some("mlx5_0"));
    }

    #[test]
    fn test_unused_gid_slots_are_skipped() {
        let tmpdir = TempDir::new().unwrap();
        let layout = SysfsLayout::with_sysfs_root(tmpdir.path());
        let ndevs = layout.netdev_index_dir("mlx5_0", "1");
        // Unreadable slots: directories fail with EISDIR
        for index in 1..64 {
            fs::create_dir_all(ndevs.join(index.to_string())).unwrap();
        }
        fs::write(ndevs.join("0"), "eth0\n").unwrap();

        let devices = DeviceEnumerator::new(&FsSysTree, &layout);
        assert_eq!(devices.list_netdev_indices("mlx5_0", "1").len(), 64);
        assert!(devices.read_netdev_binding("mlx5_0", "1", "5").is_none());
        assert_eq!(match_ethernet(&devices, "eth0").as_deref(), Some("mlx5_0"));
        assert!(match_ethernet(&devices, "eth9").is_none());
    }
}
