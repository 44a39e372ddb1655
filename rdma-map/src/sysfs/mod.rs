//! Read-only view of the kernel's RDMA sysfs state

pub mod layout;
pub mod tree;

pub use layout::SysfsLayout;
pub use tree::{FsSysTree, SysTree};
