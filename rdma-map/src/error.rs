//! Error types for RDMA device discovery

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RdmaMapError {
    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed node GUID: {0}")]
    MalformedGuid(String),

    #[error("Hardware address has {len} bytes, need at least 8 for EUI-64")]
    ShortHardwareAddress { len: usize },

    #[error("Unknown network interface {name}: {reason}")]
    UnknownInterface { name: String, reason: String },

    #[error("Unrecognized encapsulation type: {0}")]
    UnsupportedEncapsulation(String),

    #[error("Netlink request failed: {0}")]
    Netlink(String),

    #[error("Invalid sysfs layout: {0}")]
    InvalidLayout(String),
}

impl RdmaMapError {
    /// Classify an I/O failure on `path`
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            _ => Self::Unreadable {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Whether this error only means "no such entity" in the sysfs tree.
    ///
    /// Optional structure (ports, gid tables, char-device classes) is
    /// skipped on these; mandatory structure surfaces them.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unreadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, RdmaMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = RdmaMapError::from_io(
            Path::new("/sys/class/infiniband"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, RdmaMapError::NotFound { .. }));
        assert!(err.is_absent());
        assert_eq!(err.to_string(), "/sys/class/infiniband not found");
    }

    #[test]
    fn test_from_io_permission_denied() {
        let err = RdmaMapError::from_io(
            Path::new("/sys/class/infiniband/mlx5_0/node_guid"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, RdmaMapError::Unreadable { .. }));
        assert!(err.is_absent());
    }

    #[test]
    fn test_hard_errors_are_not_absent() {
        assert!(!RdmaMapError::MalformedGuid("zz".into()).is_absent());
        assert!(!RdmaMapError::UnsupportedEncapsulation("ppp".into()).is_absent());
        assert!(!RdmaMapError::ShortHardwareAddress { len: 6 }.is_absent());
    }
}
