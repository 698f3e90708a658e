//! Free space probing.

use std::io;
use std::path::Path;

/// Reports the space available to unprivileged writers below a path.
pub trait SpaceProbe: Send + Sync {
    /// Available space in 1 KiB blocks.
    fn available_blocks(&self, path: &Path) -> io::Result<u64>;
}

/// Uses `statvfs(3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

#[cfg(unix)]
impl SpaceProbe for StatvfsProbe {
    #[allow(clippy::unnecessary_cast, clippy::useless_conversion)]
    fn available_blocks(&self, path: &Path) -> io::Result<u64> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
        let blocks = stat.blocks_available() as u64;
        let fragment = stat.fragment_size() as u64;
        Ok(blocks.saturating_mul(fragment) / 1024)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_reports_space() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocks = StatvfsProbe.available_blocks(dir.path()).expect("statvfs");
        assert!(blocks > 0);
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = StatvfsProbe
            .available_blocks(Path::new("/nonexistent/prjacl/space"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
