//! Mount table parsing, used to find the NFS server behind a project path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Location of the kernel mount table.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Mounted device, `server:/export` for NFS.
    pub device: String,
    /// Mount point.
    pub mount_point: PathBuf,
    /// Filesystem type.
    pub fs_type: String,
}

impl MountEntry {
    /// NFS server name when the device has the `server:/export` form.
    #[must_use]
    pub fn nfs_server(&self) -> Option<&str> {
        let (server, export) = self.device.split_once(':')?;
        (!server.is_empty() && export.starts_with('/')).then_some(server)
    }
}

/// Parsed mount table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Reads [`PROC_MOUNTS`].
    pub fn load() -> io::Result<Self> {
        fs::read_to_string(PROC_MOUNTS).map(|text| Self::parse(&text))
    }

    /// Parses mount table text; short lines are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let device = fields.next()?;
                let mount_point = fields.next()?;
                let fs_type = fields.next()?;
                Some(MountEntry {
                    device: unescape(device),
                    mount_point: PathBuf::from(unescape(mount_point)),
                    fs_type: fs_type.to_owned(),
                })
            })
            .collect();
        Self { entries }
    }

    /// The entry with the longest mount point containing `path`.
    #[must_use]
    pub fn mount_for(&self, path: &Path) -> Option<&MountEntry> {
        self.entries
            .iter()
            .filter(|entry| path.starts_with(&entry.mount_point))
            .max_by_key(|entry| entry.mount_point.components().count())
    }

    /// NFS server serving `path`, if it lives on an NFS mount.
    #[must_use]
    pub fn nfs_server_for(&self, path: &Path) -> Option<&str> {
        self.mount_for(path).and_then(MountEntry::nfs_server)
    }
}

/// Decodes the `\ooo` octal escapes the kernel uses for blanks.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, &b| acc * 8 + u32::from(b - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
sysfs /sys sysfs rw,nosuid 0 0
/dev/sda1 / ext4 rw,relatime 0 0
atreides.dccn.nl:/vol/project /project nfs4 rw,vers=4.1 0 0
freenas.dccn.nl:/mnt/tank/project_freenas /project_freenas nfs4 rw 0 0
/dev/sdb1 /mnt/with\\040space ext4 rw 0 0
";

    #[test]
    fn longest_prefix_wins() {
        let table = MountTable::parse(TABLE);
        assert_eq!(
            table.nfs_server_for(Path::new("/project/3010000.01/data")),
            Some("atreides.dccn.nl")
        );
        assert_eq!(
            table.nfs_server_for(Path::new("/project_freenas/3010000.02")),
            Some("freenas.dccn.nl")
        );
    }

    #[test]
    fn local_paths_have_no_server() {
        let table = MountTable::parse(TABLE);
        assert_eq!(table.nfs_server_for(Path::new("/home/alice")), None);
    }

    #[test]
    fn octal_escapes_are_decoded() {
        let table = MountTable::parse(TABLE);
        assert!(
            table
                .entries
                .iter()
                .any(|e| e.mount_point == Path::new("/mnt/with space"))
        );
    }

    #[test]
    fn short_lines_are_ignored() {
        let table = MountTable::parse("garbage\n\n/dev/x /y\n");
        assert!(table.entries.is_empty());
    }
}
