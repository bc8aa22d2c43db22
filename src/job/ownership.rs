use std::io;
use std::path::Path;

use super::error::PrepareError;

/// Owner, group and mode bits applied to the staged file before it is
/// published. Resolved once at preparation time; on platforms without POSIX
/// ownership semantics applying it is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct Ownership {
    #[cfg(unix)]
    uid: nix::unistd::Uid,
    #[cfg(unix)]
    gid: nix::unistd::Gid,
    #[cfg(unix)]
    mode: u32,
}

#[cfg(unix)]
impl Ownership {
    /// Resolve owner/group names to numeric ids, falling back to the running
    /// process's effective ids when unspecified.
    pub fn resolve(
        owner: Option<&str>,
        group: Option<&str>,
        mode: u32,
    ) -> Result<Self, PrepareError> {
        use nix::unistd::{Gid, Group, Uid, User};

        let uid = match owner {
            Some(name) => User::from_name(name)
                .ok()
                .flatten()
                .ok_or_else(|| PrepareError::OwnerLookup {
                    name: name.to_string(),
                })?
                .uid,
            None => Uid::effective(),
        };

        let gid = match group {
            Some(name) => Group::from_name(name)
                .ok()
                .flatten()
                .ok_or_else(|| PrepareError::GroupLookup {
                    name: name.to_string(),
                })?
                .gid,
            None => Gid::effective(),
        };

        Ok(Self { uid, gid, mode })
    }

    pub fn apply(&self, path: &Path) -> io::Result<()> {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        nix::unistd::chown(path, Some(self.uid), Some(self.gid)).map_err(io::Error::from)?;
        fs::set_permissions(path, fs::Permissions::from_mode(self.mode))
    }
}

#[cfg(not(unix))]
impl Ownership {
    pub fn resolve(
        _owner: Option<&str>,
        _group: Option<&str>,
        _mode: u32,
    ) -> Result<Self, PrepareError> {
        Ok(Self {})
    }

    pub fn apply(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(all(unix, test))]
mod tests {
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn unspecified_owner_and_group_use_effective_ids() {
        let ownership = Ownership::resolve(None, None, 0o644).unwrap();
        assert_eq!(ownership.uid, nix::unistd::Uid::effective());
        assert_eq!(ownership.gid, nix::unistd::Gid::effective());
    }

    #[test]
    fn unknown_owner_fails_resolution() {
        let err = Ownership::resolve(Some("no-such-user-crl-updater"), None, 0o644).unwrap_err();
        assert!(matches!(err, PrepareError::OwnerLookup { .. }));
    }

    #[test]
    fn unknown_group_fails_resolution() {
        let err = Ownership::resolve(None, Some("no-such-group-crl-updater"), 0o644).unwrap_err();
        assert!(matches!(err, PrepareError::GroupLookup { .. }));
    }

    #[test]
    fn apply_sets_mode_and_keeps_ownership() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.crl");
        std::fs::write(&path, b"payload").unwrap();

        let ownership = Ownership::resolve(None, None, 0o600).unwrap();
        ownership.apply(&path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o7777, 0o600);
        assert_eq!(metadata.uid(), nix::unistd::Uid::effective().as_raw());
    }
}
