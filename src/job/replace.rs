use std::path::Path;

use tempfile::NamedTempFile;

use super::error::{JobError, JobResult};
use super::ownership::Ownership;

/// Publish the staged payload over the destination.
///
/// Ownership and mode bits are applied to the temporary file first so the
/// destination never exists with interim attributes. The rename itself is
/// atomic because the temporary file lives in the destination directory:
/// concurrent readers observe either the complete prior content or the
/// complete new content. On any failure the temporary file is removed and
/// the destination is left exactly as it was.
pub fn replace(staged: NamedTempFile, destination: &Path, ownership: &Ownership) -> JobResult<()> {
    ownership.apply(staged.path()).map_err(JobError::Replace)?;
    staged
        .persist(destination)
        .map(|_| ())
        .map_err(|err| JobError::Replace(err.error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(dir: &Path, payload: &[u8]) -> NamedTempFile {
        use std::io::Write;

        let mut staged = NamedTempFile::new_in(dir).unwrap();
        staged.write_all(payload).unwrap();
        staged
    }

    #[test]
    fn replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("current.crl");
        std::fs::write(&destination, b"old").unwrap();

        let staged = stage(dir.path(), b"new");
        let ownership = Ownership::resolve(None, None, 0o644).unwrap();
        replace(staged, &destination, &ownership).unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
        // only the destination remains, no stray temporary files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn creates_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("fresh.crl");

        let staged = stage(dir.path(), b"payload");
        let ownership = Ownership::resolve(None, None, 0o644).unwrap();
        replace(staged, &destination, &ownership).unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"payload");
    }

    #[test]
    fn failed_rename_cleans_up_and_keeps_destination() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the destination path makes the rename fail.
        let destination = dir.path().join("occupied");
        std::fs::create_dir(&destination).unwrap();

        let staged = stage(dir.path(), b"payload");
        let ownership = Ownership::resolve(None, None, 0o644).unwrap();
        let err = replace(staged, &destination, &ownership).unwrap_err();

        assert!(matches!(err, JobError::Replace(_)));
        assert!(destination.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
