use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::{JobError, JobResult};
use super::fetch::ContentDigest;

/// Whether a run must publish the candidate payload or leave the destination
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Unchanged,
}

/// Compare the candidate digest against the current destination content.
///
/// A destination that cannot be opened counts as a first publish and reports
/// `Updated`. A read failure while scanning an open destination is a
/// `Compare` error and aborts the run without touching the file.
pub fn detect_change(destination: &Path, candidate: &ContentDigest) -> JobResult<Outcome> {
    let file = match File::open(destination) {
        Ok(file) => file,
        Err(_) => return Ok(Outcome::Updated),
    };

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).map_err(JobError::Compare)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    if ContentDigest::from_hasher(hasher) == *candidate {
        Ok(Outcome::Unchanged)
    } else {
        Ok(Outcome::Updated)
    }
}
