use std::fmt;
use std::io::Write;

use reqwest::Client;
use sha2::{Digest, Sha256};

use super::error::{JobError, JobResult};

/// PEM preamble of a textual CRL. The sniff window is exactly this long.
pub const X509_CRL_PEM_HEADER: &[u8; 24] = b"-----BEGIN X509 CRL-----";

const SNIFF_LEN: usize = X509_CRL_PEM_HEADER.len();

/// SHA-256 summary of the exact bytes written to the sink. Only ever
/// compared for equality, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::from_hasher(hasher)
    }

    pub(crate) fn from_hasher(hasher: Sha256) -> Self {
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// What a completed download produced: the number of bytes streamed into the
/// sink and, unless the job is forced, their digest.
#[derive(Debug)]
pub struct FetchSummary {
    pub bytes: u64,
    pub digest: Option<ContentDigest>,
}

/// Check if the passed bytes are the beginning of a DER or PEM encoded CRL.
/// The DER form accepts only a two-byte length field, i.e. a payload between
/// 256 and 65535 bytes.
pub fn is_crl_prefix(head: &[u8]) -> bool {
    head == X509_CRL_PEM_HEADER.as_slice()
        || (head.len() >= 2 && head[0] == 0x30 && (head[1] == 0x82 || head[1] == 0x83))
}

/// Composite sink fanning each chunk out to the persistent writer and, when
/// change detection is in play, the digest accumulator.
struct TeeSink<'a, W: Write> {
    writer: &'a mut W,
    hasher: Option<Sha256>,
    written: u64,
}

impl<'a, W: Write> TeeSink<'a, W> {
    fn new(writer: &'a mut W, hash: bool) -> Self {
        Self {
            writer,
            hasher: hash.then(Sha256::new),
            written: 0,
        }
    }

    fn accept(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(chunk)?;
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(chunk);
        }
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn finish(mut self) -> std::io::Result<FetchSummary> {
        self.writer.flush()?;
        Ok(FetchSummary {
            bytes: self.written,
            digest: self.hasher.map(ContentDigest::from_hasher),
        })
    }
}

/// Stream the CRL at `url` into `sink`, enforcing `limit` over the whole
/// transfer. Unless `force` is set, the first 24 bytes are read eagerly and
/// the download is rejected before anything reaches the sink if they do not
/// look like a CRL; forcing also skips the digest entirely. Memory use is a
/// single in-flight chunk regardless of payload size.
pub async fn fetch_crl<W: Write>(
    client: &Client,
    url: &str,
    limit: u64,
    force: bool,
    sink: &mut W,
) -> JobResult<FetchSummary> {
    let mut response = client.get(url).send().await.map_err(JobError::from_reqwest)?;
    if !response.status().is_success() {
        return Err(JobError::HttpStatus(response.status()));
    }

    let mut tee = TeeSink::new(sink, !force);

    if !force {
        let mut head = Vec::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match response.chunk().await.map_err(JobError::from_reqwest)? {
                Some(chunk) => head.extend_from_slice(&chunk),
                // Body ended before the sniff window was full; no valid CRL
                // is this short.
                None => return Err(JobError::Format),
            }
        }
        if !is_crl_prefix(&head[..SNIFF_LEN]) {
            return Err(JobError::Format);
        }
        if head.len() as u64 > limit {
            return Err(JobError::SizeLimit { limit });
        }
        tee.accept(&head).map_err(JobError::Stage)?;
    }

    while let Some(chunk) = response.chunk().await.map_err(JobError::from_reqwest)? {
        if tee.written + chunk.len() as u64 > limit {
            return Err(JobError::SizeLimit { limit });
        }
        tee.accept(&chunk).map_err(JobError::Stage)?;
    }

    tee.finish().map_err(JobError::Stage)
}
