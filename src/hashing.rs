//! Identity key hashing
//!
//! Dictionary rows are reconciled by a content-derived identity key rather than by
//! their storage id. The key must be identical across runs, processes and hosts, so it
//! is a SHA256 digest over normalized naming parts.

use sha2::{Digest, Sha256};

/// Separator placed between normalized parts before hashing
pub const PART_SEPARATOR: char = '|';

/// Length of a rendered identity key (hex-encoded SHA256)
pub const IDENTITY_KEY_LEN: usize = 64;

/// Normalize a single naming part: trim surrounding whitespace and lower-case.
pub fn normalize_part(part: &str) -> String {
    part.trim().to_lowercase()
}

/// Compute a stable identity hash over an ordered sequence of parts.
///
/// Every part is normalized with [`normalize_part`] and the results are joined with
/// [`PART_SEPARATOR`]. Empty parts keep their position, so `["a", "b", ""]` and
/// `["ab", ""]` never produce the same digest.
///
/// # Returns
/// A 64 character lowercase hex digest
pub fn stable_hash<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            let mut buf = [0u8; 4];
            hasher.update(PART_SEPARATOR.encode_utf8(&mut buf).as_bytes());
        }
        hasher.update(normalize_part(part.as_ref()).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
