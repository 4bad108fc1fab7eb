//! Streaming content hashing (SHA-256).
//!
//! The stager hashes while it copies, in one pass, so admission, integrity
//! verification, and suspect archival all reference the same digest.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

const BUF_SIZE: usize = 64 * 1024;

/// Hash a file at `path`. Zero-length files hash to the canonical empty-input
/// digest rather than erroring.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    hash_reader(&mut file)
}

pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Copy `src` to `dst` while hashing the bytes as they're written, returning
/// `(hash, bytes_copied)`. Used by the quarantine stager so it never reads a
/// file twice.
pub fn copy_and_hash(src: &Path, dst: &Path) -> io::Result<(String, u64)> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        output.write_all(&buf[..n])?;
        total += n as u64;
    }
    output.sync_all()?;
    Ok((hex::encode(hasher.finalize()), total))
}
