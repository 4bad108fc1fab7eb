//! Hazard encryptor: GPG public-key encryption of suspect files into the
//! hazard archive.
//!
//! `gpg` is treated as a black box exactly the way the scanner binaries are:
//! success is exit status plus a post-hoc existence/non-empty check on the
//! output file, never stderr parsing.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;

use crate::error::{Result, ShuttleError};

pub struct HazardEncryptor {
    archive_dir: PathBuf,
    public_key_path: PathBuf,
}

impl HazardEncryptor {
    pub fn new(archive_dir: PathBuf, public_key_path: PathBuf) -> Self {
        Self {
            archive_dir,
            public_key_path,
        }
    }

    /// Encrypt `src` into the hazard archive, returning the archive path.
    /// The source is not removed here; callers delete it only after this
    /// returns successfully.
    pub fn encrypt(&self, src: &Path, relative_subpath: &Path) -> Result<PathBuf> {
        let out_path = self.archive_dir.join(archive_filename(relative_subpath));

        let output = Command::new("gpg")
            .arg("--batch")
            .arg("--yes")
            .arg("--trust-model")
            .arg("always")
            .arg("--recipient-file")
            .arg(&self.public_key_path)
            .arg("--output")
            .arg(&out_path)
            .arg("--encrypt")
            .arg(src)
            .output()
            .map_err(|e| ShuttleError::EncryptionFailed {
                path: src.to_path_buf(),
                reason: format!("failed to spawn gpg: {e}"),
            })?;

        if !output.status.success() {
            return Err(ShuttleError::EncryptionFailed {
                path: src.to_path_buf(),
                reason: format!("gpg exited with {}", output.status),
            });
        }

        let metadata = std::fs::metadata(&out_path).map_err(|e| ShuttleError::EncryptionFailed {
            path: src.to_path_buf(),
            reason: format!("encrypted artifact missing: {e}"),
        })?;
        if metadata.len() == 0 {
            return Err(ShuttleError::EncryptionFailed {
                path: src.to_path_buf(),
                reason: "encrypted artifact is empty".to_string(),
            });
        }

        Ok(out_path)
    }
}

/// `<iso8601>_<sanitized-relpath>.gpg`, collision-safe because the timestamp
/// carries sub-second precision.
fn archive_filename(relative_subpath: &Path) -> String {
    let sanitized = relative_subpath
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect::<String>();
    format!("{}_{}.gpg", Utc::now().format("%Y%m%dT%H%M%S%.6f"), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_filename_sanitizes_separators() {
        let name = archive_filename(Path::new("sub/dir/eicar.com"));
        assert!(name.ends_with("_sub_dir_eicar.com.gpg"));
    }
}
