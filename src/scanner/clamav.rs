use std::path::{Path, PathBuf};
use std::process::Command;

use super::ScannerAdapter;

/// Adapter for an on-access daemon scanner invoked through its
/// `clamdscan`-style client binary.
pub struct ClamAvAdapter {
    binary: PathBuf,
    handles_suspects: bool,
}

impl ClamAvAdapter {
    pub fn new(binary: PathBuf, handles_suspects: bool) -> Self {
        Self {
            binary,
            handles_suspects,
        }
    }
}

impl ScannerAdapter for ClamAvAdapter {
    fn name(&self) -> &str {
        "clamav"
    }

    fn handles_suspects(&self) -> bool {
        self.handles_suspects
    }

    fn version(&self) -> std::io::Result<String> {
        let output = Command::new(&self.binary).arg("--version").output()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn build_command(&self, target: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--fdpass").arg(target);
        cmd
    }
}
