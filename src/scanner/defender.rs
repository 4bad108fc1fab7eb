use std::path::{Path, PathBuf};
use std::process::Command;

use super::ScannerAdapter;

/// Adapter for an enterprise real-time AV invoked via its `scan custom`
/// subcommand (modeled on Microsoft Defender's `mdatp`/`wdavctl`-style CLI).
pub struct DefenderAdapter {
    binary: PathBuf,
    handles_suspects: bool,
}

impl DefenderAdapter {
    pub fn new(binary: PathBuf, handles_suspects: bool) -> Self {
        Self {
            binary,
            handles_suspects,
        }
    }
}

impl ScannerAdapter for DefenderAdapter {
    fn name(&self) -> &str {
        "defender"
    }

    fn handles_suspects(&self) -> bool {
        self.handles_suspects
    }

    fn version(&self) -> std::io::Result<String> {
        let output = Command::new(&self.binary).arg("version").output()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn build_command(&self, target: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("scan").arg("custom").arg("--path").arg(target);
        cmd
    }
}
