//! Server log directory lookup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gate_server::logging::{LOG_FILE_PREFIX, log_directory};

/// Log directory the server writes to.
///
/// `LOG_DIR` if set, otherwise the platform cache dir:
/// - macOS: `~/Library/Caches/reelgate/logs`
/// - Linux: `~/.cache/reelgate/logs` (or `$XDG_CACHE_HOME/reelgate/logs`)
/// - Windows: `%LOCALAPPDATA%\reelgate\cache\logs`
/// - Fallback: `/tmp/reelgate/logs`
pub fn log_dir() -> PathBuf {
    let configured = std::env::var_os("LOG_DIR").map(PathBuf::from);
    log_directory(configured.as_deref()).unwrap_or_else(|| PathBuf::from("/tmp/reelgate/logs"))
}

/// The newest rolling log file (`server.log.<date>`) in `log_dir`.
pub fn find_latest_log(log_dir: &Path) -> Result<PathBuf> {
    let mut logs: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {}", log_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        {
            let modified = entry.metadata()?.modified()?;
            logs.push((modified, path));
        }
    }

    // Newest first; same-second writes fall back to the dated name.
    logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    logs.into_iter()
        .next()
        .map(|(_, path)| path)
        .ok_or_else(|| anyhow::anyhow!("No server logs found in {}", log_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_log_prefers_newest_date() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("server.log.2026-10-16"), "old\n").unwrap();
        std::fs::write(dir.path().join("server.log.2026-10-17"), "new\n").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "skip\n").unwrap();

        let latest = find_latest_log(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "server.log.2026-10-17");
    }

    #[test]
    fn empty_directory_has_no_log() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_latest_log(dir.path()).is_err());
    }
}
