//! Tail server logs command
//!
//! Follows the newest rolling `server.log.<date>` file, similar to `tail -f`.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use crate::dirs;

/// Monitor server logs in real-time
#[derive(Parser, Debug)]
pub struct TailLogs {
    /// Log directory (defaults to LOG_DIR or the platform cache dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Number of lines to show from history before tailing
    #[arg(short = 'n', long, default_value = "10")]
    pub lines: usize,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval: u64,
}

impl TailLogs {
    pub fn execute(self) -> Result<()> {
        let log_dir = self.dir.clone().unwrap_or_else(dirs::log_dir);

        if !log_dir.exists() {
            eprintln!("{}", style("✗ Log directory not found").red().bold());
            eprintln!("  Path: {}", style(log_dir.display()).dim());
            eprintln!();
            eprintln!("  Run the server first to generate logs:");
            eprintln!("    {}", style("cargo run -p gate-server").cyan());
            anyhow::bail!("Log directory does not exist");
        }

        let log_path = dirs::find_latest_log(&log_dir).context("Failed to find latest log file")?;

        println!("{}", style("📝 Monitoring server logs").green().bold());
        println!("  Log file: {}", style(log_path.display()).dim());
        println!();

        self.tail_file(&log_path)
    }

    /// Print the last N lines, then follow new content
    fn tail_file(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        for line in read_last_n_lines(&mut file, self.lines)? {
            println!("{}", line);
        }

        let mut reader = BufReader::new(file);
        let poll_interval = Duration::from_millis(self.poll_interval);

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => std::thread::sleep(poll_interval),
                Ok(_) => print!("{}", line),
                Err(e) => {
                    eprintln!("{}", style(format!("Error reading log file: {}", e)).red());
                    anyhow::bail!("Failed to read log file");
                }
            }
        }
    }
}

/// Last `n` lines of `file`, leaving the cursor at the end.
fn read_last_n_lines(file: &mut File, n: usize) -> Result<Vec<String>> {
    file.seek(SeekFrom::Start(0))?;

    let lines: Vec<String> = BufReader::new(&mut *file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to read lines from log file")?;

    file.seek(SeekFrom::End(0))?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn last_lines_of_short_and_long_files() {
        let mut tmp = tempfile::tempfile().unwrap();
        writeln!(tmp, "one\ntwo\nthree").unwrap();

        assert_eq!(read_last_n_lines(&mut tmp, 2).unwrap(), vec!["two", "three"]);
        assert_eq!(read_last_n_lines(&mut tmp, 10).unwrap().len(), 3);
    }
}
