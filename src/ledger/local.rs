use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

use super::LedgerEntry;

/// Ledger kept as a plain text file, one `key, hash` entry per line.
#[derive(Debug)]
pub struct FileLedger(PathBuf);

impl FileLedger {
    pub fn open(p: impl AsRef<Path>) -> Self {
        Self(p.as_ref().to_owned())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Reads the whole file. A missing file is an empty ledger.
    pub async fn load(&self) -> crate::Result<Vec<LedgerEntry>> {
        if !fs::try_exists(&self.0).await? {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.0).await?;
        let entries = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| {
                let entry = LedgerEntry::parse_line(line);
                if entry.is_none() {
                    log::warn!("Ignoring malformed line {} in {}", n + 1, self.0.display());
                }
                entry
            })
            .collect();
        Ok(entries)
    }

    pub async fn append(&self, entry: &LedgerEntry) -> crate::Result<()> {
        if let Some(parent) = self.0.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut f = fs::File::options()
            .create(true)
            .append(true)
            .open(&self.0)
            .await?;
        f.write_all(format!("{entry}\n").as_bytes()).await?;
        f.flush().await?;
        Ok(())
    }
}
