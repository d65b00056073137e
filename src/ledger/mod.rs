mod local;

use std::{
    fmt::{self, Display, Formatter},
    path::Path,
};

pub use local::FileLedger;

/// Value of the ledger setting that keeps entries in memory only.
pub const AD_HOC: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    pub hash: String,
}

impl LedgerEntry {
    pub fn new(key: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hash: hash.into(),
        }
    }

    /// Splits on the first comma; both halves are trimmed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (key, hash) = line.split_once(',')?;
        let (key, hash) = (key.trim(), hash.trim());
        if key.is_empty() || hash.is_empty() {
            return None;
        }
        Some(Self::new(key, hash))
    }
}

impl Display for LedgerEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.key, self.hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// An entry with this key and hash exists.
    Match,
    /// Entries exist for the key, none with this hash.
    Stale,
    /// Nothing recorded for the key.
    Absent,
}

impl Lookup {
    /// Scans in append order. A match anywhere wins over any number of
    /// differing entries for the same key, before or after it.
    pub fn scan<'a>(
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        key: &str,
        hash: &str,
    ) -> Self {
        let mut out = Self::Absent;
        for entry in entries.into_iter().filter(|e| e.key == key) {
            if entry.hash == hash {
                return Self::Match;
            }
            out = Self::Stale;
        }
        out
    }
}

#[derive(Debug)]
pub enum Ledger {
    Local(FileLedger),
    AdHoc(Vec<LedgerEntry>),
}

impl Ledger {
    #[inline]
    pub fn local(p: impl AsRef<Path>) -> Self {
        Self::Local(FileLedger::open(p))
    }

    #[inline]
    pub const fn ad_hoc() -> Self {
        Self::AdHoc(Vec::new())
    }

    /// `:memory:` selects the in-memory ledger, anything else is a file path.
    pub fn open(setting: &str) -> Self {
        if setting == AD_HOC {
            log::warn!("ledger set to {AD_HOC}, nothing will be remembered between runs.");
            Self::ad_hoc()
        } else {
            Self::local(setting)
        }
    }

    pub async fn entries(&self) -> crate::Result<Vec<LedgerEntry>> {
        match self {
            Self::Local(f) => f.load().await,
            Self::AdHoc(entries) => Ok(entries.clone()),
        }
    }

    pub async fn append(&mut self, key: &str, hash: &str) -> crate::Result<()> {
        let entry = LedgerEntry::new(key, hash);
        match self {
            Self::Local(f) => f.append(&entry).await,
            Self::AdHoc(entries) => {
                entries.push(entry);
                Ok(())
            }
        }
    }

    /// Re-reads the full ledger on every call.
    pub async fn lookup(&self, key: &str, hash: &str) -> crate::Result<Lookup> {
        let entries = self.entries().await?;
        Ok(Lookup::scan(&entries, key, hash))
    }
}
