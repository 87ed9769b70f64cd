//! Command history
//!
//! Append-only record of command lines typed in interactive mode,
//! backed by a plain text file (one line per entry) with 1-based
//! recall.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct CommandHistory {
    path: PathBuf,
    entries: Vec<String>,
}

impl CommandHistory {
    /// Open (or create) the backing file and load existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            reader
                .lines()
                .collect::<std::io::Result<Vec<_>>>()?
                .into_iter()
                .filter(|l| !l.trim().is_empty())
                .collect()
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Vec::new()
        };

        Ok(Self { path, entries })
    }

    /// Append a command line, assigning it the next sequential index.
    pub fn add(&mut self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        self.entries.push(line.to_string());
        Ok(())
    }

    /// Recall entry `index` (1-based).
    pub fn get(&self, index: usize) -> Result<&str> {
        if index == 0 || index > self.entries.len() {
            return Err(Error::InvalidHistoryEntry(index));
        }
        Ok(&self.entries[index - 1])
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Render all entries, one per line, index right-aligned to five
    /// characters.
    pub fn list(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>5} {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Empty the in-memory entries and truncate the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        File::create(&self.path)?;
        Ok(())
    }

    /// Path of the backing file, for display.
    pub fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, CommandHistory) {
        let dir = tempfile::tempdir().unwrap();
        let history = CommandHistory::open(dir.path().join("history.txt")).unwrap();
        (dir, history)
    }

    #[test]
    fn test_add_and_get() -> Result<()> {
        let (_dir, mut history) = open_temp();

        history.add("list categories")?;
        history.add("add category Birds")?;

        assert_eq!(history.count(), 2);
        assert_eq!(history.get(1)?, "list categories");
        assert_eq!(history.get(2)?, "add category Birds");

        Ok(())
    }

    #[test]
    fn test_get_out_of_range() {
        let (_dir, mut history) = open_temp();

        assert!(matches!(history.get(1), Err(Error::InvalidHistoryEntry(1))));

        history.add("help").unwrap();
        assert!(matches!(history.get(0), Err(Error::InvalidHistoryEntry(0))));
        assert!(matches!(history.get(2), Err(Error::InvalidHistoryEntry(2))));
    }

    #[test]
    fn test_list_formats_right_aligned_index() -> Result<()> {
        let (_dir, mut history) = open_temp();

        history.add("help")?;
        history.add("list locations")?;

        let listed = history.list();
        let lines: Vec<&str> = listed.lines().collect();
        assert_eq!(lines[0], "    1 help");
        assert_eq!(lines[1], "    2 list locations");

        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let mut history = CommandHistory::open(&path)?;
        history.add("list categories")?;
        drop(history);

        let reopened = CommandHistory::open(&path)?;
        assert_eq!(reopened.count(), 1);
        assert_eq!(reopened.get(1)?, "list categories");

        Ok(())
    }

    #[test]
    fn test_clear_truncates_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let mut history = CommandHistory::open(&path)?;
        history.add("help")?;
        history.clear()?;

        assert_eq!(history.count(), 0);
        assert!(matches!(history.get(1), Err(Error::InvalidHistoryEntry(1))));

        let reopened = CommandHistory::open(&path)?;
        assert_eq!(reopened.count(), 0);

        Ok(())
    }
}
