//! Fund source list.
//!
//! One page address per line, read once at startup.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ordered list of fund page addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    addresses: Vec<String>,
}

/// A source selected for analysis, with its position in the full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedSource<'a> {
    pub index: usize,
    pub address: &'a str,
}

impl SourceList {
    /// Build from lines; lines are trimmed and blanks dropped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { addresses }
    }

    /// Load from a text file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read source list from {}", path.display()))?;
        let list = Self::from_lines(content.lines());
        tracing::debug!(path = %path.display(), sources = list.len(), "Loaded source list");
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Sources whose address contains `token`, case-insensitively, in list order.
    pub fn select(&self, token: &str) -> Vec<SelectedSource<'_>> {
        let token = token.to_lowercase();
        self.addresses
            .iter()
            .enumerate()
            .filter(|(_, address)| address.to_lowercase().contains(&token))
            .map(|(index, address)| SelectedSource { index, address })
            .collect()
    }
}
