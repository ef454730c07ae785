//! Word pools used to synthesize titles.

use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

/// Modifier and noun lists, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct WordPool {
    modifiers: Vec<String>,
    nouns: Vec<String>,
}

impl WordPool {
    pub fn new(modifiers: Vec<String>, nouns: Vec<String>) -> Self {
        Self { modifiers, nouns }
    }

    /// Load both pools from line-delimited files. Missing files yield empty
    /// pools rather than errors.
    pub async fn load(modifiers_path: &Path, nouns_path: &Path) -> Self {
        let modifiers = load_words(modifiers_path).await;
        let nouns = load_words(nouns_path).await;
        info!(
            modifiers = modifiers.len(),
            nouns = nouns.len(),
            "Word pools loaded"
        );
        Self::new(modifiers, nouns)
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    pub fn nouns(&self) -> &[String] {
        &self.nouns
    }

    /// Whether either pool is empty, in which case no title can be formed.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() || self.nouns.is_empty()
    }

    /// Upper bound on distinct titles this pool can produce.
    pub fn combinations(&self) -> usize {
        self.modifiers.len().saturating_mul(self.nouns.len())
    }
}

/// Read a word list, one entry per line. Blank lines are skipped.
pub async fn load_words(path: &Path) -> Vec<String> {
    match fs::read_to_string(path).await {
        Ok(content) => parse_words(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Word list not found, using empty pool");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read word list, using empty pool");
            Vec::new()
        }
    }
}

fn parse_words(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
