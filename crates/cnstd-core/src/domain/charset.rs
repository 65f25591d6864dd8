//! Charset (vocabulary) files: one symbol per line.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// An ordered alphabet with its inverse index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Charset {
    alphabet: Vec<String>,
    index: HashMap<String, usize>,
}

impl Charset {
    /// Loads a UTF-8 charset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains repeated symbols.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open charset file: {}", path.display()))?;
        let charset = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid charset file: {}", path.display()))?;
        debug!("Loaded {} symbols from {}", charset.len(), path.display());
        Ok(charset)
    }

    /// Parses a charset from any buffered reader.
    ///
    /// Line terminators are stripped; empty lines are kept as symbols.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, invalid UTF-8, or repeated symbols.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut alphabet = Vec::new();
        for line in reader.lines() {
            let mut line = line.context("Failed to read charset line")?;
            if line.ends_with('\r') {
                line.pop();
            }
            alphabet.push(line);
        }
        Self::from_symbols(alphabet)
    }

    /// Builds a charset from an ordered list of symbols.
    ///
    /// # Errors
    ///
    /// Returns an error listing every repeated symbol with its count,
    /// most frequent first.
    pub fn from_symbols(alphabet: Vec<String>) -> Result<Self> {
        let index: HashMap<String, usize> = alphabet
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (symbol.clone(), idx))
            .collect();

        if index.len() != alphabet.len() {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for symbol in &alphabet {
                *counts.entry(symbol.as_str()).or_default() += 1;
            }
            let mut repeated: Vec<(&str, usize)> =
                counts.into_iter().filter(|(_, n)| *n > 1).collect();
            repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            let listed: Vec<String> = repeated
                .iter()
                .map(|(symbol, n)| format!("{symbol:?} x{n}"))
                .collect();
            anyhow::bail!("repeated chars in vocab: {}", listed.join(", "));
        }

        Ok(Self { alphabet, index })
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alphabet.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alphabet.is_empty()
    }

    /// Symbol at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.alphabet.get(idx).map(String::as_str)
    }

    /// Position of `symbol` in the alphabet.
    #[must_use]
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    /// The alphabet in file order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.alphabet
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_reader_keeps_order() {
        let charset = Charset::from_reader(Cursor::new("中\n国\na\n")).unwrap();
        assert_eq!(charset.len(), 3);
        assert_eq!(charset.get(1), Some("国"));
        assert_eq!(charset.index_of("a"), Some(2));
        assert_eq!(charset.index_of("b"), None);
    }

    #[test]
    fn test_crlf_is_stripped() {
        let charset = Charset::from_reader(Cursor::new("x\r\ny\r\n")).unwrap();
        assert_eq!(charset.symbols(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_blank_line_is_a_symbol() {
        let charset = Charset::from_reader(Cursor::new("a\n\nb")).unwrap();
        assert_eq!(charset.len(), 3);
        assert_eq!(charset.index_of(""), Some(1));
    }

    #[test]
    fn test_repeated_symbols_rejected() {
        let err = Charset::from_reader(Cursor::new("a\nb\na\nc\nb\na\n")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("repeated chars in vocab"));
        // Most frequent first.
        let a = msg.find("\"a\" x3").unwrap();
        let b = msg.find("\"b\" x2").unwrap();
        assert!(a < b);
        assert!(!msg.contains("\"c\""));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Charset::load("/nonexistent/charset.txt").is_err());
    }
}
