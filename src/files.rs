//! File selection for uploads.
//!
//! Turns the arguments of `/upload` (or `--upload`) into file payloads:
//! tilde expansion, glob patterns, then reading each file from disk. No
//! type or size checks are made; the backend decides what it accepts.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for file selection.
#[derive(Debug, Error)]
pub enum FileSelectionError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One selected file, ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming the part after the file.
    pub async fn read(path: &Path) -> Result<Self, FileSelectionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| FileSelectionError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        Ok(Self { file_name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Split `/upload` arguments into tokens. Single or double quotes keep
/// spaces inside a path; a backslash escapes the next character.
pub fn split_args(args: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = args.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

fn is_pattern(token: &str) -> bool {
    token.contains(['*', '?', '['])
}

/// Expand paths and glob patterns, keeping order and dropping duplicates.
/// Plain paths are kept even if they do not exist so the read step can
/// report them; patterns only yield existing files.
pub fn expand_selection<I, S>(tokens: I) -> Result<Vec<PathBuf>, FileSelectionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut paths: Vec<PathBuf> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let expanded = shellexpand::tilde(token).into_owned();

        if is_pattern(&expanded) {
            let matches = glob::glob(&expanded).map_err(|source| FileSelectionError::Pattern {
                pattern: token.to_string(),
                source,
            })?;
            let mut found: Vec<PathBuf> = matches.flatten().filter(|p| p.is_file()).collect();
            found.sort();
            for path in found {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        } else {
            let path = PathBuf::from(expanded);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

/// Read every selected path. Fails on the first unreadable file so a
/// partial selection is never uploaded.
pub async fn read_selection(paths: &[PathBuf]) -> Result<Vec<PdfFile>, FileSelectionError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(PdfFile::read(path).await?);
    }
    Ok(files)
}

/// Expand and read a selection in one step.
pub async fn select_files<I, S>(tokens: I) -> Result<Vec<PdfFile>, FileSelectionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let paths = expand_selection(tokens)?;
    read_selection(&paths).await
}
