use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use grabber_core::TaskId;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::client::BackendClient;

const MAX_FILENAME_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("artifact not available (http {status}): {detail}")]
    HttpStatus { status: u16, detail: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Filesystem-safe artifact name; keeps the extension when shortening.
pub fn sanitize_filename(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut name = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if name.is_empty() {
        name = "download".to_string();
    }
    if name.chars().count() > MAX_FILENAME_LEN {
        name = shorten_keeping_extension(&name);
    }
    let stem_len = name.find('.').unwrap_or(name.len());
    if is_reserved_windows_name(&name[..stem_len]) {
        name.insert(stem_len, '_');
    }
    name
}

fn shorten_keeping_extension(name: &str) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 10 => (stem, Some(ext)),
        _ => (name, None),
    };
    let budget = MAX_FILENAME_LEN - ext.map_or(0, |ext| ext.chars().count() + 1);
    let mut short: String = stem.chars().take(budget).collect();
    if let Some(ext) = ext {
        short.push('.');
        short.push_str(ext);
    }
    short
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Streams `/download/{task_id}` into `dir` through a temp file, then renames it into place.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub async fn retrieve(
        &self,
        client: &BackendClient,
        task_id: &TaskId,
        filename: Option<&str>,
    ) -> Result<PathBuf, RetrieveError> {
        ensure_output_dir(&self.dir)?;
        let response = client.open_artifact(task_id).await?;
        let target = self
            .dir
            .join(sanitize_filename(filename.unwrap_or(task_id.as_str())));

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(PersistError::from)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| RetrieveError::Transport(err.to_string()))?;
            tmp.write_all(&chunk).map_err(PersistError::from)?;
        }
        tmp.flush().map_err(PersistError::from)?;
        tmp.as_file_mut().sync_all().map_err(PersistError::from)?;

        // Rename over any existing file; the old content stays readable until then.
        tmp.persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("a/b:c?.mp4"), "a_b_c_.mp4");
        assert_eq!(sanitize_filename("  ..  "), "download");
        assert_eq!(sanitize_filename("My Song.mp3"), "My Song.mp3");
    }

    #[test]
    fn escapes_reserved_names() {
        assert_eq!(sanitize_filename("CON.mp4"), "CON_.mp4");
        assert_eq!(sanitize_filename("nul"), "nul_");
    }

    #[test]
    fn long_names_keep_extension() {
        let long = format!("{}.mp4", "x".repeat(300));
        let short = sanitize_filename(&long);
        assert_eq!(short.chars().count(), MAX_FILENAME_LEN);
        assert!(short.ends_with(".mp4"));
    }
}
