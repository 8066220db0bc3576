use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

const FALLBACK_FILENAME: &str = "download.bin";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save directory missing or not writable: {0}")]
    SaveDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` and its parents unless it already is a directory.
pub fn ensure_save_dir(dir: &Path) -> Result<(), PersistError> {
    let save_dir_error =
        |err: io::Error| PersistError::SaveDir(format!("{}: {err}", dir.display()));
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::SaveDir(format!(
            "{} exists and is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(save_dir_error)
        }
        Err(err) => Err(save_dir_error(err)),
    }
}

/// Picks a local file name for a server download.
///
/// Prefers the base name of the `path` query parameter the server uses in
/// `download_url`, then the `Content-Disposition` filename, then a fallback.
/// Directory components are always stripped.
pub fn artifact_filename(download_url: &url::Url, content_disposition: Option<&str>) -> String {
    let from_query = download_url
        .query_pairs()
        .find(|(key, _)| key == "path")
        .and_then(|(_, value)| base_name(&value));
    let from_header = content_disposition.and_then(disposition_filename);
    from_query
        .or(from_header)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        base_name(value.trim_matches('"'))
    })
}

fn base_name(raw: &str) -> Option<String> {
    // Server paths may use either separator regardless of the local platform.
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Streams a download into `{dir}/{filename}` through a temp file that is
/// renamed into place once complete.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn begin(&self, filename: &str) -> Result<PendingArtifact, PersistError> {
        ensure_save_dir(&self.dir)?;
        Ok(PendingArtifact {
            tmp: NamedTempFile::new_in(&self.dir)?,
            target: self.dir.join(filename),
            written: 0,
        })
    }
}

pub struct PendingArtifact {
    tmp: NamedTempFile,
    target: PathBuf,
    written: u64,
}

impl PendingArtifact {
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and moves the file into place, replacing any previous file.
    pub fn finish(mut self) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.target)
    }
}
