//! Generated-file storage under a single directory.
//!
//! Names come straight from request bodies and URL paths, so every name is
//! checked to be a single path component before it touches the filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{GatewayError, Result};

/// URL prefix under which generated files are served.
pub const DOWNLOAD_PREFIX: &str = "/api/ultimate-ai/download";

/// Validate a user-supplied file name.
///
/// Rejects empty names, the `.`/`..` components, path separators, quotes
/// and control characters. Accepted names are safe to quote in a
/// `Content-Disposition` header.
pub fn validate_file_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '"'])
        || name.chars().any(char::is_control)
    {
        return Err(GatewayError::InvalidInput(format!(
            "invalid file name: {name:?}"
        )));
    }
    Ok(name)
}

/// Validate a file extension; ASCII alphanumerics only.
pub fn validate_format(format: &str) -> Result<&str> {
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GatewayError::InvalidInput(format!(
            "invalid file format: {format:?}"
        )));
    }
    Ok(format)
}

/// A file written by [`write`].
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl StoredFile {
    pub fn download_url(&self) -> String {
        format!("{DOWNLOAD_PREFIX}/{}", self.name)
    }
}

/// Write `content` to `{dir}/{filename}.{format}`, creating `dir` if needed.
pub async fn write(dir: &Path, filename: &str, format: &str, content: &str) -> Result<StoredFile> {
    let name = format!("{}.{}", validate_file_name(filename)?, validate_format(format)?);
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&name);
    tokio::fs::write(&path, content).await?;
    Ok(StoredFile {
        name,
        path,
        size: content.len() as u64,
    })
}

/// Read a previously generated file.
pub async fn read(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(validate_file_name(name)?);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(GatewayError::NotFound(format!("file {name}")))
        }
        Err(e) => Err(e.into()),
    }
}
