//! Local video handling: format checks and stdin staging.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// MIME type for a video file extension, or None if the format is not
/// accepted for upload.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "avi" => Some("video/x-msvideo"),
        "ogv" => Some("video/ogg"),
        _ => None,
    }
}

/// A local video validated and ready for upload.
///
/// Holds either a caller-supplied path, which is never deleted, or a staged
/// temp copy (piped input), which is removed on drop.
#[derive(Debug)]
pub struct VideoFile {
    path: PathBuf,
    mime_type: &'static str,
    display_name: String,
    staged: Option<NamedTempFile>,
}

impl VideoFile {
    /// Open and validate a video file on disk.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file does not exist or is not a regular file
    /// - The file is empty
    /// - The extension is missing or not a supported video format
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read video file: {}", path.display()))?;

        if !metadata.is_file() {
            anyhow::bail!("Not a regular file: {}", path.display());
        }
        if metadata.len() == 0 {
            anyhow::bail!("Video file is empty: {}", path.display());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let mime_type = mime_for_extension(&extension).ok_or_else(|| {
            anyhow::anyhow!(
                "Unsupported video format: '{}'. Supported: mp4, mov, webm, mkv, avi, ogv",
                extension
            )
        })?;

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        Ok(Self {
            path,
            mime_type,
            display_name,
            staged: None,
        })
    }

    /// Stage piped video bytes into a temp file for upload.
    ///
    /// Piped input carries no filename, so MP4 is assumed. The staged copy
    /// is deleted when this value drops or [`discard_staged`] is called.
    ///
    /// [`discard_staged`]: VideoFile::discard_staged
    pub fn stage(reader: &mut dyn Read, display_name: &str) -> Result<Self> {
        let mut staged = tempfile::Builder::new()
            .prefix("topspin_")
            .suffix(".mp4")
            .tempfile()
            .context("Failed to create staging file")?;

        let bytes = std::io::copy(reader, &mut staged).context("Failed to stage video data")?;
        if bytes == 0 {
            anyhow::bail!("No video data received");
        }

        crate::verbose!("Staged {:.1} KB of piped video", bytes as f64 / 1024.0);

        Ok(Self {
            path: staged.path().to_path_buf(),
            mime_type: "video/mp4",
            display_name: display_name.to_string(),
            staged: Some(staged),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Remove the staged temp copy now instead of waiting for drop.
    ///
    /// Safe to call repeatedly; removal failures are logged and swallowed.
    /// Caller-supplied paths are never touched.
    pub fn discard_staged(&mut self) {
        if let Some(staged) = self.staged.take() {
            if let Err(e) = staged.close() {
                crate::verbose!("Failed to remove staged video: {e}");
            }
        }
    }
}
