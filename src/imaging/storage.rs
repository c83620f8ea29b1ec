//! Durable storage for user-uploaded backgrounds.
//!
//! Each user has at most one stored background, named
//! `<user>_bg.<ext>` under the background root, where `<ext>` matches the
//! decoded content rather than the uploaded file name. Uploads are validated by
//! decoding them, then written to a temporary file in the same directory
//! and atomically renamed into place, so a session never references a
//! partially written file.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::models::event::Photo;
use crate::{AppError, Result};

const SUFFIX: &str = "_bg";

/// Summary of a stored background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBackground {
    /// Absolute path of the stored file.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// Writes custom backgrounds under a fixed root directory.
#[derive(Debug, Clone)]
pub struct BackgroundStorage {
    root: PathBuf,
}

impl BackgroundStorage {
    /// Open (and create if needed) the storage root.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory cannot be created or resolved.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|err| {
            AppError::Io(format!(
                "failed to create background root {}: {err}",
                root.display()
            ))
        })?;
        let root = root
            .canonicalize()
            .map_err(|err| AppError::Io(format!("background root invalid: {err}")))?;
        Ok(Self { root })
    }

    /// The storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a background with `extension` would be stored at for `user_id`.
    #[must_use]
    pub fn path_for(&self, user_id: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}{SUFFIX}.{extension}", file_stem_for(user_id)))
    }

    /// Number of stored background files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the root cannot be listed.
    pub fn count(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| AppError::Io(format!("failed to list backgrounds: {err}")))?;
        Ok(entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_file())
            .count())
    }

    /// Validate and persist `photo` as `user_id`'s background, replacing any
    /// previous one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the bytes are not a decodable
    /// image or the file cannot be written.
    pub fn store(&self, user_id: &str, photo: &Photo) -> Result<StoredBackground> {
        let format = image::guess_format(&photo.bytes)
            .map_err(|err| AppError::Persistence(format!("unrecognized image format: {err}")))?;
        image::load_from_memory_with_format(&photo.bytes, format)
            .map_err(|err| AppError::Persistence(format!("image does not decode: {err}")))?;

        let extension = extension_for(photo.format_hint.as_deref(), format);
        let target = self.path_for(user_id, &extension);

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|err| {
            AppError::Persistence(format!("failed to create temporary file: {err}"))
        })?;
        tmp.write_all(&photo.bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| AppError::Persistence(format!("failed to write temporary file: {err}")))?;
        tmp.persist(&target).map_err(|err| {
            AppError::Persistence(format!(
                "failed to persist background to {}: {err}",
                target.display()
            ))
        })?;

        self.remove_stale(user_id, &target);

        Ok(StoredBackground {
            path: target,
            bytes_written: photo.bytes.len(),
        })
    }

    /// Delete this user's backgrounds stored under other extensions.
    fn remove_stale(&self, user_id: &str, keep: &Path) {
        let prefix = format!("{}{SUFFIX}.", file_stem_for(user_id));
        let Ok(entries) = fs::read_dir(&self.root) else {
            return;
        };
        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            let is_stale = path != keep
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix));
            if is_stale {
                if let Err(err) = fs::remove_file(&path) {
                    warn!(path = %path.display(), %err, "failed to remove stale background");
                }
            }
        }
    }
}

/// Map a user identifier onto a safe, reversible file name stem.
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `_XX`
/// (upper-case hex), so distinct ids never share a stem.
fn file_stem_for(user_id: &str) -> String {
    let mut stem = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "_{byte:02X}");
        }
    }
    stem
}

/// Extension for a stored file of `format`.
///
/// The transport hint is kept only when it names the sniffed format, so the
/// extension always matches the content.
fn extension_for(hint: Option<&str>, format: ImageFormat) -> String {
    let hinted = hint
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| ImageFormat::from_extension(ext) == Some(format));
    hinted.unwrap_or_else(|| {
        format
            .extensions_str()
            .first()
            .map_or_else(|| "img".to_owned(), |ext| (*ext).to_owned())
    })
}
