//! Formatter abstraction and atomic persistence.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The finished file could not be moved into place.
    #[error("Failed to replace {path}: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes a value of type `T` in some textual format.
pub trait Formatter<T: ?Sized>: Send + Sync {
    /// Writes `value` to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write<W: Write + Send>(&self, value: &T, writer: W) -> Result<(), FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;
}

/// Formats `value` into `path`, replacing any existing file atomically.
///
/// The output is written to a temporary file in the destination directory
/// and renamed over `path` once complete, so a crash never leaves a
/// truncated file behind. Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if formatting or any filesystem operation fails.
pub fn persist<T, F>(formatter: &F, value: &T, path: &Path) -> Result<(), FormatError>
where
    T: ?Sized,
    F: Formatter<T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        formatter.write(value, &mut writer)?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| FormatError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Escapes text for inclusion in XML content or attribute values.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
