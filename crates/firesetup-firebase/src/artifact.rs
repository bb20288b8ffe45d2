//! Configuration artifact persistence
//!
//! Decodes the base64 payload returned by `getConfig` and writes it in the
//! platform's native format. The content is re-encoded faithfully: keys keep
//! their order and nothing is added or dropped.

use crate::error::{FirebaseError, Result};
use crate::platform::Platform;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const BINARY_PLIST_MAGIC: &[u8] = b"bplist00";

/// Resolve the destination directory; empty means the working directory
pub fn normalize_destination(destination: &str) -> PathBuf {
    if destination.is_empty() {
        PathBuf::new()
    } else {
        PathBuf::from(destination)
    }
}

/// Decode `encoded` and write it to `destination/filename`
///
/// Returns the path of the written file.
pub async fn save(
    encoded: &str,
    filename: &str,
    platform: Platform,
    destination: &str,
) -> Result<PathBuf> {
    let decoded = STANDARD.decode(encoded.trim())?;
    let rendered = match platform {
        Platform::Android => render_json(&decoded)?,
        Platform::Ios => render_plist(&decoded)?,
    };

    let dir = normalize_destination(destination);
    if !dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(&dir).await?;
    }

    let path = dir.join(safe_filename(filename)?);
    tokio::fs::write(&path, rendered).await?;

    tracing::info!(
        "Configuration for {} app saved as {}",
        platform.display_name(),
        path.display()
    );
    Ok(path)
}

/// Keep only the last path component of a remote-suggested filename
fn safe_filename(filename: &str) -> Result<&str> {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| FirebaseError::InvalidFilename(filename.to_string()))
}

/// JSON with four-space indentation; non-ASCII is written verbatim
fn render_json(decoded: &[u8]) -> Result<Vec<u8>> {
    let document: serde_json::Value = serde_json::from_slice(decoded)?;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    document.serialize(&mut serializer)?;
    Ok(out)
}

/// Property list in the encoding it arrived in (binary or XML)
fn render_plist(decoded: &[u8]) -> Result<Vec<u8>> {
    let document = plist::Value::from_reader(Cursor::new(decoded))?;

    let mut out = Vec::new();
    if decoded.starts_with(BINARY_PLIST_MAGIC) {
        document.to_writer_binary(&mut out)?;
    } else {
        document.to_writer_xml(&mut out)?;
    }
    Ok(out)
}
