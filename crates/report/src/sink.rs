//! Output sinks
//!
//! Rendering always completes in memory before any byte reaches a sink, so a
//! failed generation never leaves output behind. File output goes through a
//! temp file and rename: the final path either holds a complete report or
//! nothing new.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::error::ReportError;

/// Write complete output to any writer
pub fn write_to<W: Write>(bytes: &[u8], mut writer: W) -> Result<(), ReportError> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write complete output to an async writer; the only await point of a generation
pub async fn write_to_async<W: AsyncWrite + Unpin>(
    bytes: &[u8],
    mut writer: W,
) -> Result<(), ReportError> {
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Sibling temp path in the same directory, so the final rename stays on one filesystem
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// Write `bytes` to `path` atomically
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_file = temp_path_for(path);

    if let Err(e) = write_and_rename(&tmp_file, path, bytes) {
        let _ = fs::remove_file(&tmp_file);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote output");
    Ok(())
}

fn write_and_rename(tmp_file: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_file)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(tmp_file, path)
}

/// Async variant of [`write_file_atomic`]
pub async fn write_file_atomic_async(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_file = temp_path_for(path);

    let result = async {
        let mut file = tokio::fs::File::create(&tmp_file).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp_file, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp_file).await;
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote output");
    Ok(())
}
