//! Scoped temp-file handling for speech/image payloads.

use crate::error::StoreError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// An uploaded payload persisted to a collision-resistant temp file
/// (timestamp + sanitized original name + random suffix). The file is
/// removed when the value drops, on every exit path of the request,
/// including the inference-failure path.
pub struct ScopedUpload {
    file: NamedTempFile,
}

fn sanitized(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

impl ScopedUpload {
    pub fn persist(
        dir: &Path,
        original_name: &str,
        payload: &[u8],
    ) -> Result<Self, StoreError> {
        if payload.is_empty() {
            return Err(StoreError::InvalidInput("empty upload".to_string()));
        }
        fs::create_dir_all(dir)?;
        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut file = tempfile::Builder::new()
            .prefix(&format!("upload_{}_{}_", timestamp, sanitized(original_name)))
            .tempfile_in(dir)?;
        file.write_all(payload)?;
        file.flush()?;
        Ok(ScopedUpload { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
