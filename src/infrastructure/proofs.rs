//! Payment-proof file store. Uploads are validated against a MIME allow-list
//! and a size ceiling, then written under a per-group directory with a
//! generated unique name.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::errors::LedgerError;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "application/pdf"];
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StoredProof {
    pub file_name: String,
    pub url: String,
}

pub struct ProofStore {
    root: PathBuf,
}

impl ProofStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProofStore { root: root.into() }
    }

    /// Rejects disallowed MIME types and oversized payloads without touching
    /// the filesystem.
    pub fn validate(content_type: &str, size: usize) -> Result<(), LedgerError> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(LedgerError::UnsupportedFileType(content_type.to_string()));
        }
        if size > MAX_PROOF_BYTES {
            return Err(LedgerError::FileTooLarge(size));
        }
        Ok(())
    }

    pub async fn save(
        &self,
        group_id: Uuid,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredProof, LedgerError> {
        Self::validate(content_type, bytes.len())?;

        let dir = self.root.join(group_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LedgerError::InternalServerError(format!("Upload dir error: {}", e)))?;

        let ext = original_name.rsplit('.').next().unwrap_or("bin");
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        let file_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, ext);
        let path = dir.join(&file_name);

        debug!("Writing proof file to {:?}", path);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| LedgerError::InternalServerError(format!("Upload write error: {}", e)))?;

        info!("Stored proof {} for group {}", file_name, group_id);
        Ok(StoredProof {
            url: format!("/proofs/{}/{}", group_id, file_name),
            file_name,
        })
    }
}
