use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::infrastructure::proofs::{MAX_PROOF_BYTES, ProofStore};

#[test]
fn validation_rejects_disallowed_mime_types() {
    let result = ProofStore::validate("text/html", 128);
    assert!(matches!(result, Err(LedgerError::UnsupportedFileType(_))));
    assert!(ProofStore::validate("image/png", 128).is_ok());
    assert!(ProofStore::validate("application/pdf", 128).is_ok());
}

#[test]
fn validation_enforces_the_size_ceiling() {
    assert!(ProofStore::validate("image/jpeg", MAX_PROOF_BYTES).is_ok());
    let result = ProofStore::validate("image/jpeg", MAX_PROOF_BYTES + 1);
    assert!(matches!(result, Err(LedgerError::FileTooLarge(_))));
}

#[tokio::test]
async fn save_writes_under_a_per_group_directory() {
    let root = std::env::temp_dir().join(format!("ajoledger-proofs-{}", Uuid::new_v4()));
    let store = ProofStore::new(&root);
    let group_id = Uuid::new_v4();

    let stored = store
        .save(group_id, "receipt.png", "image/png", b"not-really-a-png")
        .await
        .unwrap();

    assert!(stored.file_name.ends_with(".png"));
    assert_eq!(stored.url, format!("/proofs/{}/{}", group_id, stored.file_name));

    let on_disk = root.join(group_id.to_string()).join(&stored.file_name);
    let bytes = tokio::fs::read(&on_disk).await.unwrap();
    assert_eq!(bytes, b"not-really-a-png");

    tokio::fs::remove_dir_all(&root).await.unwrap();
}

#[tokio::test]
async fn save_rejects_before_touching_the_filesystem() {
    let root = std::env::temp_dir().join(format!("ajoledger-proofs-{}", Uuid::new_v4()));
    let store = ProofStore::new(&root);
    let group_id = Uuid::new_v4();

    let result = store
        .save(group_id, "notes.txt", "text/plain", b"hello")
        .await;
    assert!(matches!(result, Err(LedgerError::UnsupportedFileType(_))));
    assert!(!root.exists());
}
