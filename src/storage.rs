//! Object storage for uploaded exam files and vaccine proofs.
//!
//! Objects are addressed by `{user_id}/{unix_millis}-{filename}` and exposed
//! through a public URL under `{public_origin}/files/`. The store is injected
//! into [`crate::backend::Backend`]; production uses the filesystem, tests use
//! the in-memory store.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

/// Maximum accepted upload size (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for attachments.
pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png", "image/jpg"];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A file supplied alongside a record.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Backend object storage.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing nothing: keys are unique per upload.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Public retrieval URL for a stored key.
    fn public_url(&self, key: &str) -> String;
}

/// Build the object key for an upload.
pub fn object_key(user_id: &Uuid, unix_millis: i64, filename: &str) -> String {
    format!("{user_id}/{unix_millis}-{}", sanitize_filename(filename))
}

/// Check an attachment against the MIME allow-list and the size cap.
///
/// The declared content type wins; otherwise the type is guessed from the
/// filename extension. Returns the accepted MIME type.
pub fn validate_upload(attachment: &Attachment) -> Result<String, StorageError> {
    let mime = match attachment.content_type.as_deref() {
        Some(declared) if !declared.trim().is_empty() => declared.trim().to_ascii_lowercase(),
        _ => mime_guess::from_path(&attachment.filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    };

    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(StorageError::UnsupportedType(mime));
    }
    if attachment.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge {
            size: attachment.bytes.len(),
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(mime)
}

/// Sanitize a filename: removes path traversal and special characters.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");
    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "file".into()
    } else {
        sanitized
    }
}

fn checked_relative_path(key: &str) -> Result<PathBuf, StorageError> {
    let path = Path::new(key);
    let clean = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if clean {
        Ok(path.to_path_buf())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════
// Filesystem store
// ═══════════════════════════════════════════════════════════

/// Stores objects as files under a root directory.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_origin: &str) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base: format!("{}/files", public_origin.trim_end_matches('/')),
        })
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.root.join(checked_relative_path(key)?);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        tracing::debug!(key, size = bytes.len(), "Object stored");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.root.join(checked_relative_path(key)?);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base)
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// Keeps objects in a map. Used by the in-memory backend.
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    public_base: String,
}

impl MemoryObjectStore {
    pub fn new(public_origin: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base: format!("{}/files", public_origin.trim_end_matches('/')),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        checked_relative_path(key)?;
        self.objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object map lock poisoned".into()))?
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object map lock poisoned".into()))?
            .get(key)
            .cloned())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(filename: &str, content_type: Option<&str>, size: usize) -> Attachment {
        Attachment {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn object_key_namespaced_by_user_and_timestamp() {
        let user = Uuid::nil();
        let key = object_key(&user, 1_734_000_000_000, "blood test.pdf");
        assert_eq!(
            key,
            "00000000-0000-0000-0000-000000000000/1734000000000-blood_test.pdf"
        );
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("scan 01.PNG"), "scan_01.PNG");
    }

    #[test]
    fn upload_type_guessed_from_extension() {
        assert_eq!(validate_upload(&attachment("exam.pdf", None, 10)).unwrap(), "application/pdf");
        assert_eq!(validate_upload(&attachment("proof.png", None, 10)).unwrap(), "image/png");
    }

    #[test]
    fn upload_rejects_disallowed_type() {
        let err = validate_upload(&attachment("notes.txt", None, 10)).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedType(t) if t == "text/plain"));

        let err = validate_upload(&attachment("exam.pdf", Some("application/zip"), 10)).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedType(_)));
    }

    #[test]
    fn upload_size_cap_is_inclusive() {
        assert!(validate_upload(&attachment("exam.pdf", None, MAX_UPLOAD_BYTES)).is_ok());
        let err = validate_upload(&attachment("exam.pdf", None, MAX_UPLOAD_BYTES + 1)).unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { .. }));
    }

    #[test]
    fn local_store_put_get_and_url() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(tmp.path(), "http://localhost:8787/").unwrap();

        store.put("user-1/1-exam.pdf", b"%PDF-1.4").unwrap();
        assert_eq!(store.get("user-1/1-exam.pdf").unwrap().unwrap(), b"%PDF-1.4");
        assert!(store.get("user-1/missing.pdf").unwrap().is_none());
        assert_eq!(
            store.public_url("user-1/1-exam.pdf"),
            "http://localhost:8787/files/user-1/1-exam.pdf"
        );
    }

    #[test]
    fn stores_reject_escaping_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let local = LocalObjectStore::new(tmp.path(), "http://localhost").unwrap();
        assert!(matches!(local.put("../outside", b"x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(local.put("/abs/path", b"x"), Err(StorageError::InvalidKey(_))));

        let memory = MemoryObjectStore::new("http://localhost");
        assert!(memory.put("a/../../b", b"x").is_err());
        assert!(memory.is_empty());
    }
}
