use std::sync::Arc;

use mime::Mime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Document, DocumentCategory, DocumentDraft};
use super::policy::{authorize, AuthorizationError, Capability};
use super::repository::{DocumentStore, RepositoryError};
use super::session::Session;

/// Largest proof accepted by the upload step.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// File metadata as received from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub file_name: String,
    pub size_bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("file name is empty")]
    MissingName,
    #[error("file '{0}' is empty")]
    Empty(String),
    #[error("file '{name}' is {size_bytes} bytes; the limit is {MAX_UPLOAD_BYTES}")]
    TooLarge { name: String, size_bytes: u64 },
    #[error("file '{name}' has unsupported type {content_type}; use PDF, JPG or PNG")]
    UnsupportedType { name: String, content_type: String },
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

fn accepted_types() -> [Mime; 3] {
    [mime::APPLICATION_PDF, mime::IMAGE_JPEG, mime::IMAGE_PNG]
}

/// Content type guessed from the extension, restricted to what reviewers can open.
pub fn detect_content_type(file_name: &str) -> Result<Mime, DocumentError> {
    let guessed = mime_guess::from_path(file_name).first_or_octet_stream();
    if accepted_types()
        .iter()
        .any(|accepted| accepted.essence_str() == guessed.essence_str())
    {
        Ok(guessed)
    } else {
        Err(DocumentError::UnsupportedType {
            name: file_name.to_string(),
            content_type: guessed.essence_str().to_string(),
        })
    }
}

fn check_upload(upload: &FileUpload) -> Result<Mime, DocumentError> {
    let name = upload.file_name.trim();
    if name.is_empty() {
        return Err(DocumentError::MissingName);
    }
    if upload.size_bytes == 0 {
        return Err(DocumentError::Empty(name.to_string()));
    }
    if upload.size_bytes > MAX_UPLOAD_BYTES {
        return Err(DocumentError::TooLarge {
            name: name.to_string(),
            size_bytes: upload.size_bytes,
        });
    }
    detect_content_type(name)
}

/// Accepts proofs for the wizard's document step.
pub struct DocumentService<D> {
    store: Arc<D>,
}

impl<D> DocumentService<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    pub fn upload(
        &self,
        session: &Session,
        upload: FileUpload,
        category: DocumentCategory,
    ) -> Result<Document, DocumentError> {
        authorize(session.role(), Capability::SubmitApplication)?;
        let content_type = match check_upload(&upload) {
            Ok(content_type) => content_type,
            Err(err) => {
                warn!(file_name = %upload.file_name, error = %err, "upload refused");
                return Err(err);
            }
        };

        let document = self.store.store(DocumentDraft {
            owner: session.user_id().clone(),
            name: upload.file_name.trim().to_string(),
            category,
            content_type: content_type.essence_str().to_string(),
            size_bytes: upload.size_bytes,
        })?;
        info!(
            document_id = %document.id,
            category = category.label(),
            size_bytes = upload.size_bytes,
            "document uploaded"
        );
        Ok(document)
    }

    /// Pre-screen an uploaded document against the upload rules before a reviewer sees it.
    pub fn verify(&self, document: &Document) -> bool {
        let upload = FileUpload {
            file_name: document.name.clone(),
            size_bytes: document.size_bytes,
        };
        match check_upload(&upload) {
            Ok(content_type) => content_type.essence_str() == document.content_type,
            Err(_) => false,
        }
    }
}
