//! Error taxonomy shared by the repositories and the HTTP boundary.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::value;

/// Base application error: a human message plus a stable machine code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct AppError {
    pub message: String,
    pub code: String,
}

impl AppError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

/// An [`AppError`] that carries the HTTP status to answer with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ApiError {
    #[source]
    pub error: AppError,
    pub status_code: u16,
}

impl ApiError {
    pub const DEFAULT_STATUS: u16 = 400;

    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::with_status(message, code, Self::DEFAULT_STATUS)
    }

    pub fn with_status(message: impl Into<String>, code: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: AppError::new(message, code),
            status_code,
        }
    }
}

/// No document is stored under the requested id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Document not found.")]
pub struct DocumentNotFound {
    pub id: String,
}

impl DocumentNotFound {
    pub const MESSAGE: &'static str = "Document not found.";
    pub const CODE: &'static str = "application/document-not-found";

    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<DocumentNotFound> for AppError {
    fn from(_: DocumentNotFound) -> Self {
        AppError::new(DocumentNotFound::MESSAGE, DocumentNotFound::CODE)
    }
}

/// Everything a repository operation can fail with.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    NotFound(#[from] DocumentNotFound),

    /// Passed through from the store untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The write payload could not be turned into a document.
    #[error("payload could not be encoded: {0}")]
    Encode(#[source] value::Error),

    #[error("document {id} could not be decoded: {source}")]
    Decode {
        id: String,
        #[source]
        source: value::Error,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    /// The application-level view of this error, when it has one.
    pub fn as_app_error(&self) -> Option<AppError> {
        match self {
            RepositoryError::NotFound(err) => Some(AppError::from(err.clone())),
            _ => None,
        }
    }
}

impl From<value::Error> for RepositoryError {
    fn from(err: value::Error) -> Self {
        RepositoryError::Encode(err)
    }
}
