//! Error types for the factura-core library.

use thiserror::Error;

/// Main error type for the factura library.
#[derive(Error, Debug)]
pub enum FacturaError {
    /// Source document rejected before extraction.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Document understanding service error.
    #[error("extraction service error: {0}")]
    Service(#[from] ServiceError),

    /// Spreadsheet sink error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised for a source document before it reaches the reconciler.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document has zero bytes.
    #[error("{name}: document is empty")]
    Empty { name: String },

    /// The document type is not handled by the pipeline.
    #[error("{name}: unsupported document type")]
    Unsupported { name: String },
}

/// Errors from the remote entity extraction call.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No access token was provided.
    #[error("missing access token")]
    MissingCredentials,

    /// Network or transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors persisting aggregated output.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Reading the existing output failed.
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// Writing the output failed.
    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Result type for the factura library.
pub type Result<T> = std::result::Result<T, FacturaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_message_names_file() {
        let err: FacturaError = DocumentError::Empty {
            name: "acme/obra-1/f001.pdf".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "document error: acme/obra-1/f001.pdf: document is empty"
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = ServiceError::Status {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "service returned 429: quota exceeded");
    }
}
