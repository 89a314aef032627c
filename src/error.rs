//! Pass-level import errors
//!
//! Row-level problems never show up here: they are counted as skips. Every
//! variant below terminates the pass and no summary is produced.

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Malformed CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Failed to load {table} lookup: {source}")]
    LookupLoad {
        table: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write chunk {chunk} ({committed_chunks} earlier chunks already committed): {source}")]
    Write {
        chunk: usize,
        committed_chunks: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Upload is {size} bytes, limit is {limit} bytes")]
    UploadTooLarge { size: usize, limit: usize },
}

impl ImportError {
    /// Stable code sent back in `ErrorResponse`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::LookupLoad { .. } => "LOOKUP_LOAD_ERROR",
            Self::Write { .. } => "WRITE_ERROR",
            Self::UploadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }
}
