use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("Unresolved sheet link: {0}")]
    UnresolvedLink(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Mon not found: {0}")]
    MonNotFound(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl DexError {
    /// Truncate a response body to avoid logging a whole sheet export
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        DexError::Status {
            status,
            body: Self::truncate_body(body),
        }
    }
}
