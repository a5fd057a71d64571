use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Malformed replacement at index {index}: {reason}")]
    MalformedReplacement { index: usize, reason: String },
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

impl TemplateError {
    /// True for errors caused by the caller's replacement list
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TemplateError::InvalidInput(_) | TemplateError::MalformedReplacement { .. }
        )
    }
}
