use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Rendered document is corrupt: {0}")]
    CorruptRenderedDocument(String),
    #[error("Addendum is missing or unreadable: {0}")]
    MissingAddendum(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AssembleError>;

/// Final document: body pages followed by the addendum page
#[derive(Debug, Clone)]
pub struct AssembledPdf {
    pub bytes: Vec<u8>,
    /// Pages in the output, addendum included
    pub page_count: usize,
    /// Trailing blank pages dropped from the rendered body
    pub blank_pages_removed: usize,
}
