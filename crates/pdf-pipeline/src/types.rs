use pdf_assemble::AssembleError;
use pdf_template::TemplateError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Malformed replacement at index {index}: {reason}")]
    MalformedReplacement { index: usize, reason: String },
    #[error("Substitution failed: {0}")]
    Substitution(String),
    #[error("Cannot read {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Render failed: {0}")]
    RenderFailure(String),
    #[error("Render did not finish within {0:?}")]
    RenderTimeout(Duration),
    #[error("Rendered document is corrupt: {0}")]
    CorruptRenderedDocument(String),
    #[error("Addendum is missing or unreadable: {0}")]
    MissingAddendum(String),
    #[error("Assembly failed: {0}")]
    Assembly(#[source] AssembleError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Errors the caller can fix by correcting the request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::MalformedReplacement { .. }
        )
    }
}

impl From<TemplateError> for PipelineError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
            TemplateError::MalformedReplacement { index, reason } => {
                PipelineError::MalformedReplacement { index, reason }
            }
            other => PipelineError::Substitution(other.to_string()),
        }
    }
}

impl From<AssembleError> for PipelineError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::CorruptRenderedDocument(msg) => {
                PipelineError::CorruptRenderedDocument(msg)
            }
            AssembleError::MissingAddendum(msg) => PipelineError::MissingAddendum(msg),
            other => PipelineError::Assembly(other),
        }
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Portrait: height > width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }
}

/// Physical page format every rendered page shares
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFormat {
    pub paper: PaperSize,
    pub orientation: Orientation,
    /// Print background colors and images
    pub print_background: bool,
}

impl Default for PageFormat {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            print_background: true,
        }
    }
}

impl PageFormat {
    /// CSS `@page` size value, e.g. `210mm 297mm`
    pub fn css_page_size(&self) -> String {
        let (w, h) = self.paper.dimensions_with_orientation(self.orientation);
        format!("{}mm {}mm", w, h)
    }
}

/// Media type of the assembled output
pub const CONTENT_TYPE: &str = "application/pdf";

/// Finished document handed back to the caller
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    /// Suggested download name
    pub filename: String,
    pub page_count: usize,
}

impl AssembledDocument {
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}
