//! Document assembly pipeline
//!
//! template + replacements → markup → rendered PDF → trimmed PDF + addendum page

mod chrome;
mod options;
mod pipeline;
mod render;
mod types;

pub use chrome::{ChromeRenderer, ChromeSession};
pub use options::*;
pub use pipeline::{render_markup, run, run_request};
pub use render::{RenderSession, Renderer};
pub use types::*;

pub use pdf_assemble::{AssembledPdf, BlankPredicate, NoExtractableText};
pub use pdf_template::{
    ImageBox, Replacement, ReplacementSet, ReplacementValue, SubstitutionOptions,
};
