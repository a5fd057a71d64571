mod assemble;
mod blank;
mod copy;
mod io;
mod tree;
mod types;

pub use assemble::{
    append_first_page, assemble, assemble_sync, assemble_with, trim_trailing_blank_pages,
};
pub use blank::{BlankPredicate, NoExtractableText, page_content};
pub use copy::copy_object_deep;
pub use io::{load_pdf, save_pdf, save_pdf_to_vec};
pub use types::*;
