mod replacement;
mod request;
mod resolve;
mod types;

pub use replacement::*;
pub use request::{parse_request, parse_request_str};
pub use resolve::{resolve, resolve_with};
pub use types::*;
