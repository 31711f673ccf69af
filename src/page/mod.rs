//! Page processing: locating a page on the published site and rewriting
//! its image sources.

mod error;
mod rewrite;
mod route;
mod write;

pub use error::PageError;
pub use rewrite::{ImageRewriter, RewriteReport};
pub use route::Subdir;
pub use write::process_page;
