//! Shared utilities.

pub mod html;
pub mod source;
