//! Domain values shared by the conversion pipeline.

pub mod conversion;
pub mod error;
pub mod output;
