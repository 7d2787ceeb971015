//! Application services layer.

pub mod error;
pub mod export;
pub mod renderer;
pub mod stylesheet;
