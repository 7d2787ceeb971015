//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod chromium;
pub mod error;
pub mod http;
pub mod retention;
pub mod storage;
pub mod telemetry;
