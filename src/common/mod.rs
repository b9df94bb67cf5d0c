//! Pieces shared across the acquisition binaries

pub mod cli;
pub use cli::{AcquireArgs, CommonArgs, DumpArgs};
