//! Email parsing: input checks, the EML parser, and shared header handling.

pub mod eml;
pub mod header;
pub mod input;

use crate::model::limits::Limits;

pub use input::{parse_bytes, parse_file, parse_named, FileKind};

/// Settings passed to every parser at construction.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Size caps for the produced record.
    pub limits: Limits,
    /// Log decoder failure details (`debug` level). Off in normal use so
    /// that nothing about parser internals leaves the process by default.
    pub verbose_diagnostics: bool,
}
