//! Core data model: normalized headers, the parsed email record, and size limits.

pub mod email;
pub mod limits;
