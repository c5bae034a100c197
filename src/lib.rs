//! `msgview`: a safe viewer for Outlook `.msg` and RFC 822 `.eml` files.
//!
//! This crate parses both formats into one normalized [`ParsedEmail`] record
//! with enforced size limits, and decides how much of an untrusted body may
//! be shown: nothing, extracted text, or sanitized HTML inside a sandboxed
//! frame, gated by a one-time acknowledgment.
//!
//! [`ParsedEmail`]: model::email::ParsedEmail

pub mod config;
pub mod error;
pub mod i18n;
pub mod model;
pub mod msg;
pub mod parser;
pub mod preview;
pub mod view;
