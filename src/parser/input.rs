//! Input boundary: decide the file type from its name, enforce size limits,
//! read the whole file and dispatch to the matching parser.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, ViewerError};
use crate::model::email::ParsedEmail;
use crate::msg::MsgParser;
use crate::parser::{eml, ParseOptions};

/// Supported container types, chosen by file extension (never by content).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Msg,
    Eml,
}

impl FileKind {
    /// Detect the type from a path or file name (case-insensitive extension).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "msg" => Ok(Self::Msg),
            "eml" => Ok(Self::Eml),
            _ => Err(ViewerError::UnsupportedType(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )),
        }
    }
}

/// Check, read and parse a file from disk.
///
/// Type and size are validated from the path and metadata alone, so empty,
/// oversized or unsupported files are rejected without reading their content.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedEmail> {
    let path = path.as_ref();
    let kind = FileKind::from_path(path)?;

    let size = std::fs::metadata(path)
        .map_err(|e| ViewerError::read(path, e))?
        .len();
    check_size(size, options)?;

    let data = std::fs::read(path).map_err(|e| ViewerError::read(path, e))?;
    info!(path = %path.display(), ?kind, size, "Read input file");

    parse_bytes(kind, &data, options)
}

/// Parse an in-memory file whose type is already known.
pub fn parse_bytes(kind: FileKind, data: &[u8], options: &ParseOptions) -> Result<ParsedEmail> {
    check_size(data.len() as u64, options)?;
    debug!(?kind, len = data.len(), "Parsing input");

    match kind {
        FileKind::Eml => Ok(eml::parse_eml_bytes(data, &options.limits)),
        FileKind::Msg => MsgParser::new(options.clone()).parse(data),
    }
}

/// Parse an in-memory file, deriving its type from `name`.
pub fn parse_named(name: &str, data: &[u8], options: &ParseOptions) -> Result<ParsedEmail> {
    parse_bytes(FileKind::from_path(name)?, data, options)
}

fn check_size(size: u64, options: &ParseOptions) -> Result<()> {
    let limit = options.limits.max_file_size;
    if size == 0 {
        return Err(ViewerError::EmptyInput);
    }
    if size > limit {
        return Err(ViewerError::FileTooLarge { size, limit });
    }
    Ok(())
}
