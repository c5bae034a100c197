//! RFC 822 header handling shared by the EML and MSG parsers: line
//! splitting, header recognition, folding, text decoding and date parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::model::email::EmailBuilder;

/// Decode raw message bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!("Input is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Split text into physical lines, accepting both `\r\n` and `\n`.
///
/// Unlike [`str::lines`], a trailing newline yields a final empty line, so
/// joining the result with `\n` reproduces the input minus carriage returns.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Recognize a header start line: a run of non-whitespace characters at
/// column 0 followed by a colon.
///
/// Returns `(name, value)` split at the first colon.
pub fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some((name, &line[colon + 1..]))
}

/// Accumulates one header at a time, joining folded continuation lines.
#[derive(Debug, Default)]
pub(crate) struct HeaderFolder {
    pending: Option<(String, String)>,
}

impl HeaderFolder {
    /// Consume one line of the header section.
    ///
    /// Lines that are neither a header start nor a continuation are skipped.
    pub(crate) fn feed(&mut self, line: &str, out: &mut EmailBuilder) {
        if line.starts_with(char::is_whitespace) {
            if let Some((_, value)) = self.pending.as_mut() {
                let continued = line.trim();
                if !continued.is_empty() {
                    value.push(' ');
                    value.push_str(continued);
                }
            }
        } else if let Some((name, value)) = split_header_line(line) {
            self.flush(out);
            self.pending = Some((name.to_string(), value.to_string()));
        }
    }

    /// Hand the pending header, if any, to the builder.
    pub(crate) fn flush(&mut self, out: &mut EmailBuilder) {
        if let Some((name, value)) = self.pending.take() {
            out.push_header(&name, &value);
        }
    }
}

/// Parse a block that contains only header lines (no body), such as the
/// transport header blob stored in an Outlook message.
pub(crate) fn parse_header_block(block: &str, out: &mut EmailBuilder) {
    let mut folder = HeaderFolder::default();
    for line in split_lines(block) {
        folder.feed(line, out);
    }
    folder.flush(out);
}

/// Parse an email date string in various common formats.
///
/// Supports RFC 2822, ISO 8601, and the usual broken real-world variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(trimmed);
    let candidates = [no_dow.to_string(), replace_named_tz(no_dow)];

    const FORMATS: [&str; 6] = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M %z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for candidate in &candidates {
        for fmt in FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    mail_parser_date(trimmed)
}

/// Last resort: let `mail-parser` interpret the value inside a minimal message.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = mail_parser::MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Strip a leading day-of-week prefix ("Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> &str {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            let rest = rest.strip_prefix(',').unwrap_or(rest);
            if rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    s
}

/// Replace a trailing timezone abbreviation with its numeric offset.
fn replace_named_tz(s: &str) -> String {
    const TZS: [(&str, &str); 11] = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CEST", "+0200"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    for (name, offset) in TZS {
        if let Some(head) = s.strip_suffix(name) {
            return format!("{head}{offset}");
        }
    }
    s.to_string()
}
