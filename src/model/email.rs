//! The normalized email record produced by both parsers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::limits::{cap_chars, Limits, TRUNCATION_MARKER};

/// Container format a [`ParsedEmail`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceFormat {
    /// Outlook compound-file message.
    Msg,
    /// RFC 822 text message.
    Eml,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Msg => write!(f, "MSG"),
            Self::Eml => write!(f, "EML"),
        }
    }
}

/// A single header, trimmed and length-capped. Never empty on either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// The result of parsing one file.
///
/// Built once by a parser and read-only afterwards. Header order matches
/// the source and duplicate names are kept.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedEmail {
    headers: Vec<Header>,
    body: String,
    body_truncated: bool,
    subject: String,
    from: String,
    to: String,
    date: String,
    source_format: SourceFormat,
}

impl ParsedEmail {
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Extracted body (plain text or HTML), possibly ending in the truncation marker.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// `true` if the body hit the size cap.
    pub fn is_truncated(&self) -> bool {
        self.body_truncated
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    /// First value of a header (case-insensitive name match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }

    /// All values of a header, in source order.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.is(name))
            .map(|h| h.value.as_str())
    }

    /// Headers whose name or value contains `needle` (case-insensitive).
    ///
    /// An empty needle matches everything.
    pub fn filter_headers(&self, needle: &str) -> Vec<&Header> {
        let needle = needle.trim().to_lowercase();
        self.headers
            .iter()
            .filter(|h| {
                needle.is_empty()
                    || h.name.to_lowercase().contains(&needle)
                    || h.value.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Best-effort interpretation of the `date` scalar.
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        crate::parser::header::parse_date(&self.date)
    }
}

/// Scalar fields derived from well-known headers or structured properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scalar {
    Subject,
    From,
    To,
    Date,
}

impl Scalar {
    /// Map a header name to the scalar it feeds, if any.
    pub(crate) fn for_header(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "subject" => Some(Self::Subject),
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// Incremental constructor for [`ParsedEmail`] that enforces every [`Limits`] cap.
pub(crate) struct EmailBuilder {
    limits: Limits,
    format: SourceFormat,
    headers: Vec<Header>,
    dropped_headers: usize,
    subject: String,
    from: String,
    to: String,
    date: String,
    body: String,
}

impl EmailBuilder {
    pub(crate) fn new(format: SourceFormat, limits: Limits) -> Self {
        Self {
            limits,
            format,
            headers: Vec::new(),
            dropped_headers: 0,
            subject: String::new(),
            from: String::new(),
            to: String::new(),
            date: String::new(),
            body: String::new(),
        }
    }

    /// Trim, cap and append a header. Returns `false` if it was discarded as empty.
    ///
    /// Headers named Subject/From/To/Date also overwrite their scalar, so the
    /// last occurrence wins. Headers past `max_headers` still feed scalars
    /// but are not stored.
    pub(crate) fn push_header(&mut self, name: &str, value: &str) -> bool {
        let name = cap_chars(name.trim(), self.limits.max_header_name_chars).trim_end();
        let value = cap_chars(value.trim(), self.limits.max_header_value_chars).trim_end();
        if name.is_empty() || value.is_empty() {
            return false;
        }

        if let Some(scalar) = Scalar::for_header(name) {
            self.set_scalar(scalar, value);
        }

        if self.headers.len() < self.limits.max_headers {
            self.headers.push(Header {
                name: name.to_string(),
                value: value.to_string(),
            });
        } else {
            self.dropped_headers += 1;
        }
        true
    }

    /// Overwrite a scalar with a trimmed, capped value. Empty values are ignored.
    pub(crate) fn set_scalar(&mut self, scalar: Scalar, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let (slot, max) = match scalar {
            Scalar::Subject => (&mut self.subject, self.limits.max_subject_chars),
            Scalar::From => (&mut self.from, self.limits.max_from_chars),
            Scalar::To => (&mut self.to, self.limits.max_to_chars),
            Scalar::Date => (&mut self.date, self.limits.max_date_chars),
        };
        *slot = cap_chars(value, max).to_string();
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub(crate) fn finish(mut self) -> ParsedEmail {
        let mut body_truncated = false;
        if let Some((idx, _)) = self.body.char_indices().nth(self.limits.max_body_chars) {
            self.body.truncate(idx);
            self.body.push_str(TRUNCATION_MARKER);
            body_truncated = true;
        }

        debug!(
            format = %self.format,
            headers = self.headers.len(),
            dropped_headers = self.dropped_headers,
            body_truncated,
            "Built parsed email"
        );

        ParsedEmail {
            headers: self.headers,
            body: self.body,
            body_truncated,
            subject: self.subject,
            from: self.from,
            to: self.to,
            date: self.date,
            source_format: self.format,
        }
    }
}
