//! Typed view of the Outlook message properties this crate understands.
//!
//! Every field is optional: real-world files omit any of them, and the
//! normalizer decides what to do with the gaps.

use chrono::{DateTime, Utc};

/// MAPI properties extracted from a `.msg` container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MsgProperties {
    /// `PR_TRANSPORT_MESSAGE_HEADERS`: the original internet headers, if kept.
    pub transport_headers: Option<String>,
    pub subject: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub submit_time: Option<DateTime<Utc>>,
    pub message_id: Option<String>,
    pub thread_topic: Option<String>,
    /// `PR_CONVERSATION_INDEX`, an opaque binary blob.
    pub thread_index: Option<Vec<u8>>,
    pub body_text: Option<String>,
    /// HTML body stored as a string property.
    pub body_html: Option<String>,
    /// HTML body stored as a binary property (usually UTF-8 or ASCII).
    pub body_html_bytes: Option<Vec<u8>>,
    /// Only presence matters: compressed RTF is never decompressed.
    pub has_compressed_rtf: bool,
    pub recipients: Vec<Recipient>,
}

impl MsgProperties {
    /// `true` if not a single property was found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of the recipient table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub kind: RecipientKind,
}

impl Recipient {
    /// The address if present, otherwise the display name.
    pub fn address_or_name(&self) -> Option<&str> {
        non_empty(self.email.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }
}

/// `PR_RECIPIENT_TYPE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
    /// Missing or unrecognized type.
    #[default]
    Unspecified,
}

impl RecipientKind {
    /// Map the raw MAPI value (`MAPI_TO = 1`, `MAPI_CC = 2`, `MAPI_BCC = 3`).
    ///
    /// The high bit (`MAPI_P1`) marks resent recipients and is ignored.
    pub fn from_mapi(value: Option<u32>) -> Self {
        match value.map(|v| v & 0x0FFF_FFFF) {
            Some(1) => Self::To,
            Some(2) => Self::Cc,
            Some(3) => Self::Bcc,
            _ => Self::Unspecified,
        }
    }
}

/// Trim a property value and drop it if nothing is left.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value
        .map(|v| v.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .filter(|v| !v.is_empty())
}
