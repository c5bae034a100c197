//! Outlook `.msg` support: container decoding and normalization into a
//! [`ParsedEmail`].

pub mod container;
pub mod properties;

use base64::Engine;
use tracing::debug;

use crate::error::{Result, ViewerError};
use crate::model::email::{EmailBuilder, ParsedEmail, Scalar, SourceFormat};
use crate::model::limits::Limits;
use crate::parser::header;
use crate::parser::ParseOptions;

pub use container::{CfbDecoder, DecodeError, MsgDecoder};
pub use properties::{MsgProperties, Recipient, RecipientKind};

/// Body shown when the message only carries compressed RTF.
pub const RTF_PLACEHOLDER: &str = "[Rich text (RTF) content cannot be displayed]";

/// Recipients listed per `To`/`Cc` header and in the `to` scalar.
const MAX_LISTED_RECIPIENTS: usize = 10;

/// Parser for `.msg` files.
///
/// Decoding of the compound file is delegated to a [`MsgDecoder`]; this type
/// owns everything after that: header extraction or reconstruction, body
/// selection, scalars and limits.
#[derive(Debug, Clone)]
pub struct MsgParser<D = CfbDecoder> {
    decoder: D,
    options: ParseOptions,
}

impl MsgParser<CfbDecoder> {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_decoder(CfbDecoder, options)
    }
}

impl<D: MsgDecoder> MsgParser<D> {
    pub fn with_decoder(decoder: D, options: ParseOptions) -> Self {
        Self { decoder, options }
    }

    /// Parse a `.msg` file held in memory.
    ///
    /// Any decoder failure is reported as [`ViewerError::ParseFailure`]; the
    /// underlying reason is only logged when verbose diagnostics are enabled.
    pub fn parse(&self, data: &[u8]) -> Result<ParsedEmail> {
        match self.decoder.decode(data) {
            Ok(props) => Ok(normalize(&props, &self.options.limits)),
            Err(e) => {
                if self.options.verbose_diagnostics {
                    debug!(error = %e, len = data.len(), "MSG container decoding failed");
                }
                Err(ViewerError::ParseFailure)
            }
        }
    }
}

/// Fold decoded properties into a [`ParsedEmail`].
pub fn normalize(props: &MsgProperties, limits: &Limits) -> ParsedEmail {
    let mut out = EmailBuilder::new(SourceFormat::Msg, *limits);

    match properties::non_empty(props.transport_headers.as_deref()) {
        Some(blob) => header::parse_header_block(blob, &mut out),
        None => reconstruct_headers(props, &mut out),
    }

    // Structured properties take precedence over header-derived scalars
    if let Some(subject) = properties::non_empty(props.subject.as_deref()) {
        out.set_scalar(Scalar::Subject, subject);
    }
    if let Some(from) = sender_display(props) {
        out.set_scalar(Scalar::From, &from);
    }
    out.set_scalar(Scalar::To, &join_recipients(props, is_primary));
    if let Some(date) = props.delivery_time.or(props.submit_time) {
        out.set_scalar(Scalar::Date, &date.to_rfc2822());
    }

    out.set_body(select_body(props));
    out.finish()
}

/// Build headers from individual properties when no transport headers exist.
fn reconstruct_headers(props: &MsgProperties, out: &mut EmailBuilder) {
    let text = |v: &Option<String>| properties::non_empty(v.as_deref()).map(str::to_string);
    let mapped = [
        ("Subject", text(&props.subject)),
        ("From-Name", text(&props.sender_name)),
        ("From", text(&props.sender_email)),
        ("Date", props.delivery_time.map(|d| d.to_rfc2822())),
        ("Date-Submitted", props.submit_time.map(|d| d.to_rfc2822())),
        ("Message-ID", text(&props.message_id)),
        ("Thread-Topic", text(&props.thread_topic)),
        (
            "Thread-Index",
            props
                .thread_index
                .as_ref()
                .filter(|b| !b.is_empty())
                .map(|b| base64::engine::general_purpose::STANDARD.encode(b)),
        ),
        ("To", Some(join_recipients(props, is_primary))),
        ("Cc", Some(join_recipients(props, |k| k == RecipientKind::Cc))),
    ];

    for (name, value) in mapped {
        if let Some(value) = value {
            out.push_header(name, &value);
        }
    }
}

/// Recipients that belong on the `To` line: explicit "to" or no type at all.
fn is_primary(kind: RecipientKind) -> bool {
    matches!(kind, RecipientKind::To | RecipientKind::Unspecified)
}

/// Join up to ten recipient addresses (or names) of the selected kinds.
fn join_recipients(props: &MsgProperties, wanted: impl Fn(RecipientKind) -> bool) -> String {
    props
        .recipients
        .iter()
        .filter(|r| wanted(r.kind))
        .filter_map(Recipient::address_or_name)
        .take(MAX_LISTED_RECIPIENTS)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Name <email>`, or whichever half is present.
fn sender_display(props: &MsgProperties) -> Option<String> {
    let name = properties::non_empty(props.sender_name.as_deref());
    let email = properties::non_empty(props.sender_email.as_deref());
    match (name, email) {
        (Some(name), Some(email)) if name != email => Some(format!("{name} <{email}>")),
        (_, Some(email)) => Some(email.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}

/// Plain text, then HTML string, then raw HTML bytes, then the RTF placeholder.
fn select_body(props: &MsgProperties) -> String {
    if let Some(text) = properties::non_empty(props.body_text.as_deref()) {
        return text.to_string();
    }
    if let Some(html) = properties::non_empty(props.body_html.as_deref()) {
        return html.to_string();
    }
    if let Some(bytes) = props.body_html_bytes.as_deref().filter(|b| !b.is_empty()) {
        return String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string();
    }
    if props.has_compressed_rtf {
        return RTF_PLACEHOLDER.to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn recipient(email: &str, kind: RecipientKind) -> Recipient {
        Recipient {
            name: None,
            email: Some(email.to_string()),
            kind,
        }
    }

    fn parse(props: &MsgProperties) -> ParsedEmail {
        normalize(props, &Limits::default())
    }

    struct FailingDecoder;

    impl MsgDecoder for FailingDecoder {
        fn decode(&self, _data: &[u8]) -> std::result::Result<MsgProperties, DecodeError> {
            Err(DecodeError::Panicked("sector 17 at offset 0x4400 out of range".into()))
        }
    }

    #[test]
    fn test_transport_headers_take_precedence() {
        let props = MsgProperties {
            transport_headers: Some(
                "Received: from mx\r\nSubject: From headers\r\nX-Mailer: Outlook\r\n".into(),
            ),
            sender_name: Some("Alice".into()),
            ..MsgProperties::default()
        };
        let email = parse(&props);
        let names: Vec<&str> = email.headers().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Received", "Subject", "X-Mailer"]);
        assert_eq!(email.subject(), "From headers");
        assert_eq!(email.from(), "Alice");
        assert_eq!(email.source_format(), SourceFormat::Msg);
    }

    #[test]
    fn test_reconstructed_headers_fixed_order() {
        let props = MsgProperties {
            subject: Some("Hi".into()),
            sender_name: Some("Alice".into()),
            sender_email: Some("alice@example.com".into()),
            delivery_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
            submit_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 29, 0).unwrap()),
            message_id: Some("<id@example.com>".into()),
            thread_topic: Some("Hi".into()),
            thread_index: Some(vec![1, 2, 3]),
            recipients: vec![
                recipient("bob@example.com", RecipientKind::To),
                recipient("carol@example.com", RecipientKind::Cc),
                recipient("dave@example.com", RecipientKind::Bcc),
            ],
            ..MsgProperties::default()
        };
        let email = parse(&props);
        let names: Vec<&str> = email.headers().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Subject",
                "From-Name",
                "From",
                "Date",
                "Date-Submitted",
                "Message-ID",
                "Thread-Topic",
                "Thread-Index",
                "To",
                "Cc"
            ]
        );
        assert_eq!(email.header("Thread-Index"), Some("AQID"));
        assert_eq!(email.header("To"), Some("bob@example.com"));
        assert_eq!(email.header("Cc"), Some("carol@example.com"));
        assert_eq!(email.from(), "Alice <alice@example.com>");
        assert_eq!(email.date(), "Mon, 15 Jan 2024 10:30:00 +0000");
    }

    #[test]
    fn test_reconstruction_skips_missing_properties() {
        let props = MsgProperties {
            subject: Some("Only subject".into()),
            message_id: Some("   ".into()),
            ..MsgProperties::default()
        };
        let email = parse(&props);
        assert_eq!(email.headers().len(), 1);
        assert_eq!(email.headers()[0].name, "Subject");
    }

    #[test]
    fn test_to_scalar_caps_at_ten() {
        let recipients = (0..15)
            .map(|i| recipient(&format!("r{i}@x.io"), RecipientKind::To))
            .collect();
        let props = MsgProperties {
            recipients,
            ..MsgProperties::default()
        };
        let email = parse(&props);
        let expected = (0..10)
            .map(|i| format!("r{i}@x.io"))
            .collect::<Vec<_>>()
            .join(", ");
        assert_eq!(email.to(), expected);
        assert_eq!(email.header("To"), Some(expected.as_str()));
    }

    #[test]
    fn test_to_scalar_includes_unspecified_and_names() {
        let props = MsgProperties {
            recipients: vec![
                Recipient {
                    name: Some("No Address".into()),
                    email: None,
                    kind: RecipientKind::Unspecified,
                },
                recipient("cc@example.com", RecipientKind::Cc),
                Recipient::default(),
                recipient("to@example.com", RecipientKind::To),
            ],
            ..MsgProperties::default()
        };
        assert_eq!(parse(&props).to(), "No Address, to@example.com");
    }

    #[test]
    fn test_body_priority() {
        let mut props = MsgProperties {
            body_text: Some("plain".into()),
            body_html: Some("<p>html</p>".into()),
            body_html_bytes: Some(b"<p>bytes</p>".to_vec()),
            has_compressed_rtf: true,
            ..MsgProperties::default()
        };
        assert_eq!(parse(&props).body(), "plain");
        props.body_text = None;
        assert_eq!(parse(&props).body(), "<p>html</p>");
        props.body_html = None;
        assert_eq!(parse(&props).body(), "<p>bytes</p>");
        props.body_html_bytes = None;
        assert_eq!(parse(&props).body(), RTF_PLACEHOLDER);
        props.has_compressed_rtf = false;
        assert_eq!(parse(&props).body(), "");
    }

    #[test]
    fn test_date_falls_back_to_submit_time() {
        let props = MsgProperties {
            submit_time: Some(Utc.with_ymd_and_hms(2023, 6, 1, 8, 0, 0).unwrap()),
            ..MsgProperties::default()
        };
        let email = parse(&props);
        assert_eq!(email.date(), "Thu, 1 Jun 2023 08:00:00 +0000");
        assert!(email.header("Date").is_none());
        assert!(email.header("Date-Submitted").is_some());
    }

    #[test]
    fn test_decoder_failure_is_generic() {
        for verbose in [false, true] {
            let parser = MsgParser::with_decoder(
                FailingDecoder,
                ParseOptions {
                    verbose_diagnostics: verbose,
                    ..ParseOptions::default()
                },
            );
            let err = parser.parse(b"junk").unwrap_err();
            assert!(matches!(err, ViewerError::ParseFailure));
            assert!(!err.to_string().contains("sector"));
        }
    }

    #[test]
    fn test_default_parser_rejects_garbage() {
        let parser = MsgParser::new(ParseOptions::default());
        assert!(matches!(
            parser.parse(b"not a compound file"),
            Err(ViewerError::ParseFailure)
        ));
    }
}
