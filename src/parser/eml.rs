//! Parser for `.eml` files (RFC 822 messages).
//!
//! Never fails: malformed header sections degrade to fewer headers.
//! The body is kept verbatim; MIME structure is not decoded.

use crate::model::email::{EmailBuilder, ParsedEmail, SourceFormat};
use crate::model::limits::Limits;
use crate::parser::header::{self, HeaderFolder};

/// Parse raw `.eml` bytes (UTF-8, falling back to Windows-1252).
pub fn parse_eml_bytes(data: &[u8], limits: &Limits) -> ParsedEmail {
    parse_eml(&header::decode_text_bytes(data), limits)
}

/// Parse an RFC 822 message held in a string.
pub fn parse_eml(text: &str, limits: &Limits) -> ParsedEmail {
    let mut out = EmailBuilder::new(SourceFormat::Eml, *limits);
    let mut folder = HeaderFolder::default();
    let mut lines = header::split_lines(text);

    // Header section ends at the first blank line
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        folder.feed(line, &mut out);
    }
    // Also covers input with no blank line at all
    folder.flush(&mut out);

    out.set_body(lines.collect::<Vec<_>>().join("\n"));
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedEmail {
        parse_eml(text, &Limits::default())
    }

    #[test]
    fn test_folded_header_and_body() {
        let email = parse("Subject: Hello\r\nX: a\r\n  b\r\n\r\nBody line");
        assert_eq!(email.subject(), "Hello");
        assert_eq!(email.header("X"), Some("a b"));
        assert_eq!(email.body(), "Body line");
    }

    #[test]
    fn test_leading_whitespace_line_continues_previous_header() {
        let email = parse("Subject: Hello\r\n X: a\r\n  b\r\n\r\nBody line");
        assert_eq!(email.headers().len(), 1);
        assert_eq!(email.subject(), "Hello X: a b");
    }

    #[test]
    fn test_many_continuation_lines() {
        let email = parse("Received: from a\n\tby b\n\twith c\n  id d\n\nx");
        assert_eq!(email.header("received"), Some("from a by b with c id d"));
    }

    #[test]
    fn test_no_blank_line_flushes_last_header() {
        let email = parse("Subject: Hi\r\nFrom: a@b.com");
        assert_eq!(email.headers().len(), 2);
        assert_eq!(email.from(), "a@b.com");
        assert_eq!(email.body(), "");
    }

    #[test]
    fn test_duplicate_headers_retained_in_order() {
        let email = parse("A: 1\r\nA: 2\r\n\r\n");
        let pairs: Vec<(&str, &str)> = email
            .headers()
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "1"), ("A", "2")]);
    }

    #[test]
    fn test_scalars_case_insensitive() {
        let email = parse("SUBJECT: s\nfrom: f\nTo: t\ndate: d\n\n");
        assert_eq!(email.subject(), "s");
        assert_eq!(email.from(), "f");
        assert_eq!(email.to(), "t");
        assert_eq!(email.date(), "d");
        assert_eq!(email.source_format(), SourceFormat::Eml);
    }

    #[test]
    fn test_body_lines_rejoined_with_lf() {
        let email = parse("A: 1\r\n\r\nline one\r\nline two\r\n");
        assert_eq!(email.body(), "line one\nline two\n");
    }

    #[test]
    fn test_body_keeps_later_blank_lines_and_header_lookalikes() {
        let email = parse("A: 1\n\nKey: value\n\nmore");
        assert_eq!(email.headers().len(), 1);
        assert_eq!(email.body(), "Key: value\n\nmore");
    }

    #[test]
    fn test_garbage_input_degrades_gracefully() {
        let email = parse("this is not\nan email at all");
        assert!(email.headers().is_empty());
        assert_eq!(email.body(), "");
    }

    #[test]
    fn test_empty_input() {
        let email = parse("");
        assert!(email.headers().is_empty());
        assert_eq!(email.body(), "");
        assert_eq!(email.subject(), "");
    }

    #[test]
    fn test_multipart_body_is_opaque() {
        let raw = "Content-Type: multipart/alternative; boundary=\"b\"\n\n--b\nContent-Type: text/plain\n\nhi\n--b--";
        let email = parse(raw);
        assert_eq!(email.headers().len(), 1);
        assert!(email.body().starts_with("--b\nContent-Type: text/plain"));
    }

    #[test]
    fn test_parse_eml_bytes_latin1() {
        let email = parse_eml_bytes(b"Subject: caf\xE9\n\nbody", &Limits::default());
        assert_eq!(email.subject(), "caf\u{e9}");
    }

    #[test]
    fn test_custom_limits() {
        let limits = Limits {
            max_headers: 2,
            max_body_chars: 4,
            ..Limits::default()
        };
        let email = parse_eml("A: 1\nB: 2\nC: 3\n\nabcdefgh", &limits);
        assert_eq!(email.headers().len(), 2);
        assert!(email.is_truncated());
        assert!(email.body().starts_with("abcd\n"));
    }
}
