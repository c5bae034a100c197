//! Terminal and file output for a parsed email.
//!
//! Everything that reaches the terminal goes through [`printable`], so a
//! header or body can never smuggle escape sequences into the user's
//! terminal. Markup is only ever written inside the sandboxed page.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use humansize::{format_size, BINARY};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::i18n;
use crate::model::email::{Header, ParsedEmail};
use crate::preview::{PreviewMode, RenderedBody};

/// Widest header name column before names are cut.
const NAME_COLUMN_MAX: usize = 28;

/// Replace control characters (other than newline and tab) with U+FFFD.
pub fn printable(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                '\u{FFFD}'
            } else {
                c
            }
        })
        .collect()
}

/// Cut `s` to at most `width` terminal columns, appending `…` when cut, and
/// pad with spaces to exactly `width`.
pub fn fit_width(s: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    if UnicodeWidthStr::width(s) <= width {
        out.push_str(s);
    } else if width > 0 {
        let mut used = 0;
        for c in s.chars() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > width - 1 {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('\u{2026}');
    }
    let pad = width.saturating_sub(UnicodeWidthStr::width(out.as_str()));
    out.extend(std::iter::repeat(' ').take(pad));
    out
}

/// The summary block: file, format, size and the four scalar fields.
pub fn write_summary(
    w: &mut impl Write,
    file: &str,
    file_size: u64,
    email: &ParsedEmail,
) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "  {:<12} {}", i18n::label_file(), printable(file))?;
    writeln!(w, "  {:<12} {}", i18n::label_format(), email.source_format())?;
    writeln!(w, "  {:<12} {}", i18n::label_size(), format_size(file_size, BINARY))?;
    writeln!(w, "  {:<12} {}", i18n::label_subject(), printable(email.subject()))?;
    writeln!(w, "  {:<12} {}", i18n::label_from(), printable(email.from()))?;
    writeln!(w, "  {:<12} {}", i18n::label_to(), printable(email.to()))?;
    writeln!(w, "  {:<12} {}", i18n::label_date(), printable(email.date()))?;
    Ok(())
}

/// Header table with the name column sized to the longest name shown.
pub fn write_headers(w: &mut impl Write, headers: &[&Header]) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "  {} ({})", i18n::label_headers(), headers.len())?;
    if headers.is_empty() {
        writeln!(w, "  {}", i18n::label_no_matches())?;
        return Ok(());
    }

    let name_width = headers
        .iter()
        .map(|h| UnicodeWidthStr::width(h.name.as_str()))
        .max()
        .unwrap_or(0)
        .min(NAME_COLUMN_MAX);
    writeln!(w, "  {}", "-".repeat(name_width + 40))?;

    for header in headers {
        let name = fit_width(&printable(&header.name), name_width);
        writeln!(w, "  {name}  {}", printable(&header.value))?;
    }
    Ok(())
}

/// Write the rendered body for terminal display.
///
/// Sandboxed HTML is not written here; the caller writes it to a page with
/// [`sandboxed_page`] and only the notice goes to the terminal.
pub fn write_body(w: &mut impl Write, body: &RenderedBody, truncated: bool) -> io::Result<()> {
    writeln!(w)?;
    match body {
        RenderedBody::Hidden => {
            writeln!(w, "  {}", i18n::preview_hidden())?;
            return Ok(());
        }
        RenderedBody::Text(text) => {
            writeln!(w, "  {}", i18n::label_body())?;
            writeln!(w, "  {}", "-".repeat(40))?;
            writeln!(w, "{}", printable(text))?;
        }
        RenderedBody::SandboxedHtml { sanitized, .. } => {
            writeln!(w, "  {} (HTML, {})", i18n::label_body(), format_size(sanitized.len(), BINARY))?;
        }
    }
    if truncated {
        writeln!(w, "  {}", i18n::label_truncated())?;
    }
    Ok(())
}

/// Machine-readable view. The body is only included when a preview mode
/// rendered it.
pub fn email_json(email: &ParsedEmail, mode: PreviewMode, body: &RenderedBody) -> serde_json::Value {
    let (body_kind, body_value) = match body {
        RenderedBody::Hidden => ("hidden", serde_json::Value::Null),
        RenderedBody::Text(text) => ("text", serde_json::Value::from(text.as_str())),
        RenderedBody::SandboxedHtml { sanitized, .. } => {
            ("html", serde_json::Value::from(sanitized.as_str()))
        }
    };
    serde_json::json!({
        "source_format": email.source_format(),
        "subject": email.subject(),
        "from": email.from(),
        "to": email.to(),
        "date": email.date(),
        "date_parsed": email.date_time().map(|d| d.to_rfc3339()),
        "headers": email.headers(),
        "preview_mode": mode.to_string(),
        "body_kind": body_kind,
        "body": body_value,
        "body_truncated": email.is_truncated(),
    })
}

/// A standalone HTML page: escaped header summary plus the sandboxed frame.
///
/// The outer page carries its own CSP; only the frame's `srcdoc` holds
/// message markup.
pub fn sandboxed_page(email: &ParsedEmail, frame: &str) -> String {
    let rows: String = [
        (i18n::label_subject(), email.subject()),
        (i18n::label_from(), email.from()),
        (i18n::label_to(), email.to()),
        (i18n::label_date(), email.date()),
    ]
    .iter()
    .map(|(label, value)| {
        format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            ammonia::clean_text(label),
            ammonia::clean_text(value)
        )
    })
    .collect();

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n\
         <meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'none'; style-src 'unsafe-inline'; frame-src 'self'\">\n\
         <title>{title}</title>\n\
         <style>body{{font-family:sans-serif;margin:1em}}th{{text-align:left;padding-right:1em}}\
         iframe{{width:100%;height:80vh;border:1px solid #ccc}}</style>\n\
         </head><body>\n<table>{rows}</table>\n{frame}\n</body></html>\n",
        title = ammonia::clean_text(email.subject()),
    )
}

/// Write a page to a new, uniquely named `msgview-<stem>-XXXXXX.html` in `dir`.
///
/// The file is created exclusively, so an existing file or symlink with a
/// guessed name is never opened.
pub fn write_page_file(dir: &Path, stem: &str, page: &str) -> io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("msgview-{stem}-"))
        .suffix(".html")
        .tempfile_in(dir)?;
    file.write_all(page.as_bytes())?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::limits::Limits;
    use crate::parser::eml::parse_eml;
    use crate::preview::render_body;

    fn sample() -> ParsedEmail {
        parse_eml(
            "Subject: <b>Hi</b> \u{1b}[31mred\r\nFrom: a@example.com\r\nTo: b@example.com\r\n\r\n<p>Body</p>",
            &Limits::default(),
        )
    }

    fn to_string(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_printable_strips_escapes() {
        assert_eq!(printable("a\u{1b}[2Jb\r\n\tc"), "a\u{FFFD}[2Jb\u{FFFD}\n\tc");
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("abc", 5), "abc  ");
        assert_eq!(fit_width("abcdef", 4), "abc\u{2026}");
        assert_eq!(fit_width("日本語テキスト", 5), "日本\u{2026}");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn test_summary_shows_literal_subject() {
        let email = sample();
        let out = to_string(|w| write_summary(w, "mail.eml", 2048, &email));
        assert!(out.contains("<b>Hi</b>"));
        assert!(out.contains("2 KiB"));
        assert!(out.contains("EML"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_headers_table_and_empty_filter() {
        let email = sample();
        let all: Vec<&Header> = email.headers().iter().collect();
        let out = to_string(|w| write_headers(w, &all));
        assert!(out.contains("Subject"));
        assert!(out.contains("b@example.com"));

        let none = email.filter_headers("zzz");
        let out = to_string(|w| write_headers(w, &none));
        assert!(out.contains(i18n::label_no_matches()));
    }

    #[test]
    fn test_body_hidden_and_text() {
        let email = sample();
        let out = to_string(|w| write_body(w, &RenderedBody::Hidden, false));
        assert!(out.contains(i18n::preview_hidden()));
        assert!(!out.contains("Body</p>"));

        let rendered = render_body(email.body(), PreviewMode::PlainText);
        let out = to_string(|w| write_body(w, &rendered, true));
        assert!(out.contains("\nBody\n"));
        assert!(out.contains(i18n::label_truncated()));
    }

    #[test]
    fn test_json_omits_hidden_body() {
        let email = sample();
        let json = email_json(&email, PreviewMode::None, &RenderedBody::Hidden);
        assert_eq!(json["body"], serde_json::Value::Null);
        assert_eq!(json["body_kind"], "hidden");
        assert_eq!(json["source_format"], "EML");
        assert_eq!(json["headers"][1]["name"], "From");
    }

    #[test]
    fn test_sandboxed_page_escapes_headers() {
        let email = sample();
        let rendered = render_body(email.body(), PreviewMode::SandboxedHtml);
        let RenderedBody::SandboxedHtml { frame, .. } = rendered else {
            panic!("expected html");
        };
        let page = sandboxed_page(&email, &frame);
        assert!(page.contains("&lt;b&gt;Hi"));
        assert!(!page.contains("<b>Hi"));
        assert!(page.contains("<iframe sandbox=\"\""));
        assert!(page.contains("default-src 'none'"));
    }

    #[test]
    fn test_page_files_are_unique_and_skip_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        let planted = dir.path().join("msgview-report.html");
        std::fs::write(&planted, "keep me").unwrap();

        let first = write_page_file(dir.path(), "report", "<p>one</p>").unwrap();
        let second = write_page_file(dir.path(), "report", "<p>two</p>").unwrap();
        assert_ne!(first, second);
        assert_ne!(first, planted);
        assert_eq!(first.parent(), Some(dir.path()));

        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("msgview-report-") && name.ends_with(".html"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "<p>one</p>");
        assert_eq!(std::fs::read_to_string(&planted).unwrap(), "keep me");
    }
}
