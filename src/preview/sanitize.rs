//! Allow-list HTML sanitization and the sandboxed frame around its output.

use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};

/// Tags kept by the sanitizer. Anything else is unwrapped (children kept)
/// or, for [`REMOVED_WITH_CONTENT`], dropped together with its children.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "div", "span", "b", "strong", "i", "em", "u", "ul", "ol", "li", "table", "thead",
    "tbody", "tr", "td", "th", "a", "blockquote", "pre", "code", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr",
];

/// Tags removed together with everything inside them.
const REMOVED_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "form", "input", "button",
];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// The sanitizer policy.
///
/// Only `title` (everywhere) and `href` (on links) survive as attributes, so
/// every event handler and inline style is stripped. Link targets must use
/// one of [`URL_SCHEMES`]; `javascript:` and `data:` URLs are removed.
fn policy() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .add_tags(ALLOWED_TAGS)
        .add_generic_attributes(&["title"])
        .add_tag_attributes("a", &["href"])
        .add_url_schemes(URL_SCHEMES)
        .url_relative(UrlRelative::Deny)
        .link_rel(None)
        .clean_content_tags(REMOVED_WITH_CONTENT.iter().copied().collect::<HashSet<_>>())
        .strip_comments(true);
    builder
}

/// Clean untrusted HTML down to the allow-list.
pub fn sanitize_html(html: &str) -> String {
    policy().clean(html).to_string()
}

/// Wrap sanitized markup in an iframe with an empty `sandbox` attribute.
///
/// The empty `sandbox` attribute grants the frame no capabilities. The inner
/// document also carries a CSP that blocks every fetch.
pub fn sandbox_frame(sanitized: &str) -> String {
    let document = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'none'\">\
         </head><body>{sanitized}</body></html>"
    );
    format!(
        "<iframe sandbox=\"\" referrerpolicy=\"no-referrer\" title=\"Message body\" srcdoc=\"{}\"></iframe>",
        ammonia::clean_text(&document)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_and_handler_removed() {
        let out = sanitize_html("<div onclick='x()'>ok<script>evil()</script></div>");
        assert_eq!(out, "<div>ok</div>");
    }

    #[test]
    fn test_dangerous_urls_removed() {
        let out = sanitize_html(
            "<a href=\"javascript:alert(1)\">a</a><a href=\"data:text/html,x\">b</a>",
        );
        assert!(!out.contains("javascript"));
        assert!(!out.contains("data:"));
        assert!(out.contains(">a</a>"));
    }

    #[test]
    fn test_safe_link_kept() {
        let out = sanitize_html("<a href=\"https://example.com\" title=\"t\" style=\"x\">go</a>");
        assert!(out.contains("href=\"https://example.com\""));
        assert!(out.contains("title=\"t\""));
        assert!(!out.contains("style"));
    }

    #[test]
    fn test_kept_link_has_no_added_attributes() {
        assert_eq!(
            sanitize_html("<a href=\"https://example.com\">go</a>"),
            "<a href=\"https://example.com\">go</a>"
        );
    }

    #[test]
    fn test_denied_tags_removed_with_content() {
        let html = "<p>a</p><iframe src=\"https://x\">f</iframe><form><input value=\"v\"><button>b</button></form>\
                    <object>o</object><embed src=\"x\"><style>p{}</style>";
        assert_eq!(sanitize_html(html), "<p>a</p>");
    }

    #[test]
    fn test_unknown_tags_unwrapped() {
        assert_eq!(sanitize_html("<font color=\"red\">hi</font>"), "hi");
        assert_eq!(sanitize_html("<img src=\"x\" onerror=\"y()\">"), "");
    }

    #[test]
    fn test_sandbox_frame_is_empty_sandbox() {
        let frame = sandbox_frame("<p title=\"a\">x</p>");
        assert!(frame.starts_with("<iframe sandbox=\"\" "));
        assert!(frame.ends_with("\"></iframe>"));
        assert!(frame.contains("&lt;p"));
        assert!(!frame.contains("<p"));
        assert!(!frame.contains("allow-"));
    }
}
