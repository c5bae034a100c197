//! HTML to plain text using a real HTML5 parser.
//!
//! Only text nodes are emitted, so no markup can survive the conversion no
//! matter how the input nests or breaks its tags.

use scraper::{Html, Node};

/// Elements whose text content is never shown.
const SKIPPED: [&str; 6] = ["script", "style", "head", "title", "noscript", "template"];

/// Elements whose text is laid out on lines of its own.
const BLOCK: [&str; 19] = [
    "p", "div", "li", "tr", "td", "table", "ul", "ol", "blockquote", "pre", "h1", "h2", "h3",
    "h4", "h5", "h6", "section", "article", "header",
];

/// Extract the visible text of an HTML document.
///
/// - Text from different block elements, and `<br>`, is split into lines
/// - Runs of whitespace collapse to one space
/// - Entities are decoded by the parser
/// - `script`/`style` contents are dropped
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    let mut last_block = None;

    for node in doc.tree.root().descendants() {
        match node.value() {
            Node::Element(el) if el.name() == "br" => raw.push('\n'),
            Node::Text(text) => {
                let mut hidden = false;
                let mut block = None;
                for ancestor in node.ancestors() {
                    if let Some(el) = ancestor.value().as_element() {
                        if SKIPPED.contains(&el.name()) {
                            hidden = true;
                            break;
                        }
                        if block.is_none() && BLOCK.contains(&el.name()) {
                            block = Some(ancestor.id());
                        }
                    }
                }
                if hidden {
                    continue;
                }
                if block != last_block {
                    raw.push('\n');
                    last_block = block;
                }
                push_collapsed(&mut raw, text);
            }
            _ => {}
        }
    }

    tidy_lines(&raw)
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(|c: char| c.is_whitespace()) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

/// Trim every line and keep at most one blank line in a row.
fn tidy_lines(text: &str) -> String {
    let mut prev_was_blank = false;
    let mut cleaned = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_was_blank {
                cleaned.push('\n');
                prev_was_blank = true;
            }
        } else {
            cleaned.push_str(trimmed);
            cleaned.push('\n');
            prev_was_blank = false;
        }
    }
    cleaned.trim().to_string()
}
