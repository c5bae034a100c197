//! Body preview policy: content classification, the three presentation
//! modes and the one-time acknowledgment required before showing content.
//!
//! Headers are always displayed as literal text and are not covered here.

pub mod sanitize;
pub mod text;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

static TAG_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<[a-z][\s\S]*>").expect("valid tag regex"));

/// Heuristic HTML detection: `<`, a letter, then eventually `>` anywhere in
/// the body. Not a security boundary.
pub fn looks_like_html(body: &str) -> bool {
    TAG_LIKE.is_match(body)
}

/// How the body is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreviewMode {
    /// Body not rendered at all.
    #[default]
    None,
    /// Text only; HTML is reduced to its text content.
    #[serde(alias = "text")]
    PlainText,
    /// Sanitized HTML inside an empty-sandbox iframe.
    #[serde(alias = "html")]
    SandboxedHtml,
}

impl std::str::FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "text" | "plain" | "plain-text" => Ok(Self::PlainText),
            "html" | "sandboxed-html" => Ok(Self::SandboxedHtml),
            other => Err(format!(
                "unknown preview mode '{other}' (expected none, text or html)"
            )),
        }
    }
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PlainText => write!(f, "text"),
            Self::SandboxedHtml => write!(f, "html"),
        }
    }
}

/// Output of the render transform for one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBody {
    /// Nothing to show.
    Hidden,
    /// Literal text; must never be interpreted as markup.
    Text(String),
    /// Sanitized markup, plus the sandboxed iframe that embeds it.
    SandboxedHtml { sanitized: String, frame: String },
}

/// Apply a preview mode to a body.
///
/// `SandboxedHtml` is only honored when the body looks like HTML; anything
/// else is shown as plain text instead.
pub fn render_body(body: &str, mode: PreviewMode) -> RenderedBody {
    match mode {
        PreviewMode::None => RenderedBody::Hidden,
        PreviewMode::PlainText if looks_like_html(body) => {
            RenderedBody::Text(text::html_to_text(body))
        }
        PreviewMode::PlainText => RenderedBody::Text(body.to_string()),
        PreviewMode::SandboxedHtml if looks_like_html(body) => {
            let sanitized = sanitize::sanitize_html(body);
            let frame = sanitize::sandbox_frame(&sanitized);
            RenderedBody::SandboxedHtml { sanitized, frame }
        }
        PreviewMode::SandboxedHtml => RenderedBody::Text(body.to_string()),
    }
}

/// Asked once per session before any content is previewed.
pub trait Acknowledger {
    /// Return `true` if the user accepts the risk of previewing content.
    fn acknowledge(&mut self) -> bool;
}

impl<F: FnMut() -> bool> Acknowledger for F {
    fn acknowledge(&mut self) -> bool {
        self()
    }
}

/// Tracks the selected mode and whether the preview warning was accepted.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    mode: PreviewMode,
    acknowledged: bool,
    require_confirmation: bool,
}

impl PreviewSession {
    /// Start in [`PreviewMode::None`].
    ///
    /// With `require_confirmation = false` the warning is treated as
    /// already accepted (e.g. `--yes`).
    pub fn new(require_confirmation: bool) -> Self {
        Self {
            mode: PreviewMode::None,
            acknowledged: false,
            require_confirmation,
        }
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    /// Switch modes, asking for acknowledgment the first time a content
    /// mode is entered. A declined prompt leaves the current mode unchanged.
    pub fn request(&mut self, mode: PreviewMode, ack: &mut impl Acknowledger) -> PreviewMode {
        if mode != PreviewMode::None && self.require_confirmation && !self.acknowledged {
            if !ack.acknowledge() {
                info!(requested = %mode, "Preview declined");
                return self.mode;
            }
            self.acknowledged = true;
        }
        self.mode = mode;
        self.mode
    }

    /// Render a body with the current mode.
    pub fn render(&self, body: &str) -> RenderedBody {
        render_body(body, self.mode)
    }
}
