//! Internationalization (i18n) module.
//!
//! Localized strings for CLI output, user-facing error messages and the
//! preview warning. English is the default language; Spanish is available
//! as an alternative.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-', '.']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Return the ISO 639-1 code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from `MSGVIEW_LANG`, `LC_MESSAGES` or `LANG`.
pub fn detect_system_lang() -> Lang {
    ["MSGVIEW_LANG", "LC_MESSAGES", "LANG"]
        .iter()
        .find_map(|var| std::env::var(var).ok().and_then(|v| Lang::from_code(&v)))
        .unwrap_or(Lang::En)
}

/// Macro for defining translatable message functions.
/// Each function returns a `&'static str` based on the current language.
macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── General ──────────────────────────────────────────────────────

msg!(app_name, "msgview", "msgview");
msg!(
    app_about,
    "msgview \u{2014} Safe viewer for Outlook .msg and .eml files.",
    "msgview \u{2014} Visor seguro de ficheros .msg de Outlook y .eml."
);
msg!(
    app_long_about,
    "msgview \u{2014} Safe viewer for Outlook .msg and .eml files.\nShows headers as plain text. Message bodies are only rendered on request,\neither as extracted text or as sanitized HTML inside a sandboxed frame.",
    "msgview \u{2014} Visor seguro de ficheros .msg de Outlook y .eml.\nMuestra las cabeceras como texto plano. El cuerpo solo se muestra a petici\u{f3}n,\ncomo texto extra\u{ed}do o como HTML saneado dentro de un marco aislado."
);

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    help_cmd_show,
    "Show headers and, optionally, a body preview (default if no subcommand given)",
    "Mostrar cabeceras y, opcionalmente, una vista previa del cuerpo (por defecto)"
);
msg!(
    help_cmd_headers,
    "List all headers of a file",
    "Listar todas las cabeceras de un fichero"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar autocompletado para la shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar p\u{e1}gina de manual"
);

// ── Errors ───────────────────────────────────────────────────────

msg!(err_empty_input, "The file is empty.", "El fichero est\u{e1} vac\u{ed}o.");
msg!(
    err_unsupported_type,
    "Unsupported file type. Only .msg and .eml files can be opened.",
    "Tipo de fichero no soportado. Solo se pueden abrir ficheros .msg y .eml."
);
msg!(
    err_file_too_large,
    "The file is too large to open.",
    "El fichero es demasiado grande para abrirlo."
);
msg!(
    err_read_failure,
    "The file could not be read.",
    "No se pudo leer el fichero."
);
msg!(
    err_parse_failure,
    "The file could not be parsed. It may be corrupt or not a valid email file.",
    "No se pudo analizar el fichero. Puede estar da\u{f1}ado o no ser un correo v\u{e1}lido."
);
msg!(
    err_no_file_given,
    "No file given. Usage: msgview <FILE>",
    "No se indic\u{f3} ning\u{fa}n fichero. Uso: msgview <FICHERO>"
);

// ── Preview ──────────────────────────────────────────────────────

msg!(
    preview_warning,
    "Warning: previewing message content may expose you to malicious material.\nOnly preview files from sources you trust.",
    "Aviso: ver el contenido del mensaje puede exponerle a material malicioso.\nSolo previsualice ficheros de fuentes de confianza."
);
msg!(preview_prompt, "Continue? [y/N] ", "\u{bf}Continuar? [s/N] ");
msg!(
    preview_declined,
    "Preview declined; showing headers only.",
    "Vista previa rechazada; solo se muestran las cabeceras."
);
msg!(
    preview_hidden,
    "Body hidden. Use --preview text or --preview html to show it.",
    "Cuerpo oculto. Use --preview text o --preview html para mostrarlo."
);
msg!(
    preview_page_written,
    "Sandboxed preview written to",
    "Vista previa aislada escrita en"
);

// ── View labels ──────────────────────────────────────────────────

msg!(label_file, "File", "Fichero");
msg!(label_format, "Format", "Formato");
msg!(label_size, "Size", "Tama\u{f1}o");
msg!(label_subject, "Subject", "Asunto");
msg!(label_from, "From", "De");
msg!(label_to, "To", "Para");
msg!(label_date, "Date", "Fecha");
msg!(label_headers, "Headers", "Cabeceras");
msg!(label_body, "Body", "Cuerpo");
msg!(
    label_truncated,
    "(body truncated)",
    "(cuerpo truncado)"
);
msg!(
    label_no_matches,
    "No headers match the filter.",
    "Ninguna cabecera coincide con el filtro."
);
