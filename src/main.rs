//! CLI entry point for `msgview`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};

use msgview::config::Config;
use msgview::error::ViewerError;
use msgview::i18n;
use msgview::model::email::ParsedEmail;
use msgview::parser::ParseOptions;
use msgview::preview::{PreviewMode, PreviewSession, RenderedBody};
use msgview::view;

#[derive(Parser)]
#[command(name = "msgview", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// .msg or .eml file to show
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    #[command(flatten)]
    show: ShowArgs,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, value_name = "LANG", global = true)]
    lang: Option<String>,

    /// Log why a file failed to parse (debug level)
    #[arg(long, global = true)]
    debug_parser: bool,
}

#[derive(Args, Clone)]
struct ShowArgs {
    /// Body preview: none, text or html
    #[arg(short, long, value_name = "MODE")]
    preview: Option<PreviewMode>,

    /// Skip the preview warning prompt
    #[arg(short, long)]
    yes: bool,

    /// Only list headers whose name or value contains this text
    #[arg(short, long, value_name = "TEXT")]
    filter: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Where to write the sandboxed HTML page (html preview only)
    #[arg(short, long, value_name = "PAGE")]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show headers and an optional body preview
    Show {
        file: PathBuf,
        #[command(flatten)]
        args: ShowArgs,
    },
    /// List headers
    Headers {
        file: PathBuf,
        #[arg(short, long, value_name = "TEXT")]
        filter: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Detect language early from --lang arg or system env, before clap processes --help.
fn detect_lang_early() -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--lang" {
            if let Some(lang) = args.get(i + 1).and_then(|c| i18n::Lang::from_code(c)) {
                return lang;
            }
        }
        if let Some(code) = args[i].strip_prefix("--lang=") {
            if let Some(lang) = i18n::Lang::from_code(code) {
                return lang;
            }
        }
    }
    i18n::detect_system_lang()
}

/// Build a localized clap Command using i18n strings.
fn build_localized_command() -> clap::Command {
    let mut cmd = Cli::command()
        .about(i18n::app_about())
        .long_about(i18n::app_long_about());

    let subcommands: Vec<clap::Command> = cmd
        .get_subcommands()
        .map(|sub| {
            let s = sub.clone();
            match s.get_name() {
                "show" => s.about(i18n::help_cmd_show()),
                "headers" => s.about(i18n::help_cmd_headers()),
                "completions" => s.about(i18n::help_cmd_completions()),
                "manpage" => s.about(i18n::help_cmd_manpage()),
                _ => s,
            }
        })
        .collect();

    for sub in subcommands {
        cmd = cmd.mut_subcommand(sub.get_name(), |_| sub.clone());
    }

    cmd
}

fn main() -> anyhow::Result<()> {
    // Detect language BEFORE clap parsing so --help is localized
    i18n::set_lang(detect_lang_early());

    let matches = build_localized_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let config = msgview::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let mut options = config.parse_options();
    options.verbose_diagnostics |= cli.debug_parser;

    match cli.command {
        Some(Commands::Show { file, args }) => cmd_show(&file, &args, &config, &options),
        Some(Commands::Headers { file, filter, json }) => {
            cmd_headers(&file, filter.as_deref(), json, &options)
        }
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => match cli.file {
            Some(file) => cmd_show(&file, &cli.show, &config, &options),
            None => {
                eprintln!("{}", i18n::err_no_file_given());
                std::process::exit(2);
            }
        },
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = msgview::config::log_file_path(config);
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let log_name = log_path.file_name().unwrap_or_default();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Parse a file, or print the generic user message and exit.
fn open_email(path: &Path, options: &ParseOptions) -> ParsedEmail {
    match msgview::parser::parse_file(path, options) {
        Ok(email) => email,
        Err(e) => {
            tracing::debug!(error = %e, "Open failed");
            eprintln!("{}", e.user_message());
            std::process::exit(match e {
                ViewerError::ReadFailure { .. } => 3,
                _ => 1,
            });
        }
    }
}

/// Ask on the terminal. Anything but an explicit yes declines, including EOF.
fn terminal_prompt() -> bool {
    eprintln!("{}", i18n::preview_warning());
    eprint!("{}", i18n::preview_prompt());
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "s\u{ed}"
    )
}

/// Show the summary, headers and (if allowed) the body.
fn cmd_show(
    path: &Path,
    args: &ShowArgs,
    config: &Config,
    options: &ParseOptions,
) -> anyhow::Result<()> {
    let email = open_email(path, options);
    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let mut session = PreviewSession::new(config.preview.require_confirmation && !args.yes);
    let requested = args.preview.unwrap_or(config.preview.default_mode);
    if session.request(requested, &mut terminal_prompt) != requested {
        eprintln!("{}", i18n::preview_declined());
    }
    let rendered = session.render(email.body());

    let headers = match args.filter.as_deref() {
        Some(needle) => email.filter_headers(needle),
        None => email.headers().iter().collect(),
    };

    if let RenderedBody::SandboxedHtml { frame, .. } = &rendered {
        let page = view::sandboxed_page(&email, frame);
        let page_path = match &args.out {
            Some(out) => {
                std::fs::write(out, &page)?;
                out.clone()
            }
            None => view::write_page_file(&std::env::temp_dir(), &page_stem(path), &page)?,
        };
        tracing::info!(path = %page_path.display(), "Wrote sandboxed preview");
        eprintln!("{} {}", i18n::preview_page_written(), page_path.display());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let mut json = view::email_json(&email, session.mode(), &rendered);
        json["headers"] = serde_json::to_value(&headers)?;
        writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
    } else {
        view::write_summary(&mut out, &path.display().to_string(), file_size, &email)?;
        view::write_headers(&mut out, &headers)?;
        view::write_body(&mut out, &rendered, email.is_truncated())?;
        writeln!(out)?;
    }
    Ok(())
}

/// Print only the headers.
fn cmd_headers(
    path: &Path,
    filter: Option<&str>,
    json: bool,
    options: &ParseOptions,
) -> anyhow::Result<()> {
    let email = open_email(path, options);
    let headers = match filter {
        Some(needle) => email.filter_headers(needle),
        None => email.headers().iter().collect(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&headers)?)?;
    } else {
        view::write_headers(&mut out, &headers)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Input file stem, used to name the preview page.
fn page_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, i18n::app_name(), &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
