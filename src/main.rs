//! Purpose: `kvpgen` CLI entry point.
//! Role: Binary crate root; parses args, installs logging, dispatches commands, emits JSON on stdout.
//! Invariants: stdout carries only command results (JSON); logs and diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::{ContextKind, ContextValue, ErrorKind as ClapErrorKind},
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use kvpgen::api::{Error, ErrorKind, GeneratorConfig, RemainderPolicy, to_exit_code};

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `kvpgen --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(cli.verbose);

    command_dispatch::dispatch_command(cli.command)
        .map_err(add_io_hint)
        .map_err(|err| (err, color_mode))
}

/// One-line reason for a rejected command line, built from clap's error
/// context rather than its rendered (possibly colored, multi-line) text.
fn clap_error_summary(err: &clap::Error) -> String {
    let context = |kind| match err.get(kind) {
        Some(ContextValue::String(text)) => Some(text.as_str()),
        _ => None,
    };
    let arg = context(ContextKind::InvalidArg);

    match err.kind() {
        ClapErrorKind::InvalidValue | ClapErrorKind::ValueValidation => {
            match (arg, context(ContextKind::InvalidValue)) {
                (Some(arg), Some(value)) => format!("{arg} does not accept {value:?}"),
                (Some(arg), None) => format!("{arg} was given an unusable value"),
                _ => "a flag was given an unusable value".to_string(),
            }
        }
        ClapErrorKind::UnknownArgument => match arg {
            Some(arg) => format!("{arg} is not a kvpgen flag"),
            None => "unrecognized flag".to_string(),
        },
        ClapErrorKind::InvalidSubcommand => match context(ContextKind::InvalidSubcommand) {
            Some(name) => format!("{name} is not a kvpgen command"),
            None => "unrecognized command".to_string(),
        },
        kind => kind.as_str().unwrap_or("unparseable command line").to_string(),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "kvpgen",
    version,
    about = "Generate noisy key-value-pair fixtures and their canonical JSON",
    help_template = "{name} {version}: {about}\n\n{before-help}\n{usage-heading} {usage}\n\n{all-args}\n\n{after-help}\n",
    long_about = None,
    before_help = "kvpgen builds a parser test pair. big_input_file.txt holds key:value records \
buried in padding, stray quotes and punctuation runs; big_output_file.json holds the \
object a correct parser recovers from it. Invalid records appear only in the input.",
    after_help = r#"Typical runs:
  kvpgen generate --valid 100000 --invalid 1000 --seed 7
  kvpgen generate --config fixture.json --input-out in.txt --expected-out out.json
  kvpgen config --noise-prob 0 > fixture.json

Worker progress is logged at debug level (-vv or RUST_LOG=debug)."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Log more to stderr (-v info, -vv debug); RUST_LOG overrides"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RemainderCli {
    Truncate,
    Distribute,
}

impl From<RemainderCli> for RemainderPolicy {
    fn from(value: RemainderCli) -> Self {
        match value {
            RemainderCli::Truncate => RemainderPolicy::Truncate,
            RemainderCli::Distribute => RemainderPolicy::Distribute,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Write a noisy input file and its expected JSON output",
        after_help = r#"Typical runs:
  kvpgen generate
  kvpgen generate --valid 1000 --invalid 10 --workers 4 --seed 42
  kvpgen generate --noise-prob 0 --key-quote-prob 0 --value-quote-prob 0 --padding-prob 0

Existing output files are replaced only after both new files are complete.
stdout receives a JSON summary with paths, counts, worker counts and the seed;
pass --seed to replay a run, otherwise the drawn seed is in the summary."#
    )]
    Generate(GenerateArgs),
    #[command(
        about = "Print the effective generator configuration as JSON",
        after_help = r#"The output is a valid --config file."#
    )]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    generator: GeneratorArgs,
    #[arg(
        long,
        default_value = "big_input_file.txt",
        value_hint = ValueHint::FilePath,
        help = "Path of the noisy KVP input file"
    )]
    input_out: PathBuf,
    #[arg(
        long,
        default_value = "big_output_file.json",
        value_hint = ValueHint::FilePath,
        help = "Path of the canonical expected-output JSON file"
    )]
    expected_out: PathBuf,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(flatten)]
    generator: GeneratorArgs,
}

#[derive(Args, Debug, Default)]
struct GeneratorArgs {
    #[arg(long, value_hint = ValueHint::FilePath, help = "JSON config file; flags override it")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "N", help = "Number of valid entries")]
    valid: Option<u64>,
    #[arg(long, value_name = "N", help = "Number of invalid (punctuation-key) entries")]
    invalid: Option<u64>,
    #[arg(long, value_name = "N", help = "Worker threads per dictionary")]
    workers: Option<usize>,
    #[arg(long, help = "Seed for reproducible output")]
    seed: Option<u64>,
    #[arg(long, value_name = "P", help = "Probability of a noise run before an entry")]
    noise_prob: Option<f64>,
    #[arg(long, value_name = "P", help = "Probability of quoting a valid key")]
    key_quote_prob: Option<f64>,
    #[arg(long, value_name = "P", help = "Probability of quoting a valid value")]
    value_quote_prob: Option<f64>,
    #[arg(long, value_name = "P", help = "Probability of space padding before a key or value")]
    padding_prob: Option<f64>,
    #[arg(long, value_enum, help = "How a count not divisible by --workers is split")]
    remainder: Option<RemainderCli>,
    #[arg(long, value_name = "N", help = "Records between progress log events (0 disables)")]
    progress_interval: Option<u64>,
    #[arg(long, value_name = "CHAR", help = "Key/value delimiter (default ':')")]
    kv_delimiter: Option<char>,
    #[arg(long, value_name = "CHAR", help = "Item delimiter (default ',')")]
    item_delimiter: Option<char>,
    #[arg(long, value_name = "CHAR", help = "Enclosing (quote) character (default '\"')")]
    enclosing: Option<char>,
    #[arg(long, help = "Pretty-print the expected JSON output")]
    pretty: bool,
}

impl GeneratorArgs {
    fn resolve(&self) -> Result<GeneratorConfig, Error> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(valid) = self.valid {
            config.valid_count = valid;
        }
        if let Some(invalid) = self.invalid {
            config.invalid_count = invalid;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(p) = self.noise_prob {
            config.probabilities.noise = p;
        }
        if let Some(p) = self.key_quote_prob {
            config.probabilities.key_quote = p;
        }
        if let Some(p) = self.value_quote_prob {
            config.probabilities.value_quote = p;
        }
        if let Some(p) = self.padding_prob {
            config.probabilities.padding = p;
        }
        if let Some(remainder) = self.remainder {
            config.remainder = remainder.into();
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if let Some(ch) = self.kv_delimiter {
            config.syntax.kv_delimiter = ch;
        }
        if let Some(ch) = self.item_delimiter {
            config.syntax.item_delimiter = ch;
        }
        if let Some(ch) = self.enclosing {
            config.syntax.enclosing = ch;
        }
        if self.pretty {
            config.pretty_expected = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check that the output directory exists and is writable.")
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn now_rfc3339() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    time::OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, use_color: bool, color: AnsiColor) -> String {
    if !use_color {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\x1b[1;{code}m{label}\x1b[0m")
}
