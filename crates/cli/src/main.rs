//! ptree: rebuild process trees from process-creation logs and snapshots
//!
//! Usage:
//!   ptree events.csv                   # Print every root and its descendants
//!   ptree events.ndjson --root-pid 42  # Ancestors and descendants of PID 42
//!   ptree --live                       # Snapshot of running processes (Linux)
//!
//! Output formats:
//!   --mode tree   (default) One tree block
//!   --mode table  One row per printed line
//!   --json        Machine-readable JSON (NDJSON rows in table mode)
//!   --csv         CSV rows (table mode)

use clap::Parser;
use owo_colors::{OwoColorize, Style};
use ptree_core::{
    assemble, build_report, render, LineKind, OutputMode, OutputRecord, PtreeError,
    PtreeOptions, Report, TableRow,
};
use ptree_sources::{load_records, snapshot_processes, InputFormat, SourceError};
use std::io::{self, Write};
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, style::Style as TableStyle, Alignment, Modify},
    Table, Tabled,
};

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ERROR_GENERAL: i32 = 1;
    pub const ERROR_NOT_FOUND: i32 = 2;
    pub const ERROR_INVALID_INPUT: i32 = 4;
}

/// Configuration file support
mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// User configuration from ~/.ptree/config.toml
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Config {
        /// Default field names
        pub fields: FieldConfig,
        /// Default output settings
        pub output: OutputConfig,
        /// Ancestor presentation
        pub ancestors: AncestorConfig,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct FieldConfig {
        pub pid: Option<String>,
        pub ppid: Option<String>,
        pub path: Option<String>,
        pub cmd: Option<String>,
        pub time: Option<String>,
        pub time_format: Option<String>,
        pub ppath: Option<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct OutputConfig {
        /// "tree" or "table"
        pub mode: Option<String>,
        /// Maximum command line length (number or numeric string)
        pub truncate_cmd: Option<toml::Value>,
        /// Disable colored output
        pub no_color: bool,
        /// Use JSON output by default
        pub json: bool,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct AncestorConfig {
        /// Hide ancestors that have no record of their own
        pub suppress_unknown: Option<bool>,
        /// Start the tree at the top-most known ancestor
        pub start_from_root: Option<bool>,
    }

    impl OutputConfig {
        /// The truncation limit as text, whatever its TOML type
        pub fn truncate_cmd_text(&self) -> Option<String> {
            match &self.truncate_cmd {
                Some(toml::Value::Integer(n)) => Some(n.to_string()),
                Some(toml::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ptree").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location
    pub fn load_config(path: Option<&Path>) -> Config {
        let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
            return Config::default();
        };

        if !path.exists() {
            return Config::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => parse_config(&content).unwrap_or_else(|e| {
                log::warn!("ignoring invalid config {}: {}", path.display(), e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(content)
    }

    /// Generate a sample config file content
    pub fn sample_config() -> &'static str {
        r#"# ptree configuration file
# Place this file at ~/.ptree/config.toml

[fields]
# Field names in your records (defaults: pid, ppid, path, cmd)
# Sysmon event 1 style:
# pid = "ProcessId"
# ppid = "ParentProcessId"
# path = "Image"
# cmd = "CommandLine"
# time = "UtcTime"
# time_format = "%Y-%m-%d %H:%M:%S.%f"
# ppath = "ParentImage"

[output]
# "tree" or "table"
mode = "tree"
# Maximum command line characters (0 = unlimited)
truncate_cmd = 0
# Disable colored output
no_color = false
# Use JSON output by default
json = false

[ancestors]
# Hide ancestors that only appear as a parent id
suppress_unknown = false
# Start at the top-most known ancestor instead of the target
start_from_root = true
"#
    }
}

#[derive(Parser)]
#[command(name = "ptree")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  ptree process.csv                     Forest of every root process
  ptree sysmon.ndjson -p 4242           Ancestors and descendants of PID 4242
  ptree sysmon.ndjson -p 4242 --root-path 'C:\\Windows\\System32\\cmd.exe'
  ptree events.json -m table --csv      One CSV row per printed line
  ptree --live -p 1                     Tree of running processes under PID 1")]
struct Cli {
    /// Input file (CSV, JSON array or NDJSON); '-' reads stdin
    #[arg(value_name = "FILE", required_unless_present_any = ["live", "init_config"])]
    input: Option<PathBuf>,

    /// Input format (csv or json); guessed from the file extension by default
    #[arg(long, short = 'f', value_name = "FORMAT")]
    format: Option<InputFormat>,

    /// Capture the running processes instead of reading a file (Linux)
    #[arg(long, conflicts_with = "input")]
    live: bool,

    /// Field holding the process ID
    #[arg(long, value_name = "FIELD")]
    pid_field: Option<String>,

    /// Field holding the parent process ID
    #[arg(long, value_name = "FIELD")]
    ppid_field: Option<String>,

    /// Field holding the process path or image name
    #[arg(long, value_name = "FIELD")]
    path_field: Option<String>,

    /// Field holding the command line
    #[arg(long, value_name = "FIELD")]
    cmd_field: Option<String>,

    /// Field holding the creation time (text or epoch seconds)
    #[arg(long, value_name = "FIELD")]
    time_field: Option<String>,

    /// strptime pattern for the time field, e.g. "%Y-%m-%d %H:%M:%S"
    #[arg(long, value_name = "PATTERN")]
    time_format: Option<String>,

    /// Field holding the parent's path (used when the parent has no record)
    #[arg(long, value_name = "FIELD")]
    ppath_field: Option<String>,

    /// Target process ID; omit to print the whole forest
    #[arg(long, short = 'p', value_name = "PID")]
    root_pid: Option<String>,

    /// Expected path of the target; records with another path are ignored
    #[arg(long, value_name = "PATH")]
    root_path: Option<String>,

    /// Output mode: tree or table
    #[arg(long, short = 'm', value_name = "MODE")]
    mode: Option<OutputMode>,

    /// Maximum command line characters (0 = unlimited)
    #[arg(long, short = 't', value_name = "CHARS")]
    truncate_cmd: Option<String>,

    /// Hide ancestors that only appear as a parent id
    #[arg(long)]
    suppress_unknown_ancestors: bool,

    /// Print the full ancestor chain flat and start the tree at the target
    #[arg(long)]
    start_from_target: bool,

    /// Output as JSON (for scripting and automation)
    #[arg(long, short = 'j', conflicts_with = "csv")]
    json: bool,

    /// Output table rows as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// More log output (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Read defaults from this file instead of ~/.ptree/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate a sample config file at ~/.ptree/config.toml
    #[arg(long)]
    init_config: bool,
}

/// Color configuration for output
struct Colors {
    root: Style,
    guide: Style,
    stub: Style,
    warning: Style,
    error: Style,
    info: Style,
}

impl Colors {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                root: Style::new().bold().white(),
                guide: Style::new().dimmed(),
                stub: Style::new().dimmed().italic(),
                warning: Style::new().yellow(),
                error: Style::new().red().bold(),
                info: Style::new().cyan(),
            }
        } else {
            Self {
                root: Style::new(),
                guide: Style::new(),
                stub: Style::new(),
                warning: Style::new(),
                error: Style::new(),
                info: Style::new(),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configuration file
    let cfg = config::load_config(cli.config.as_deref());
    let colors = Colors::new(!cli.no_color && !cfg.output.no_color && supports_color());

    if cli.init_config {
        handle_init_config(&colors);
        return;
    }

    let options = build_options(&cli, &cfg);
    let json = cli.json || (cfg.output.json && !cli.csv);

    let records = match read_input(&cli) {
        Ok(records) => records,
        Err(e) => {
            let exit_code = match e {
                SourceError::Io { .. } | SourceError::Unsupported(_) => exit_codes::ERROR_GENERAL,
                _ => exit_codes::ERROR_INVALID_INPUT,
            };
            print_error(&colors, &e.to_string());
            std::process::exit(exit_code);
        }
    };
    log::info!("read {} records", records.len());

    match build_report(&records, &options) {
        Ok(report) => {
            for warning in &report.warnings {
                print_warning(&colors, &warning.to_string());
            }
            if let Err(e) = render_report(&report, &options, json, cli.csv, &colors) {
                print_error(&colors, &e);
                std::process::exit(exit_codes::ERROR_GENERAL);
            }
        }
        Err(e) => {
            if json {
                let record = OutputRecord::Error(ptree_core::ErrorResult::new(e.to_string()));
                if let Ok(text) = render::render_json_string(&[record]) {
                    println!("{}", text);
                }
            } else {
                print_error(&colors, &e.to_string());
            }
            std::process::exit(exit_code_for(&e));
        }
    }
    std::process::exit(exit_codes::SUCCESS);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn exit_code_for(error: &PtreeError) -> i32 {
    if error.is_not_found() {
        exit_codes::ERROR_NOT_FOUND
    } else {
        exit_codes::ERROR_INVALID_INPUT
    }
}

/// Merge config file defaults with command line flags (flags win)
fn build_options(cli: &Cli, cfg: &config::Config) -> PtreeOptions {
    let defaults = PtreeOptions::default();
    let pick = |flag: &Option<String>, file: &Option<String>, default: String| {
        flag.clone().or_else(|| file.clone()).unwrap_or(default)
    };
    let fields = &cfg.fields;

    let mut time_field = cli.time_field.clone().or_else(|| fields.time.clone());
    if cli.live && time_field.is_none() {
        time_field = Some(ptree_sources::snapshot::fields::TIME.to_string());
    }

    let mode = cli.mode.unwrap_or_else(|| {
        cfg.output
            .mode
            .as_deref()
            .and_then(|m| {
                m.parse::<OutputMode>()
                    .map_err(|e: String| log::warn!("config: {}", e))
                    .ok()
            })
            .unwrap_or_default()
    });

    let truncate_cmd = cli
        .truncate_cmd
        .clone()
        .or_else(|| cfg.output.truncate_cmd_text())
        .and_then(|raw| ptree_core::options::parse_truncate_limit(&raw));

    PtreeOptions {
        pid_field: pick(&cli.pid_field, &fields.pid, defaults.pid_field),
        ppid_field: pick(&cli.ppid_field, &fields.ppid, defaults.ppid_field),
        path_field: pick(&cli.path_field, &fields.path, defaults.path_field),
        cmd_field: pick(&cli.cmd_field, &fields.cmd, defaults.cmd_field),
        time_field,
        time_format: cli.time_format.clone().or_else(|| fields.time_format.clone()),
        ppath_field: cli.ppath_field.clone().or_else(|| fields.ppath.clone()),
        root_pid: cli.root_pid.clone().unwrap_or_default(),
        root_path: cli.root_path.clone().unwrap_or_default(),
        mode,
        truncate_cmd,
        suppress_unknown_ancestors: cli.suppress_unknown_ancestors
            || cfg.ancestors.suppress_unknown.unwrap_or(false),
        start_from_root: !cli.start_from_target
            && cfg.ancestors.start_from_root.unwrap_or(true),
    }
}

fn read_input(cli: &Cli) -> Result<Vec<ptree_core::Record>, SourceError> {
    if cli.live {
        return snapshot_processes();
    }
    match &cli.input {
        Some(path) => load_records(path, cli.format),
        None => load_records(std::path::Path::new("-"), cli.format),
    }
}

/// Handle --init-config flag
fn handle_init_config(colors: &Colors) {
    let Some(path) = config::config_path() else {
        print_error(colors, "Could not determine home directory");
        std::process::exit(exit_codes::ERROR_GENERAL);
    };

    if path.exists() {
        print_warning(
            colors,
            &format!("Config file already exists: {}", path.display()),
        );
        return;
    }

    let result = path
        .parent()
        .map(std::fs::create_dir_all)
        .unwrap_or(Ok(()))
        .and_then(|_| std::fs::write(&path, config::sample_config()));

    match result {
        Ok(()) => print_info(colors, &format!("Created config file: {}", path.display())),
        Err(e) => {
            print_error(colors, &format!("Failed to write config file: {}", e));
            std::process::exit(exit_codes::ERROR_GENERAL);
        }
    }
}

/// Render a report in the requested output format
fn render_report(
    report: &Report,
    options: &PtreeOptions,
    json: bool,
    csv: bool,
    colors: &Colors,
) -> Result<(), String> {
    match options.mode {
        OutputMode::Tree if json => {
            let records = assemble(report, OutputMode::Tree);
            let text = render::render_json_string(&records)
                .map_err(|e| format!("Failed to render JSON: {}", e))?;
            println!("{}", text);
        }
        OutputMode::Tree => print_colored_tree(report, colors),
        OutputMode::Table if json => {
            let records = assemble(report, OutputMode::Table);
            let text = render::render_json_lines(&records)
                .map_err(|e| format!("Failed to render JSON: {}", e))?;
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        OutputMode::Table if csv => write_csv_rows(report, io::stdout().lock())
            .map_err(|e| format!("Failed to write CSV: {}", e))?,
        OutputMode::Table => print_table(report),
    }
    Ok(())
}

/// Print the tree with dim guides and highlighted roots
fn print_colored_tree(report: &Report, colors: &Colors) {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (i, block) in report.blocks.iter().enumerate() {
        if i > 0 {
            writeln!(out).ok();
        }
        for line in block {
            let body = &line.text[line.tree_prefix.len()..];
            let style = match line.kind {
                LineKind::Root => colors.root,
                LineKind::UnknownAncestor => colors.stub,
                LineKind::Ancestor | LineKind::Descendant => Style::new(),
            };
            writeln!(
                out,
                "{}{}",
                line.tree_prefix.style(colors.guide),
                body.style(style)
            )
            .ok();
        }
    }
}

/// Table row for tabled output
#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Tree")]
    tree: String,
    #[tabled(rename = "PPID")]
    ppid: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Command")]
    cmd: String,
}

impl From<TableRow> for LineRow {
    fn from(row: TableRow) -> Self {
        Self {
            tree: format!("{}{}", row.tree_prefix, row.pid),
            ppid: row.ppid,
            path: row.path,
            time: row.time,
            cmd: row.cmd,
        }
    }
}

fn print_table(report: &Report) {
    let rows: Vec<LineRow> = table_rows(report).map(LineRow::from).collect();
    if rows.is_empty() {
        return;
    }
    let table = Table::new(&rows)
        .with(TableStyle::rounded())
        .with(Modify::new(Columns::single(1)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

fn table_rows(report: &Report) -> impl Iterator<Item = TableRow> {
    assemble(report, OutputMode::Table)
        .into_iter()
        .filter_map(|record| match record {
            OutputRecord::Row(row) => Some(row),
            _ => None,
        })
}

/// Write table rows as CSV with a header line
fn write_csv_rows<W: Write>(report: &Report, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for row in table_rows(report) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Print an error message
fn print_error(colors: &Colors, message: &str) {
    eprintln!("{} {}", "error:".style(colors.error), message);
}

/// Print a warning message
fn print_warning(colors: &Colors, message: &str) {
    eprintln!("{} {}", "warning:".style(colors.warning), message);
}

/// Print an info message
fn print_info(colors: &Colors, message: &str) {
    eprintln!("{} {}", "info:".style(colors.info), message);
}

/// Check if the terminal supports color
fn supports_color() -> bool {
    // Check for common NO_COLOR convention
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    atty::is(atty::Stream::Stdout)
}
