use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flightlint::config::{Config, CONFIG_FILE};
use flightlint::discovery::DOMAINS_DIR;
use flightlint::error::LintError;
use flightlint::output::OutputFormat;
use flightlint::rules::Severity;
use flightlint::LintOptions;

#[derive(Parser)]
#[command(
    name = "flight-lint",
    about = "Rule-based static analysis over tree-sitter syntax trees",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint source files with one or more rule sets
    Lint {
        /// Rule-set documents (*.rules.json)
        rules: Vec<PathBuf>,

        /// Also load every rule set in the domains directory
        #[arg(long)]
        auto: bool,

        /// Directory that file patterns are relative to
        #[arg(long, short = 'b', default_value = ".")]
        base: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (text, json, sarif)
        #[arg(long, short = 'f', default_value = "text")]
        format: String,

        /// Hide results below this severity (GUIDANCE, SHOULD, MUST, NEVER)
        #[arg(long, short = 's')]
        severity: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Disable colored output (also honors NO_COLOR)
        #[arg(long)]
        no_color: bool,
    },

    /// List the rules of one or more rule sets
    ListRules {
        /// Rule-set documents (*.rules.json)
        rules: Vec<PathBuf>,

        /// Also load every rule set in the domains directory
        #[arg(long)]
        auto: bool,

        #[arg(long, short = 'b', default_value = ".")]
        base: PathBuf,

        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .flight-lint.toml and the domains directory
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lint {
            rules,
            auto,
            base,
            config,
            format,
            severity,
            output,
            no_color,
        } => cmd_lint(rules, auto, base, config, format, severity, output, no_color),
        Commands::ListRules {
            rules,
            auto,
            base,
            config,
            format,
        } => cmd_list_rules(rules, auto, base, config, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_lint(
    rules: Vec<PathBuf>,
    auto: bool,
    base: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
    severity_str: Option<String>,
    output_path: Option<PathBuf>,
    no_color: bool,
) -> Result<i32, LintError> {
    let format = OutputFormat::from_str_lenient(&format_str)
        .ok_or_else(|| LintError::Config(format!("unknown format '{}'", format_str)))?;

    let min_severity = severity_str
        .map(|s| {
            Severity::from_str_lenient(&s)
                .ok_or_else(|| LintError::Config(format!("unknown severity '{}'", s)))
        })
        .transpose()?;

    let options = LintOptions {
        rule_paths: rules,
        auto_discover: auto,
        base_path: base,
        config_path: config,
        min_severity_override: min_severity,
    };

    let report = flightlint::lint(&options)?;

    for (domain, error) in report.rule_errors() {
        eprintln!("error: {}: rule {} skipped: {}", domain, error.rule_id, error.message);
    }

    let color = !no_color
        && std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
        && output_path.is_none()
        && std::io::stdout().is_terminal();
    let rendered = flightlint::render_report(&report, format, color)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(report.exit_code())
}

fn cmd_list_rules(
    rules: Vec<PathBuf>,
    auto: bool,
    base: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
) -> Result<i32, LintError> {
    let format = ListFormat::parse(&format_str)?;
    let options = LintOptions {
        rule_paths: rules,
        auto_discover: auto,
        base_path: base,
        config_path: config,
        min_severity_override: None,
    };
    let config = flightlint::load_config(&options)?;
    let paths = flightlint::resolve_rule_set_paths(&options, &config)?;
    let rule_sets = flightlint::load_rule_sets(&paths)?;

    let rules: Vec<_> = rule_sets
        .iter()
        .flat_map(|set| set.rules.iter().map(|r| r.metadata(&set.domain)))
        .collect();

    match format {
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        ListFormat::Table => {
            println!(
                "{:<12} {:<6} {:<32} {:<9} {:<5} LANGUAGE",
                "DOMAIN", "ID", "TITLE", "SEVERITY", "TYPE"
            );
            println!("{}", "-".repeat(80));
            for rule in &rules {
                println!(
                    "{:<12} {:<6} {:<32} {:<9} {:<5} {}",
                    rule.domain,
                    rule.id,
                    rule.title,
                    rule.severity.to_string(),
                    rule.kind,
                    rule.language.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFormat {
    Table,
    Json,
}

impl ListFormat {
    fn parse(s: &str) -> Result<Self, LintError> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(LintError::Config(format!(
                "unknown format '{}' (expected table or json)",
                s
            ))),
        }
    }
}

fn cmd_init(force: bool) -> Result<i32, LintError> {
    init_in(Path::new("."), force)?;
    println!("Created {} and {}/", CONFIG_FILE, DOMAINS_DIR);
    Ok(0)
}

fn init_in(dir: &Path, force: bool) -> Result<(), LintError> {
    let path = dir.join(CONFIG_FILE);

    if path.exists() && !force {
        return Err(LintError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            CONFIG_FILE
        )));
    }

    std::fs::write(&path, Config::starter_toml())?;
    std::fs::create_dir_all(dir.join(DOMAINS_DIR))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_formats() {
        assert_eq!(ListFormat::parse("table").unwrap(), ListFormat::Table);
        assert_eq!(ListFormat::parse("JSON").unwrap(), ListFormat::Json);
        let err = ListFormat::parse("yaml").unwrap_err();
        assert!(matches!(err, LintError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn init_writes_config_and_domains_dir() {
        let dir = TempDir::new().unwrap();
        init_in(dir.path(), false).unwrap();
        assert!(dir.path().join(CONFIG_FILE).is_file());
        assert!(dir.path().join(DOMAINS_DIR).is_dir());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "# mine\n").unwrap();

        let err = init_in(dir.path(), false).unwrap_err();
        assert!(matches!(err, LintError::Config(_)));
        assert_eq!(err.exit_code(), 2);
        let kept = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(kept, "# mine\n");

        init_in(dir.path(), true).unwrap();
        let replaced = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(replaced, Config::starter_toml());
    }
}
