use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::DOMAINS_DIR;
use crate::error::Result;
use crate::rules::policy::Policy;

/// Default config file name, looked up in the base directory.
pub const CONFIG_FILE: &str = ".flight-lint.toml";

/// Top-level configuration from `.flight-lint.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lint: LintSettings,
    #[serde(default)]
    pub policy: Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintSettings {
    /// Where `--auto` looks for `*.rules.json`, relative to the base path.
    #[serde(default = "default_domains_dir")]
    pub domains_dir: PathBuf,
    /// Extra exclude globs merged into every rule set.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub respect_gitignore: bool,
}

fn default_domains_dir() -> PathBuf {
    PathBuf::from(DOMAINS_DIR)
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            domains_dir: default_domains_dir(),
            exclude: Vec::new(),
            respect_gitignore: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# flight-lint configuration

[lint]
# Directory searched by `flight-lint lint --auto` for *.rules.json files.
domains_dir = ".flight/domains"

# Extra exclude globs applied to every rule set (relative to the base path).
# exclude = ["generated/**"]

# Also skip files ignored by the top-level .gitignore.
respect_gitignore = false

[policy]
# Results below this severity are hidden and never fail the run
# (GUIDANCE, SHOULD, MUST, NEVER).
min_severity = "GUIDANCE"

# Rule IDs to ignore: "N1" in every domain, or "python/N1" in one domain.
# ignore_rules = ["python/N1"]

# Per-rule severity overrides.
# [policy.overrides]
# "S3" = "MUST"
"#
    }
}
