use thiserror::Error;

pub type Result<T> = std::result::Result<T, LintError>;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("Invalid rule set {path}: {message}")]
    Load { path: String, message: String },

    #[error("Rule set not found: {0}")]
    RuleSetNotFound(String),

    #[error("Unsupported language '{requested}' (supported: {supported})")]
    UnsupportedLanguage { requested: String, supported: String },

    #[error("Invalid query in rule {rule_id}: {message}")]
    QueryCompile { rule_id: String, message: String },

    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LintError {
    pub(crate) fn load(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Every error surfaced by the library is a setup problem, distinct from
    /// "ran fine, found violations" (exit 1).
    pub fn exit_code(&self) -> i32 {
        2
    }
}
