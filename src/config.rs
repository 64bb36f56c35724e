//! Run configuration.
//!
//! Sources, lowest priority first: built-in defaults, the YAML file
//! (`<project>/.mend/config.yaml` or an explicit path), then `MEND_*`
//! environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MendError;
use crate::graph::policy::UpdatePolicy;
use crate::guard::IntegrityGuard;
use crate::logging::LoggingConfig;

/// Config file looked up under the project root when none is given.
pub const DEFAULT_CONFIG_PATH: &str = ".mend/config.yaml";

/// What a rejected repair candidate does to the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityViolationPolicy {
    /// Abort the whole run.
    #[default]
    Abort,
    /// Record the attempt as a failed remediation and move on to the next.
    ConsumeAttempt,
}

/// Where modules and test sources live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// File name marking a module directory.
    pub build_descriptor: String,
    /// Test source root, relative to a module.
    pub test_source_dir: String,
    /// Extension of test source files, without the dot.
    pub test_file_extension: String,
    /// Substring a file name must contain to be treated as a test class.
    pub test_name_marker: String,
    /// How deep below the project root to look for build descriptors.
    pub scan_depth: usize,
    /// Treat the project root itself as a module.
    pub include_root_module: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            build_descriptor: "pom.xml".to_string(),
            test_source_dir: "src/test/kotlin".to_string(),
            test_file_extension: "kt".to_string(),
            test_name_marker: "Test".to_string(),
            scan_depth: 5,
            include_root_module: false,
        }
    }
}

/// Integrity guard patterns (regular expressions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Matches one assertion call site.
    pub assertion_pattern: String,
    /// Matches one test-method marker.
    pub test_marker_pattern: String,
    /// Any match rejects the candidate.
    pub tautology_patterns: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            assertion_pattern: r"\bassert[A-Za-z]*\s*\(".to_string(),
            test_marker_pattern: r"@Test\b".to_string(),
            tautology_patterns: vec![
                r"assertTrue\s*\(\s*true\s*\)".to_string(),
                r"assertFalse\s*\(\s*false\s*\)".to_string(),
                r"assertEquals\s*\(\s*true\s*,\s*true\s*\)".to_string(),
            ],
        }
    }
}

/// Command templates for the test engine. `{class}` is replaced with the
/// shell-quoted fully-qualified class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Runs one test class.
    pub execute_command: String,
    /// Lists a class's test methods as JSON. Empty scans test sources instead.
    pub discover_command: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            execute_command: "mvn -q test -Dtest={class}".to_string(),
            discover_command: String::new(),
        }
    }
}

/// Which repair oracle implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleBackend {
    /// An external command.
    #[default]
    Command,
    /// The Anthropic messages API.
    Anthropic,
}

impl std::str::FromStr for OracleBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(Self::Command),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown oracle backend `{other}` (expected command or anthropic)")),
        }
    }
}

/// Repair oracle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Backend.
    pub backend: OracleBackend,
    /// Command template for the `command` backend; `{prompt}` is replaced
    /// with the shell-quoted prompt.
    pub command: String,
    /// Model for the `anthropic` backend.
    pub model: String,
    /// Completion limit for the `anthropic` backend.
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Command,
            command: "gh copilot -- -p {prompt} --allow-all-tools".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
        }
    }
}

/// Complete configuration for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MendConfig {
    /// Storage directory, relative to the project root unless absolute.
    pub storage_dir: PathBuf,
    /// Repair attempts allowed per failing class.
    pub max_retry_per_class: u32,
    /// Reaction to a rejected repair candidate.
    pub integrity_violation: IntegrityViolationPolicy,
    /// When to rebuild the test structure.
    pub rebuild: UpdatePolicy,
    /// Project layout.
    pub layout: LayoutConfig,
    /// Integrity guard patterns.
    pub guard: GuardConfig,
    /// Test engine commands.
    pub runner: RunnerConfig,
    /// Repair oracle.
    pub oracle: OracleConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".mend"),
            max_retry_per_class: 3,
            integrity_violation: IntegrityViolationPolicy::default(),
            rebuild: UpdatePolicy::default(),
            layout: LayoutConfig::default(),
            guard: GuardConfig::default(),
            runner: RunnerConfig::default(),
            oracle: OracleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MendConfig {
    /// Loads configuration for `project_root`.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present, otherwise built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] for unreadable or invalid YAML, bad
    /// environment values, or a configuration that fails validation.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, MendError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = project_root.join(DEFAULT_CONFIG_PATH);
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, MendError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MendError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
            .map_err(|e| MendError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses YAML text. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns the parser message if the YAML is malformed.
    pub fn from_yaml(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// Applies `MEND_MAX_RETRIES`, `MEND_STORAGE_DIR`, `MEND_LOG`, and
    /// `MEND_ORACLE` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] if a value does not parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), MendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MEND_MAX_RETRIES") {
            self.max_retry_per_class = value.trim().parse().map_err(|e| {
                MendError::Config(format!("MEND_MAX_RETRIES `{value}` is not a count: {e}"))
            })?;
        }
        if let Some(value) = lookup("MEND_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("MEND_LOG") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("MEND_ORACLE") {
            self.oracle.backend =
                value.trim().parse().map_err(|e: String| MendError::Config(format!("MEND_ORACLE: {e}")))?;
        }
        Ok(())
    }

    /// Checks ranges and compiles the guard patterns.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), MendError> {
        if self.max_retry_per_class == 0 {
            return Err(MendError::Config("max_retry_per_class must be at least 1".into()));
        }
        if self.layout.scan_depth == 0 {
            return Err(MendError::Config("layout.scan_depth must be at least 1".into()));
        }
        if self.layout.build_descriptor.is_empty() || self.layout.test_file_extension.is_empty() {
            return Err(MendError::Config(
                "layout.build_descriptor and layout.test_file_extension must not be empty".into(),
            ));
        }
        if !self.runner.execute_command.contains("{class}") {
            return Err(MendError::Config("runner.execute_command must contain {class}".into()));
        }
        if self.oracle.backend == OracleBackend::Command && !self.oracle.command.contains("{prompt}") {
            return Err(MendError::Config("oracle.command must contain {prompt}".into()));
        }
        IntegrityGuard::from_config(&self.guard)?;
        Ok(())
    }

    /// Storage directory resolved against `project_root`.
    #[must_use]
    pub fn storage_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.storage_dir)
    }
}
