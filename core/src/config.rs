use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};

/// Environment variable naming the working root.
pub const ENV_ROOT: &str = "BOOTSTRAP_ROOT";

/// Environment variable holding the entry point command line.
pub const ENV_ENTRYPOINT: &str = "BOOTSTRAP_ENTRYPOINT";

/// Environment variable naming a YAML config file.
pub const ENV_CONFIG: &str = "BOOTSTRAP_CONFIG";

/// Process started once the layout is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPoint {
    /// Executable path or name looked up in `PATH`
    pub program: String,

    /// Fixed arguments; the bootstrap never appends its own
    #[serde(default)]
    pub args: Vec<String>,
}

impl EntryPoint {
    /// Build an entry point from a program and its fixed arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let entrypoint = Self {
            program: program.into(),
            args,
        };
        entrypoint.validate()?;
        Ok(entrypoint)
    }

    /// Parse a whitespace-separated command line (`program arg...`).
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().ok_or_else(|| {
            BootstrapError::Config("entry point command line is empty".to_string())
        })?;
        Self::new(program, parts.collect())
    }

    /// Build an entry point from a trailing argv (`program arg...`).
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BootstrapError::Config("entry point command is empty".to_string()))?;
        Self::new(program.clone(), args.to_vec())
    }

    fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(BootstrapError::Config(
                "entry point program must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Working root under which the runtime layout is provisioned
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Entry point started after provisioning
    #[serde(default)]
    pub entrypoint: Option<EntryPoint>,
}

impl BootstrapConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            BootstrapError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        if let Some(entrypoint) = &config.entrypoint {
            entrypoint.validate()?;
        }
        Ok(config)
    }

    /// Parse configuration from environment variables.
    ///
    /// Expected environment variables:
    /// - BOOTSTRAP_ROOT: working root
    /// - BOOTSTRAP_ENTRYPOINT: entry point command line (space-separated)
    pub fn from_env() -> Result<Self> {
        let root = std::env::var_os(ENV_ROOT)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let entrypoint = match std::env::var(ENV_ENTRYPOINT) {
            Ok(command) if !command.trim().is_empty() => Some(EntryPoint::parse(&command)?),
            _ => None,
        };

        Ok(Self { root, entrypoint })
    }

    /// Config file path named by BOOTSTRAP_CONFIG, if any.
    pub fn env_config_path() -> Option<PathBuf> {
        std::env::var_os(ENV_CONFIG)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            root: other.root.or(self.root),
            entrypoint: other.entrypoint.or(self.entrypoint),
        }
    }

    /// Load file, then environment, then explicit overrides.
    pub fn load(file: Option<&Path>, overrides: Self) -> Result<Self> {
        let env_path = Self::env_config_path();
        let base = match file.or(env_path.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.merge(Self::from_env()?).merge(overrides))
    }

    /// Working root, defaulting to the current directory.
    pub fn root_or_current(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Entry point, required for a hand-off.
    pub fn require_entrypoint(&self) -> Result<&EntryPoint> {
        self.entrypoint.as_ref().ok_or_else(|| {
            BootstrapError::Config(format!(
                "no entry point configured (pass `-- <command>`, set {} or `entrypoint` in the config file)",
                ENV_ENTRYPOINT
            ))
        })
    }
}
