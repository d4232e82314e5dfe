//! Harness configuration.
//!
//! Values come from a YAML file (`markrun.yaml` in the working directory, or
//! the file given with `--config`) and are then overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;
use tracing::debug;

use crate::errors::{HarnessError, Result};

/// What to do when a selection matches no case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySelectionPolicy {
    /// Treat it as an error (exit code 5).
    #[default]
    Fail,
    /// Run zero cases and report success.
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolves `auto` against whether stdout is a terminal.
    pub fn color_choice(self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

/// Configuration for selection, execution and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub empty_selection: EmptySelectionPolicy,
    pub live_output: bool,
    pub color: ColorMode,
    pub suite_dirs: Vec<PathBuf>,
    pub builtin_suites: bool,
    pub report_json: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            empty_selection: EmptySelectionPolicy::Fail,
            live_output: true,
            color: ColorMode::Auto,
            suite_dirs: Vec::new(),
            builtin_suites: true,
            report_json: None,
        }
    }
}

impl HarnessConfig {
    pub const DEFAULT_FILE: &'static str = "markrun.yaml";

    /// Loads `explicit` if given (it must exist), else [`Self::DEFAULT_FILE`] if
    /// present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(Self::DEFAULT_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    debug!("no {} found, using defaults", Self::DEFAULT_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let config = Self::from_yaml_str(&text, path)?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Parses YAML; `origin` is only used in error messages.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| HarnessError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn allows_empty_selection(&self) -> bool {
        self.empty_selection == EmptySelectionPolicy::Pass
    }
}
