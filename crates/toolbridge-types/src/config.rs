//! Environment-driven configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::env_utils::{env_string_or, env_var, env_var_or};

/// How the pathfinder ranks same-weight, same-locality candidates by the
/// nesting depth of their defining namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Specificity {
    /// More deeply nested namespaces win.
    #[default]
    Deepest,
    /// Shallower namespaces win.
    Shallowest,
    /// Depth is not considered; registration order decides.
    Ignore,
}

impl Specificity {
    /// Score where higher is better.
    pub fn score(self, depth: usize) -> i64 {
        match self {
            Specificity::Deepest => depth as i64,
            Specificity::Shallowest => -(depth as i64),
            Specificity::Ignore => 0,
        }
    }
}

impl FromStr for Specificity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deepest" => Ok(Specificity::Deepest),
            "shallowest" => Ok(Specificity::Shallowest),
            "ignore" | "none" => Ok(Specificity::Ignore),
            other => Err(format!("unknown namespace preference '{}'", other)),
        }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Specificity::Deepest => "deepest",
            Specificity::Shallowest => "shallowest",
            Specificity::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

/// Process configuration, read once from `TOOLBRIDGE_*` variables.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory for managed temporary files (`None` = OS temp dir).
    pub temp_dir: Option<PathBuf>,
    /// File name prefix for managed temporary files.
    pub temp_prefix: String,
    /// Namespace tie-break policy for the resolution graph.
    pub specificity: Specificity,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_dir: env_var("TOOLBRIDGE_TEMP_DIR"),
            temp_prefix: env_string_or("TOOLBRIDGE_TEMP_PREFIX", &defaults.temp_prefix),
            specificity: env_var_or("TOOLBRIDGE_NAMESPACE_PREFERENCE", defaults.specificity),
            log_level: env_string_or("TOOLBRIDGE_LOG", &defaults.log_level),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            temp_prefix: "tb-".to_string(),
            specificity: Specificity::Deepest,
            log_level: "info".to_string(),
        }
    }
}
