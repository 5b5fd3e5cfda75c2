//! Environment variable helpers behind [`BridgeConfig::from_env`].
//!
//! Blank values count as unset, and values that fail to parse fall back to
//! the default rather than aborting start-up.
//!
//! ```
//! use toolbridge_types::env_utils::{env_string_or, env_var};
//!
//! let prefix = env_string_or("TOOLBRIDGE_DOC_PREFIX", "tb-");
//! let dir: Option<std::path::PathBuf> = env_var("TOOLBRIDGE_DOC_DIR");
//! assert_eq!(prefix, "tb-");
//! assert!(dir.is_none());
//! ```
//!
//! [`BridgeConfig::from_env`]: crate::BridgeConfig::from_env

use std::str::FromStr;

fn non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Parsed value of `key`, or `None` when unset, blank or unparsable.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    non_blank(key).and_then(|raw| raw.parse().ok())
}

pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

pub fn env_string_or(key: &str, default: &str) -> String {
    non_blank(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Specificity;
    use std::path::PathBuf;

    #[test]
    fn test_blank_and_unparsable_values_are_unset() {
        std::env::set_var("TB_ENV_TEST_BLANK", "   ");
        std::env::set_var("TB_ENV_TEST_BAD", "sideways");

        assert_eq!(env_var::<PathBuf>("TB_ENV_TEST_BLANK"), None);
        assert_eq!(
            env_var_or("TB_ENV_TEST_BAD", Specificity::Shallowest),
            Specificity::Shallowest
        );
        assert_eq!(env_string_or("TB_ENV_TEST_BLANK", "info"), "info");

        std::env::remove_var("TB_ENV_TEST_BLANK");
        std::env::remove_var("TB_ENV_TEST_BAD");
    }

    #[test]
    fn test_values_are_trimmed() {
        std::env::set_var("TB_ENV_TEST_POLICY", " ignore ");
        std::env::set_var("TB_ENV_TEST_DIR", "/scratch/tb ");

        assert_eq!(
            env_var_or("TB_ENV_TEST_POLICY", Specificity::Deepest),
            Specificity::Ignore
        );
        assert_eq!(
            env_var::<PathBuf>("TB_ENV_TEST_DIR"),
            Some(PathBuf::from("/scratch/tb"))
        );
        assert_eq!(env_string_or("TB_ENV_TEST_DIR", "/tmp"), "/scratch/tb");

        std::env::remove_var("TB_ENV_TEST_POLICY");
        std::env::remove_var("TB_ENV_TEST_DIR");
    }
}
