//! Server configuration
//!
//! The bind address comes from the first command line argument; the rest
//! from `CHAT_*` environment variables.

use std::path::PathBuf;

use crate::error::AppError;
use crate::snapshot::SaveMode;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:7777";

/// Channel buffer size for server commands
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub addr: String,
    /// Directory holding the snapshot documents
    pub data_dir: PathBuf,
    /// Load a snapshot at startup
    pub import: bool,
    /// Save a snapshot at shutdown, and how
    pub export: Option<SaveMode>,
    /// Capacity of the ChatServer command channel
    pub command_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            data_dir: PathBuf::from("."),
            import: false,
            export: None,
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

impl Config {
    /// Read configuration from the process arguments and environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(std::env::args().nth(1), |name| std::env::var(name).ok())
    }

    /// Build configuration from an explicit address and variable lookup
    pub fn from_lookup(
        arg_addr: Option<String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(addr) = arg_addr.or_else(|| var("CHAT_ADDR")) {
            config.addr = addr;
        }
        if let Some(dir) = var("CHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = var("CHAT_IMPORT") {
            config.import = parse_flag("CHAT_IMPORT", &flag)?;
        }
        if let Some(mode) = var("CHAT_EXPORT") {
            config.export = match mode.to_ascii_lowercase().as_str() {
                "off" | "none" | "" => None,
                other => Some(other.parse()?),
            };
        }
        if let Some(size) = var("CHAT_COMMAND_BUFFER") {
            config.command_buffer = size
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::Config(format!("CHAT_COMMAND_BUFFER={:?}", size)))?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" | "" => Ok(false),
        _ => Err(AppError::Config(format!("{}={:?}", name, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(None, lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr, "127.0.0.1:7777");
    }

    #[test]
    fn test_argument_overrides_env_addr() {
        let vars = lookup(&[("CHAT_ADDR", "0.0.0.0:1")]);
        let config = Config::from_lookup(Some("0.0.0.0:2".into()), vars).unwrap();
        assert_eq!(config.addr, "0.0.0.0:2");
    }

    #[test]
    fn test_env_values() {
        let config = Config::from_lookup(
            None,
            lookup(&[
                ("CHAT_DATA_DIR", "/var/lib/chat"),
                ("CHAT_IMPORT", "yes"),
                ("CHAT_EXPORT", "append"),
                ("CHAT_COMMAND_BUFFER", "32"),
            ]),
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/chat"));
        assert!(config.import);
        assert_eq!(config.export, Some(SaveMode::Append));
        assert_eq!(config.command_buffer, 32);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(None, lookup(&[("CHAT_IMPORT", "maybe")])).is_err());
        assert!(Config::from_lookup(None, lookup(&[("CHAT_EXPORT", "sideways")])).is_err());
        assert!(Config::from_lookup(None, lookup(&[("CHAT_COMMAND_BUFFER", "0")])).is_err());
    }
}
