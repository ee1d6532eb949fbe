//! Configuration: TOML file layered under command-line flags
//!
//! Precedence is flag, then file, then built-in default. Everything is
//! validated here so networking never starts with a bad setting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use natter_net::{ServerConfig, DEFAULT_ADDRESS, DEFAULT_PORT, DEFAULT_SEND_TIMEOUT};
use serde::Deserialize;

use crate::cli::{ClientArgs, ServerArgs};

/// Config file name inside the platform config directory
const CONFIG_FILE: &str = "natter.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// On-disk configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub client: ClientSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub address: Option<String>,
    pub port: Option<u16>,
    /// Send timeout per recipient in milliseconds; 0 disables it
    pub send_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
}

impl FileConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit file, or the default file if one exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading default config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("dev", "natter", "natter")?;
    Some(dirs.config_dir().join(CONFIG_FILE))
}

/// Resolved client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub address: String,
    pub port: u16,
    /// Prompted for at startup when absent
    pub name: Option<String>,
}

/// Merge server flags over the file
pub fn resolve_server(args: &ServerArgs, file: &FileConfig) -> Result<ServerConfig, ConfigError> {
    let address = args
        .address
        .clone()
        .or_else(|| file.server.address.clone())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    validate_address(&address)?;

    let port = args.port.or(file.server.port).unwrap_or(DEFAULT_PORT);

    let send_timeout = match file.server.send_timeout_ms {
        None => Some(DEFAULT_SEND_TIMEOUT),
        Some(0) => None,
        Some(ms) => Some(Duration::from_millis(ms)),
    };

    Ok(ServerConfig {
        address,
        port,
        send_timeout,
    })
}

/// Merge client flags over the file
pub fn resolve_client(args: &ClientArgs, file: &FileConfig) -> Result<ClientSettings, ConfigError> {
    let address = args
        .address
        .clone()
        .or_else(|| file.client.address.clone())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    validate_address(&address)?;

    let port = args.port.or(file.client.port).unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(ConfigError::Invalid {
            field: "port",
            reason: "a client cannot dial port 0".to_string(),
        });
    }

    let name = args.name.clone().or_else(|| file.client.name.clone());
    if let Some(name) = &name {
        validate_name(name)?;
    }

    Ok(ClientSettings {
        address,
        port,
        name,
    })
}

fn validate_address(address: &str) -> Result<(), ConfigError> {
    if address.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "address",
            reason: "must not be empty".to_string(),
        });
    }
    if address.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid {
            field: "address",
            reason: format!("'{}' contains whitespace", address),
        });
    }
    Ok(())
}

/// Display names travel inside one frame and are shown on one line
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "name",
            reason: "must not be empty".to_string(),
        });
    }
    if name.contains(['\n', '\r']) {
        return Err(ConfigError::Invalid {
            field: "name",
            reason: "must be a single line".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let server = resolve_server(&ServerArgs::default(), &FileConfig::default()).unwrap();
        assert_eq!(server.address, "localhost");
        assert_eq!(server.port, 14001);
        assert_eq!(server.send_timeout, Some(Duration::from_secs(5)));

        let client = resolve_client(&ClientArgs::default(), &FileConfig::default()).unwrap();
        assert_eq!(client.address, "localhost");
        assert_eq!(client.port, 14001);
        assert_eq!(client.name, None);
    }

    #[test]
    fn test_file_values_apply() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[server]
address = "0.0.0.0"
port = 15000
send_timeout_ms = 2500

[client]
address = "chat.example"
port = 15000
name = "Alice"
"#,
        );

        let file = FileConfig::load(&path).unwrap();
        let server = resolve_server(&ServerArgs::default(), &file).unwrap();
        assert_eq!(server.address, "0.0.0.0");
        assert_eq!(server.port, 15000);
        assert_eq!(server.send_timeout, Some(Duration::from_millis(2500)));

        let client = resolve_client(&ClientArgs::default(), &file).unwrap();
        assert_eq!(client.address, "chat.example");
        assert_eq!(client.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            server: ServerSection {
                port: Some(15000),
                ..Default::default()
            },
            client: ClientSection {
                name: Some("Alice".to_string()),
                ..Default::default()
            },
        };

        let args = ServerArgs {
            port: Some(16000),
            ..Default::default()
        };
        assert_eq!(resolve_server(&args, &file).unwrap().port, 16000);

        let args = ClientArgs {
            name: Some("Bob".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_client(&args, &file).unwrap().name.as_deref(),
            Some("Bob")
        );
    }

    #[test]
    fn test_zero_timeout_disables() {
        let file = FileConfig {
            server: ServerSection {
                send_timeout_ms: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let server = resolve_server(&ServerArgs::default(), &file).unwrap();
        assert_eq!(server.send_timeout, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = ClientArgs {
            port: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            resolve_client(&args, &FileConfig::default()),
            Err(ConfigError::Invalid { field: "port", .. })
        ));

        let args = ServerArgs {
            address: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_server(&args, &FileConfig::default()),
            Err(ConfigError::Invalid { field: "address", .. })
        ));

        let args = ClientArgs {
            name: Some("two\nlines".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_client(&args, &FileConfig::default()),
            Err(ConfigError::Invalid { field: "name", .. })
        ));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[server]\nport = \"not a number\"\n");
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));

        let path = write_config(&temp, "[server]\ncolour = \"blue\"\n");
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(matches!(
            FileConfig::discover(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
