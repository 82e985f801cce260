//! Runtime configuration
//!
//! Paths to the external tools and the name of the required extension,
//! with environment-variable overrides so bundled tool installations can
//! point at their own binaries.

use serde::Deserialize;

/// Environment override for the kubectl binary path.
pub const KUBECTL_PATH_ENV: &str = "DECKHAND_KUBECTL";

/// Environment override for the wrapped CLI binary path.
pub const CLI_PATH_ENV: &str = "DECKHAND_CLI";

/// Environment override for the required extension name.
pub const EXTENSION_NAME_ENV: &str = "DECKHAND_EXTENSION";

/// Tool paths and extension identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Binary used for apply invocations.
    pub kubectl_path: String,
    /// Binary hosting the extension query/install commands.
    pub cli_path: String,
    /// Extension that must be installed before deploys are permitted.
    pub extension_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubectl_path: "kubectl".to_string(),
            cli_path: "az".to_string(),
            extension_name: "aks-preview".to_string(),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(KUBECTL_PATH_ENV) {
            config.kubectl_path = path;
        }
        if let Ok(path) = std::env::var(CLI_PATH_ENV) {
            config.cli_path = path;
        }
        if let Ok(name) = std::env::var(EXTENSION_NAME_ENV) {
            config.extension_name = name;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.kubectl_path, "kubectl");
        assert_eq!(config.cli_path, "az");
        assert_eq!(config.extension_name, "aks-preview");
    }

    #[test]
    fn test_deserialize_partial_overrides() {
        let yaml = "kubectl_path: /opt/tools/kubectl\n";
        let value = crate::yaml::parse_document(yaml).unwrap();
        let config: Config = serde_json::from_value(value).unwrap();
        assert_eq!(config.kubectl_path, "/opt/tools/kubectl");
        assert_eq!(config.cli_path, "az");
    }
}
