use std::{io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for talking to the remote restaurant collection.
///
/// Stored as `config.toml` in the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Base URL of the API. The collection lives at `<remote_url>/restaurants`.
    remote_url: Url,

    /// Per-request timeout, in seconds.
    ///
    /// An expired request is reported as the remote being unreachable.
    /// Requests are never retried.
    timeout_secs: u64,

    /// The `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Base URL of the remote API.
    #[must_use]
    pub const fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    /// Point the configuration at a different remote.
    pub fn set_remote_url(&mut self, url: Url) {
        self.remote_url = url;
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sets the per-request timeout, in whole seconds.
    ///
    /// A value of zero is bumped to one second.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout_secs = secs.max(1);
    }
}

/// Errors reading or writing `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] io::Error),
    /// The file could not be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] io::Error),
    /// The file is not valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_remote_url() -> Url {
    Url::parse("http://localhost:1988/api").expect("default remote URL is valid")
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("drawlots/{}", env!("CARGO_PKG_VERSION"))
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_remote_url")]
        remote_url: Url,

        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,

        #[serde(default = "default_user_agent")]
        user_agent: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                remote_url,
                timeout_secs,
                user_agent,
            } => Self {
                remote_url,
                timeout_secs: timeout_secs.max(1),
                user_agent,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            remote_url: config.remote_url,
            timeout_secs: config.timeout_secs,
            user_agent: config.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nremote_url = \"http://192.168.8.150:1988/api\"\ntimeout_secs = 3\nuser_agent = \"test\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.remote_url().as_str(), "http://192.168.8.150:1988/api");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.user_agent, "test");
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ntimeout_secs = \"ten\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config: Config = toml::from_str("_version = \"1\"\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.set_remote_url(Url::parse("https://food.example/api/").unwrap());
        config.set_timeout_secs(30);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
