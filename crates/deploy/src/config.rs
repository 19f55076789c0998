//! Deployment configuration.
//!
//! The configuration is layered: built-in defaults, then the `Farmsure.toml`
//! file (when present), then `FARMSURE_*` environment variables. Nested keys
//! are separated by a double underscore, e.g.
//! `FARMSURE_NETWORKS__SEPOLIA__URL`.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::network::{DEFAULT_NETWORK, NetworkConfig, builtin_networks};

/// The default name for the farmsure configuration file.
pub const CONFIG_FILENAME: &str = "Farmsure.toml";

/// Prefix of the environment variables read into the configuration.
pub const ENV_PREFIX: &str = "FARMSURE_";

/// The contract deployed when none is configured.
pub const DEFAULT_CONTRACT: &str = "FARMSUREDAO";

/// The label printed for the default contract.
pub const DEFAULT_DISPLAY_NAME: &str = "FARMSURE DAO";

/// The default Hardhat artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default directory for deployment records.
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// Settings for persisting deployment records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentsConfig {
    /// Whether to write a record after a successful deployment.
    pub save: bool,
    /// The directory records are written to.
    pub dir: PathBuf,
}

impl Default for DeploymentsConfig {
    fn default() -> Self {
        Self {
            save: false,
            dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
        }
    }
}

/// Everything needed to deploy one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// The contract to deploy, by name or fully qualified name.
    pub contract: String,
    /// The human readable name used when reporting the deployment.
    ///
    /// Defaults to the contract name, or `FARMSURE DAO` for the default contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Constructor arguments, in their textual form. Numbers and booleans
    /// are accepted unquoted.
    #[serde(default, deserialize_with = "deserialize_args")]
    pub constructor_args: Vec<String>,
    /// Path to the compiled artifacts.
    pub artifacts: PathBuf,
    /// The selected network.
    pub network: String,
    /// Confirmation timeout overriding the network's, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Known networks, by name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    #[serde(default)]
    pub deployments: DeploymentsConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            contract: DEFAULT_CONTRACT.to_string(),
            display_name: None,
            constructor_args: Vec::new(),
            artifacts: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            network: DEFAULT_NETWORK.to_string(),
            timeout_secs: None,
            networks: builtin_networks(),
            deployments: DeploymentsConfig::default(),
        }
    }
}

impl DeployConfig {
    /// The figment every configuration is extracted from.
    ///
    /// A missing file is not an error: the defaults and environment still apply.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// The configuration file designated by `path`: `Farmsure.toml` inside
    /// it when `path` is a directory, `path` itself otherwise.
    pub fn file_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        }
    }

    /// Load the configuration from a file and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = Self::file_path(path);

        let config: Self = Self::figment(&config_path)
            .extract()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        tracing::debug!(
            path = %config_path.display(),
            found = config_path.exists(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// The name announced for the deployed contract.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None if self.contract == DEFAULT_CONTRACT => DEFAULT_DISPLAY_NAME.to_string(),
            None => self.contract.clone(),
        }
    }

    /// The configuration of the selected network.
    pub fn selected_network(&self) -> Result<&NetworkConfig> {
        self.networks.get(&self.network).with_context(|| {
            format!(
                "Network {} is not configured. Known networks: {}",
                self.network,
                self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }

    /// How long to wait for the deployment to be confirmed.
    pub fn confirmation_timeout(&self) -> Result<Duration> {
        Ok(match self.timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.selected_network()?.timeout(),
        })
    }
}

/// A constructor argument as written in the configuration.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConstructorArg {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Bool(bool),
}

fn deserialize_args<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let args: Vec<ConstructorArg> = Deserialize::deserialize(deserializer)?;
    Ok(args
        .into_iter()
        .map(|arg| match arg {
            ConstructorArg::Text(text) => text,
            ConstructorArg::Unsigned(n) => n.to_string(),
            ConstructorArg::Signed(n) => n.to_string(),
            ConstructorArg::Bool(b) => b.to_string(),
        })
        .collect())
}
