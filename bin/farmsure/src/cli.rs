use std::path::PathBuf;

use clap::Parser;
use farmsure_deploy::{CONFIG_FILENAME, DeployConfig, EXIT_FAILURE, EXIT_SUCCESS};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "farmsure")]
#[command(author, version, about = "Deploy the FARMSURE DAO contract")]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "FARMSURE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file, or to a directory containing Farmsure.toml.
    ///
    /// A missing file is fine: built-in defaults and FARMSURE_* environment
    /// variables still apply.
    #[arg(short, long, alias = "conf", env = "FARMSURE_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// The network to deploy to, as named in the configuration.
    ///
    /// Defaults to `localhost` (http://127.0.0.1:8545).
    #[arg(short, long)]
    pub network: Option<String>,

    /// The contract to deploy, by name or fully qualified name (`contracts/File.sol:Name`).
    #[arg(long)]
    pub contract: Option<String>,

    /// The name used for the contract in the output.
    #[arg(long)]
    pub display_name: Option<String>,

    /// A constructor argument. Repeat for each argument, in order.
    #[arg(long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,

    /// The directory containing the compiled contract artifacts.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Maximum time to wait for the deployment to be confirmed, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Save a deployment record to the deployments directory.
    #[arg(long)]
    pub save: bool,

    /// Write the effective configuration, command line overrides included,
    /// to the configuration file before deploying.
    #[arg(long)]
    pub save_config: bool,
}

impl Cli {
    /// Apply the command line overrides on top of a loaded configuration.
    pub fn apply(&self, mut config: DeployConfig) -> DeployConfig {
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(contract) = &self.contract {
            config.contract = contract.clone();
        }
        if let Some(display_name) = &self.display_name {
            config.display_name = Some(display_name.clone());
        }
        if !self.args.is_empty() {
            config.constructor_args = self.args.clone();
        }
        if let Some(artifacts) = &self.artifacts {
            config.artifacts = artifacts.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if self.save {
            config.deployments.save = true;
        }
        config
    }
}

/// The exit status for a command line that could not be parsed.
///
/// Help and version requests are successful runs.
pub fn parse_error_status(error: &clap::Error) -> u8 {
    if error.use_stderr() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}
