//! farmsure-deploy - Contract deployment library for the FARMSURE DAO.
//!
//! This crate resolves compiled contract artifacts, deploys them to a
//! configured network and reports the deployed address.

mod artifact;
pub use artifact::{ArtifactStore, ContractArtifact, LinkReferences};

mod chain;
pub use chain::{AlloyContractFactory, AlloyFactoryProvider, AlloyPendingDeployment, Sender};

mod config;
pub use config::{
    CONFIG_FILENAME, DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACT, DEFAULT_DEPLOYMENTS_DIR,
    DEFAULT_DISPLAY_NAME, DeployConfig, DeploymentsConfig, ENV_PREFIX,
};

mod deployer;
pub use deployer::Deployer;

mod factory;
pub use factory::{ContractFactory, DeployedContract, FactoryProvider, PendingDeployment};

pub mod network;
pub use network::{Accounts, NetworkConfig};

mod record;
pub use record::DeploymentRecord;

mod runner;
pub use runner::{DeploymentResult, DeploymentRunner, EXIT_FAILURE, EXIT_SUCCESS, report};
