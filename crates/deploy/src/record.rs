use std::path::{Path, PathBuf};

use alloy::primitives::{Address, TxHash};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::DeploymentResult;

/// Metadata about a deployment, stored for downstream consumers.
///
/// Records are written to `{dir}/{network}/{contract}.json`. A later
/// deployment of the same contract to the same network overwrites the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub transaction_hash: TxHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub network: String,
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    /// Unix timestamp when the record was created
    pub deployed_at: i64,
    /// Farmsure version that performed the deployment
    pub farmsure_version: String,
}

impl DeploymentRecord {
    /// Create a record for a confirmed deployment, timestamped now.
    pub fn new(result: &DeploymentResult, chain_id: u64, deployer: Option<Address>) -> Self {
        Self {
            contract_name: result.contract_name.clone(),
            address: result.deployed.address,
            transaction_hash: result.deployed.transaction_hash,
            block_number: result.deployed.block_number,
            network: result.network.clone(),
            chain_id,
            deployer,
            deployed_at: chrono::Utc::now().timestamp(),
            farmsure_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The path of the record inside a deployments directory.
    ///
    /// Fully qualified contract names only keep the contract part.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        let contract = self
            .contract_name
            .rsplit_once(':')
            .map_or(self.contract_name.as_str(), |(_, name)| name);
        dir.join(&self.network).join(format!("{contract}.json"))
    }

    /// Save the record into a deployments directory, returning its path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.path_in(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create deployments directory {}",
                parent.display()
            ))?;
        }

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment record")?;
        std::fs::write(&path, json).context(format!(
            "Failed to write deployment record to {}",
            path.display()
        ))?;

        Ok(path)
    }
}
