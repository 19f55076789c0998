use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    AlloyFactoryProvider, ArtifactStore, DeployConfig, DeploymentRecord, DeploymentResult,
    DeploymentRunner,
};

/// Deploys the configured contract to the configured network.
///
/// This ties the pieces together: network connection, artifact lookup, the
/// [`DeploymentRunner`], and the optional deployment record.
#[derive(Debug, Clone)]
pub struct Deployer {
    pub config: DeployConfig,
}

impl Deployer {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    /// Load the deployer configuration from a file and the environment.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        DeployConfig::load(path).map(Self::new)
    }

    pub async fn deploy(&self, cancel: &CancellationToken) -> Result<DeploymentResult> {
        let network = self.config.selected_network()?;
        let runner = DeploymentRunner::from_config(&self.config)?;

        tracing::info!(
            network = %self.config.network,
            url = %network.url,
            artifacts = %self.config.artifacts.display(),
            "Connecting to network..."
        );

        let provider = tokio::select! {
            biased;
            _ = cancel.cancelled() => anyhow::bail!("Deployment cancelled"),
            provider = AlloyFactoryProvider::connect(
                network,
                ArtifactStore::new(&self.config.artifacts),
            ) => provider.context(format!("Failed to connect to network {}", self.config.network))?,
        };

        let result = runner.run(&provider, cancel).await?;

        if self.config.deployments.save {
            let record = DeploymentRecord::new(
                &result,
                provider.chain_id(),
                Some(provider.sender().address()),
            );
            // Record failures are non-fatal.
            match record.save(&self.config.deployments.dir) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "Deployment record saved");
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "Failed to save deployment record");
                }
            }
        }

        Ok(result)
    }
}
