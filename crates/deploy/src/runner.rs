//! The deployment runner.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    ContractFactory, DeployConfig, DeployedContract, FactoryProvider, PendingDeployment,
};

/// Process exit status of a successful run.
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status of a failed run.
pub const EXIT_FAILURE: u8 = 1;

/// The outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract_name: String,
    pub display_name: String,
    pub network: String,
    pub deployed: DeployedContract,
}

impl DeploymentResult {
    /// The line announcing the deployed address.
    pub fn announcement(&self) -> String {
        format!(
            "The {} contract was deployed to:  {}",
            self.display_name, self.deployed.address
        )
    }
}

/// Deploys one contract through a [`FactoryProvider`].
///
/// The runner resolves the factory, deploys with the configured constructor
/// arguments and waits for confirmation. The wait is bounded by a timeout
/// and stops early when the cancellation token fires. There is no retry.
#[derive(Debug, Clone)]
pub struct DeploymentRunner {
    contract: String,
    display_name: String,
    network: String,
    constructor_args: Vec<String>,
    timeout: Duration,
}

impl DeploymentRunner {
    pub fn new(contract: impl Into<String>, network: impl Into<String>, timeout: Duration) -> Self {
        let contract = contract.into();
        Self {
            display_name: contract.clone(),
            contract,
            network: network.into(),
            constructor_args: Vec::new(),
            timeout,
        }
    }

    /// Build a runner for the contract and network selected in a configuration.
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        Ok(Self::new(&config.contract, &config.network, config.confirmation_timeout()?)
            .display_name(config.display_name())
            .constructor_args(config.constructor_args.clone()))
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn constructor_args(mut self, args: Vec<String>) -> Self {
        self.constructor_args = args;
        self
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the deployment.
    pub async fn run<P: FactoryProvider>(
        &self,
        provider: &P,
        cancel: &CancellationToken,
    ) -> Result<DeploymentResult> {
        tracing::info!(
            contract = %self.contract,
            network = %self.network,
            args = ?self.constructor_args,
            "Deploying contract..."
        );

        let factory = cancellable(cancel, provider.get_contract_factory(&self.contract))
            .await
            .context(format!("Failed to get contract factory for {}", self.contract))?;

        let pending = cancellable(cancel, factory.deploy(&self.constructor_args))
            .await
            .context(format!("Failed to deploy {}", self.contract))?;

        let tx_hash = pending.transaction_hash();
        tracing::info!(
            tx_hash = %tx_hash,
            timeout = ?self.timeout,
            "Waiting for deployment to be confirmed..."
        );

        let deployed = cancellable(cancel, async {
            tokio::time::timeout(self.timeout, pending.deployed())
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Timeout after {:?} waiting for transaction {} to be confirmed",
                        self.timeout,
                        tx_hash
                    )
                })?
        })
        .await
        .context(format!("Failed to confirm deployment of {}", self.contract))?;

        tracing::info!(
            contract = %self.contract,
            address = %deployed.address,
            block_number = ?deployed.block_number,
            gas_used = deployed.gas_used,
            "Contract deployed"
        );

        Ok(DeploymentResult {
            contract_name: self.contract.clone(),
            display_name: self.display_name.clone(),
            network: self.network.clone(),
            deployed,
        })
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => anyhow::bail!("Deployment cancelled"),
        res = fut => res,
    }
}

/// Report the outcome of a run and return the process exit status.
///
/// On success the announcement is the only line written to `out`. On failure
/// the full error chain goes to `err` and nothing is written to `out`.
pub fn report(outcome: &Result<DeploymentResult>, out: &mut impl Write, err: &mut impl Write) -> u8 {
    match outcome {
        Ok(result) => match writeln!(out, "{}", result.announcement()) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                let _ = writeln!(err, "Failed to write deployment result: {e}");
                EXIT_FAILURE
            }
        },
        Err(e) => {
            let _ = writeln!(err, "{e:?}");
            EXIT_FAILURE
        }
    }
}
