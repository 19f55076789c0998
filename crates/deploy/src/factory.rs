//! Contract factory abstractions.
//!
//! Deploying goes through three handles, each returned by the previous one:
//! a [`FactoryProvider`] resolves a [`ContractFactory`] by contract name, the
//! factory submits the creation transaction and returns a
//! [`PendingDeployment`], which resolves to a [`DeployedContract`] once the
//! transaction is confirmed.

use std::future::Future;

use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Resolves contract factories by name.
pub trait FactoryProvider: Send + Sync {
    type Factory: ContractFactory;

    /// Get the factory of a contract, by name or fully qualified name.
    fn get_contract_factory(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Factory>> + Send;
}

/// Deploys instances of a single contract.
pub trait ContractFactory: Send + Sync {
    type Pending: PendingDeployment;

    /// Submit a contract creation transaction with the given constructor arguments.
    fn deploy(&self, args: &[String]) -> impl Future<Output = Result<Self::Pending>> + Send;
}

/// A submitted, not yet confirmed, deployment.
pub trait PendingDeployment: Send {
    /// The hash of the creation transaction.
    fn transaction_hash(&self) -> TxHash;

    /// Wait until the deployment is confirmed.
    fn deployed(self) -> impl Future<Output = Result<DeployedContract>> + Send;
}

/// A confirmed contract deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    /// The address of the new contract.
    pub address: Address,
    pub transaction_hash: TxHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
}
