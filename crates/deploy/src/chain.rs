//! JSON-RPC backed contract factories.

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, TxHash},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use anyhow::{Context, Result};

use crate::{
    ArtifactStore, ContractArtifact, ContractFactory, DeployedContract, FactoryProvider,
    NetworkConfig, PendingDeployment,
};

/// The account transactions are sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Sender {
    /// Signed locally, by the network's configured account.
    #[display("{_0} (local signer)")]
    Local(Address),
    /// Signed by the node, from one of its unlocked accounts.
    #[display("{_0} (node account)")]
    Node(Address),
}

impl Sender {
    pub fn address(&self) -> Address {
        match self {
            Sender::Local(address) | Sender::Node(address) => *address,
        }
    }
}

/// Resolves contract factories from compiled artifacts and deploys them
/// through a JSON-RPC provider.
#[derive(Clone)]
pub struct AlloyFactoryProvider {
    provider: DynProvider,
    artifacts: ArtifactStore,
    sender: Sender,
    chain_id: u64,
    confirmations: u64,
}

impl AlloyFactoryProvider {
    /// Connect to a network over HTTP.
    pub async fn connect(network: &NetworkConfig, artifacts: ArtifactStore) -> Result<Self> {
        let (provider, signer) = match network.accounts.signer()? {
            Some(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(network.url.clone())
                    .erased();
                (provider, Some(address))
            }
            None => {
                let provider = ProviderBuilder::new()
                    .connect_http(network.url.clone())
                    .erased();
                (provider, None)
            }
        };

        Self::from_provider(provider, signer, network, artifacts).await
    }

    /// Build on top of an existing provider.
    ///
    /// `signer` is the address of the wallet attached to the provider. Without
    /// one, the node's first unlocked account sends the transactions. The
    /// chain ID is always fetched, and checked when the network declares one.
    pub async fn from_provider(
        provider: DynProvider,
        signer: Option<Address>,
        network: &NetworkConfig,
        artifacts: ArtifactStore,
    ) -> Result<Self> {
        let sender = match signer {
            Some(address) => Sender::Local(address),
            None => {
                let accounts = provider
                    .get_accounts()
                    .await
                    .context(format!("Failed to fetch accounts from {}", network.url))?;
                let address = *accounts.first().context(format!(
                    "No accounts configured and the node at {} has no unlocked accounts",
                    network.url
                ))?;
                Sender::Node(address)
            }
        };

        let chain_id = provider
            .get_chain_id()
            .await
            .context(format!("Failed to fetch chain ID from {}", network.url))?;

        if let Some(expected) = network.chain_id {
            if expected != chain_id {
                anyhow::bail!(
                    "Network is configured with chain ID {} but the node at {} reports {}",
                    expected,
                    network.url,
                    chain_id
                );
            }
        }

        tracing::info!(url = %network.url, chain_id, sender = %sender, "Connected to network");

        Ok(Self {
            provider,
            artifacts,
            sender,
            chain_id,
            confirmations: network.confirmations,
        })
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// The chain ID reported by the node.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl FactoryProvider for AlloyFactoryProvider {
    type Factory = AlloyContractFactory;

    async fn get_contract_factory(&self, name: &str) -> Result<Self::Factory> {
        let artifact = self.artifacts.load(name)?;
        // Surface abstract or unlinked contracts before anything is sent.
        artifact.creation_code()?;

        Ok(AlloyContractFactory {
            provider: self.provider.clone(),
            artifact,
            from: self.sender.address(),
            confirmations: self.confirmations,
        })
    }
}

/// Deploys one compiled contract.
#[derive(Clone)]
pub struct AlloyContractFactory {
    provider: DynProvider,
    artifact: ContractArtifact,
    from: Address,
    confirmations: u64,
}

impl ContractFactory for AlloyContractFactory {
    type Pending = AlloyPendingDeployment;

    async fn deploy(&self, args: &[String]) -> Result<Self::Pending> {
        let code = self.artifact.deploy_code(args)?;
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_deploy_code(code);

        let pending = self.provider.send_transaction(tx).await.context(format!(
            "Failed to send deployment transaction for {}",
            self.artifact.contract_name
        ))?;

        tracing::debug!(
            contract = %self.artifact.contract_name,
            tx_hash = %pending.tx_hash(),
            "Deployment transaction sent"
        );

        Ok(AlloyPendingDeployment {
            pending: pending.with_required_confirmations(self.confirmations),
        })
    }
}

/// A deployment transaction waiting to be confirmed.
pub struct AlloyPendingDeployment {
    pending: PendingTransactionBuilder<Ethereum>,
}

impl PendingDeployment for AlloyPendingDeployment {
    fn transaction_hash(&self) -> TxHash {
        *self.pending.tx_hash()
    }

    async fn deployed(self) -> Result<DeployedContract> {
        let tx_hash = *self.pending.tx_hash();
        let receipt = self
            .pending
            .get_receipt()
            .await
            .context(format!("Failed to get receipt for transaction {tx_hash}"))?;

        deployed_contract(&receipt)
    }
}

/// Extract the deployed contract from a creation receipt.
///
/// Only a successful receipt carrying a contract address yields one.
fn deployed_contract(receipt: &TransactionReceipt) -> Result<DeployedContract> {
    let tx_hash = receipt.transaction_hash;

    if !receipt.status() {
        anyhow::bail!("Deployment transaction {} reverted", tx_hash);
    }

    let address = receipt
        .contract_address
        .context(format!("Receipt of transaction {tx_hash} has no contract address"))?;

    Ok(DeployedContract {
        address,
        transaction_hash: tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
