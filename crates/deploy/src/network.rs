//! Network and account configuration.

use std::{collections::BTreeMap, time::Duration};

use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// The name of the network used when none is selected.
pub const DEFAULT_NETWORK: &str = "localhost";

/// The RPC endpoint of a development node running on the host.
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default number of blocks to wait for on top of the deployment block.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Default time to wait for the deployment to be confirmed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Accounts used to sign transactions on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accounts {
    /// Hex-encoded private keys. The first key deploys.
    PrivateKeys(Vec<String>),
    /// A BIP-39 mnemonic, deriving `m/44'/60'/0'/0/<index>`.
    Mnemonic {
        mnemonic: String,
        #[serde(default)]
        index: u32,
    },
}

impl Default for Accounts {
    fn default() -> Self {
        Self::PrivateKeys(Vec::new())
    }
}

impl Accounts {
    /// Build the signer of the deploying account.
    ///
    /// Returns `None` when no accounts are configured, in which case
    /// transactions are sent from an account unlocked on the node.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        match self {
            Accounts::PrivateKeys(keys) => keys
                .first()
                .map(|key| {
                    key.trim()
                        .parse::<PrivateKeySigner>()
                        .context("Failed to parse deployer private key")
                })
                .transpose(),
            Accounts::Mnemonic { mnemonic, index } => MnemonicBuilder::<English>::default()
                .phrase(mnemonic.as_str())
                .index(*index)
                .context("Invalid mnemonic derivation index")?
                .build()
                .map(Some)
                .context("Failed to derive deployer key from mnemonic"),
        }
    }
}

/// Connection settings for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The JSON-RPC endpoint.
    pub url: Url,
    /// The expected chain ID. Checked against the node before deploying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub accounts: Accounts,
    /// Blocks to wait for after the deployment transaction is mined.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Maximum time to wait for the deployment to be confirmed, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_confirmations() -> u64 {
    DEFAULT_CONFIRMATIONS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl NetworkConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            chain_id: None,
            accounts: Accounts::default(),
            confirmations: DEFAULT_CONFIRMATIONS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// A development node on the host, with its own unlocked accounts.
    pub fn localhost() -> Self {
        // Constant URL, parsing cannot fail.
        Self::new(Url::parse(LOCALHOST_RPC_URL).expect("valid localhost URL"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The networks known without any configuration.
pub fn builtin_networks() -> BTreeMap<String, NetworkConfig> {
    BTreeMap::from([(DEFAULT_NETWORK.to_string(), NetworkConfig::localhost())])
}
