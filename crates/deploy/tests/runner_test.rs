//! Integration tests for the deployment runner.
//!
//! The runner is driven through stub factories so no node is needed.
//! Run with: cargo test --test runner_test

use std::{
    future::pending,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use farmsure_deploy::{
    ContractFactory, DeployedContract, DeploymentRunner, EXIT_FAILURE, EXIT_SUCCESS,
    FactoryProvider, PendingDeployment, report,
};
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

/// How a stub behaves at each step.
#[derive(Debug, Clone, Copy)]
enum Behavior {
    Succeed,
    FailLookup,
    FailDeploy,
    FailConfirmation,
    /// The confirmation never arrives.
    Hang,
}

#[derive(Clone)]
struct StubProvider {
    behavior: Behavior,
    deploy_calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            deploy_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }
}

impl FactoryProvider for StubProvider {
    type Factory = StubFactory;

    async fn get_contract_factory(&self, name: &str) -> Result<Self::Factory> {
        if let Behavior::FailLookup = self.behavior {
            anyhow::bail!("Artifact for contract {} not found", name);
        }
        Ok(StubFactory {
            behavior: self.behavior,
            deploy_calls: self.deploy_calls.clone(),
        })
    }
}

struct StubFactory {
    behavior: Behavior,
    deploy_calls: Arc<AtomicUsize>,
}

impl ContractFactory for StubFactory {
    type Pending = StubPending;

    async fn deploy(&self, _args: &[String]) -> Result<Self::Pending> {
        // Each deployment creates a new instance at a new address.
        let nonce = self.deploy_calls.fetch_add(1, Ordering::SeqCst) as u8;
        if let Behavior::FailDeploy = self.behavior {
            anyhow::bail!("insufficient funds for gas * price + value");
        }
        Ok(StubPending {
            behavior: self.behavior,
            address: Address::repeat_byte(0xaa - nonce),
        })
    }
}

struct StubPending {
    behavior: Behavior,
    address: Address,
}

impl PendingDeployment for StubPending {
    fn transaction_hash(&self) -> TxHash {
        TxHash::repeat_byte(0x11)
    }

    async fn deployed(self) -> Result<DeployedContract> {
        match self.behavior {
            Behavior::FailConfirmation => anyhow::bail!("transaction reverted"),
            Behavior::Hang => pending().await,
            _ => Ok(DeployedContract {
                address: self.address,
                transaction_hash: self.transaction_hash(),
                block_number: Some(1),
                gas_used: 1_000_000,
            }),
        }
    }
}

fn runner() -> DeploymentRunner {
    DeploymentRunner::new("FARMSUREDAO", "localhost", TIMEOUT).display_name("FARMSURE DAO")
}

/// Run the runner and report, returning (exit code, stdout, stderr).
async fn run_and_report(
    provider: &StubProvider,
    runner: &DeploymentRunner,
    cancel: &CancellationToken,
) -> (u8, String, String) {
    let outcome = runner.run(provider, cancel).await;
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = report(&outcome, &mut out, &mut err);
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

fn is_address_token(token: &str) -> bool {
    token.len() == 42
        && token.starts_with("0x")
        && token[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_successful_deployment_prints_address() {
    let provider = StubProvider::new(Behavior::Succeed);
    let (code, out, err) = run_and_report(&provider, &runner(), &CancellationToken::new()).await;

    assert_eq!(code, EXIT_SUCCESS);
    assert!(err.is_empty(), "{err}");

    let lines = out.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("The FARMSURE DAO contract was deployed to:  0x"));

    let addresses = lines[0]
        .split_whitespace()
        .filter(|token| is_address_token(token))
        .collect::<Vec<_>>();
    assert_eq!(addresses.len(), 1);
    assert_eq!(
        addresses[0].parse::<Address>().unwrap(),
        Address::repeat_byte(0xaa)
    );
}

#[tokio::test]
async fn test_deploy_failure_exits_with_error() {
    let provider = StubProvider::new(Behavior::FailDeploy);
    let (code, out, err) = run_and_report(&provider, &runner(), &CancellationToken::new()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(out.is_empty());
    assert!(err.contains("insufficient funds"), "{err}");
}

#[tokio::test]
async fn test_lookup_failure_skips_deployment() {
    let provider = StubProvider::new(Behavior::FailLookup);
    let (code, out, err) = run_and_report(&provider, &runner(), &CancellationToken::new()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(out.is_empty());
    assert!(err.contains("FARMSUREDAO"), "{err}");
    assert_eq!(provider.deploy_calls(), 0);
}

#[tokio::test]
async fn test_confirmation_failure_exits_with_error() {
    let provider = StubProvider::new(Behavior::FailConfirmation);
    let (code, out, err) = run_and_report(&provider, &runner(), &CancellationToken::new()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(out.is_empty());
    assert!(err.contains("reverted"), "{err}");
    assert_eq!(provider.deploy_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout() {
    let provider = StubProvider::new(Behavior::Hang);
    let (code, out, err) = run_and_report(&provider, &runner(), &CancellationToken::new()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(out.is_empty());
    assert!(err.contains("Timeout"), "{err}");
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let provider = StubProvider::new(Behavior::Hang);
    let cancel = CancellationToken::new();
    let runner = DeploymentRunner::new("FARMSUREDAO", "localhost", Duration::from_secs(3600));

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let (code, out, err) = run_and_report(&provider, &runner, &cancel).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(out.is_empty());
    assert!(err.contains("cancelled"), "{err}");
}

#[tokio::test]
async fn test_cancelled_before_start_never_deploys() {
    let provider = StubProvider::new(Behavior::Succeed);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = runner().run(&provider, &cancel).await;

    assert!(result.is_err());
    assert_eq!(provider.deploy_calls(), 0);
}

#[tokio::test]
async fn test_repeated_runs_deploy_new_instances() {
    let provider = StubProvider::new(Behavior::Succeed);
    let cancel = CancellationToken::new();

    let first = runner().run(&provider, &cancel).await.unwrap();
    let second = runner().run(&provider, &cancel).await.unwrap();

    assert_ne!(first.deployed.address, second.deployed.address);
    assert_eq!(provider.deploy_calls(), 2);
}
