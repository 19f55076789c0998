//! farmsure is a CLI tool to deploy the FARMSURE DAO contract.

mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, parse_error_status};
use farmsure_deploy::{DeployConfig, Deployer, DeploymentResult, report};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_status(&e));
        }
    };

    // Initialize the logger. Standard output only carries the deployment result.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling deployment...");
            on_ctrl_c.cancel();
        }
    });

    let outcome = run(&cli, &cancel).await;

    ExitCode::from(report(
        &outcome,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    ))
}

async fn run(cli: &Cli, cancel: &CancellationToken) -> Result<DeploymentResult> {
    let deployer = Deployer::load_from_file(&cli.config)?;
    let deployer = Deployer::new(cli.apply(deployer.config));

    if cli.save_config {
        deployer
            .config
            .save_to_file(&DeployConfig::file_path(&cli.config))?;
    }

    deployer.deploy(cancel).await
}
