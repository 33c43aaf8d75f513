use std::env;
use std::time::Duration;

use anyhow::{Context, bail};
use rpanos::client::ApiClient;
use rpanos::config::ClientConfig;
use rpanos::filters::{extract_job_id, is_job_success};
use rpanos::ha;
use rpanos::job::JobPoller;
use rpanos::matrix::{UpgradeMatrix, is_upgrade_path_valid};
use tokio_util::sync::CancellationToken;

fn print_usage() {
    eprintln!(
        "Usage: cargo run --example upgrade_workflow -- <client.yaml> <matrix.yaml> <device-hostname> <target-version> [--dry-run]"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        print_usage();
        std::process::exit(2);
    }
    let dry_run = args.iter().skip(5).any(|a| a == "--dry-run");

    let config = ClientConfig::from_path(&args[1]).context("loading client config")?;
    config.validate()?;
    let matrix = UpgradeMatrix::from_path(&args[2]).context("loading upgrade matrix")?;
    let device_name = &args[3];
    let target_version = &args[4];

    let client = ApiClient::new(config)?;
    let device = client.get_device_by_name(device_name).await?;
    println!(
        "device={} serial={} version={} connected={} ha={}",
        device.hostname, device.serial, device.sw_version, device.connected, device.ha_state
    );
    if !device.connected {
        bail!("device {} is not connected to the manager", device.hostname);
    }

    let path = is_upgrade_path_valid(&device.sw_version, target_version, &matrix);
    if !path.valid {
        bail!(
            "no upgrade path from {} to {}",
            device.sw_version,
            target_version
        );
    }
    for hop in &path.required_intermediates {
        println!("  intermediate train: {hop}");
    }

    let snapshot = ha::extract(&client.get_ha_state(Some(&device.serial)).await?);
    println!(
        "ha enabled={} role={:?} peer_state={} sync={}",
        snapshot.enabled,
        snapshot.role(),
        snapshot.peer_state,
        snapshot.running_sync
    );

    if dry_run {
        println!("dry-run: stopping before download");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let poller = JobPoller::from_config(client.config()).with_cancellation(cancel);
    let response = client
        .download_software(target_version, Some(&device.serial), false)
        .await?;
    let job_id = extract_job_id(&response).context("download did not start a job")?;

    let outcome = poller
        .wait_with_progress(&client, &job_id, Some(&device.serial), |status| {
            println!("  job {} {} {}%", status.job_id, status.status, status.progress_percent)
        })
        .await?;
    if !is_job_success(&outcome.result) {
        bail!("download job {job_id} ended with {}", outcome.result);
    }

    println!(
        "downloaded {} in {:?}",
        target_version,
        Duration::from_secs(outcome.elapsed.as_secs())
    );
    Ok(())
}
