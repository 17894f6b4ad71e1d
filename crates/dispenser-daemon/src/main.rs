// Copyright (c) 2026 Dispenser Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dispenser_core::{Dispenser, JsonFileCatalog};
use dispenser_daemon::config::DaemonConfig;
use dispenser_daemon::http_api;
use dispenser_daemon::telemetry::Telemetry;

#[derive(Debug, Parser)]
#[command(name = "dispenser-daemon")]
#[command(about = "Hands out territories first come, first served")]
struct Args {
    /// Overrides DISPENSER_LISTEN.
    #[arg(long)]
    listen: Option<String>,

    /// Path to the territory catalog JSON. Overrides DISPENSER_CATALOG_PATH.
    #[arg(long)]
    catalog: Option<String>,

    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .init();

    let mut cfg = DaemonConfig::from_env();
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }
    if let Some(catalog) = args.catalog {
        cfg.catalog_path = catalog.into();
    }

    let dispenser = Dispenser::new(JsonFileCatalog::new(&cfg.catalog_path));
    dispenser.preload();
    let stats = dispenser.stats();

    let listener = http_api::bind_listener(&cfg.listen).await?;
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        catalog = %cfg.catalog_path.display(),
        active = stats.total,
        "starting territory dispenser"
    );

    let state = http_api::build_state(cfg, dispenser, Telemetry::new());
    http_api::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested");
    })
    .await?;

    Ok(())
}
