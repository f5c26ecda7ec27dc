// Copyright 2026 The Airtime Voucher Service Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process entry point: load configuration, open the Store, and serve
//! the HTTP gateway until interrupted.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use voucher_api::{router, AppState};
use voucher_config::ServiceConfig;
use voucher_store::Store;

#[derive(Parser, Debug)]
#[command(name = "voucherd", about = "Airtime voucher pool service")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ServiceConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            process::exit(1);
        }
    };

    voucher_util::init_logging(&config.logging);

    tracing::info!(bind_addr = %config.bind_addr, database_url = %config.database_url, "starting voucherd");

    let statement_timeout = config
        .statement_timeout_secs
        .map(std::time::Duration::from_secs);
    let store = match Store::connect_with_timeout(&config.database_url, statement_timeout).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "failed to open database");
            process::exit(1);
        }
    };

    let app = router(AppState { store });

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, bind_addr = %config.bind_addr, "failed to bind");
            process::exit(1);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .expect("failed to install signal handler");

    tracing::info!("voucherd listening");
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await;
            tracing::info!("shutdown signal received");
        })
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "server exited with error");
        process::exit(1);
    }
}
