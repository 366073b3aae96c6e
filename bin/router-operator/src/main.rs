use anyhow::Result;
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::fmt::init as tracing_init;

mod kube_store;
mod router_controller;

use router_controller::RouterController;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting router-operator...");

    let client = Client::try_default().await?;
    let controller = RouterController::new(client.clone());

    // Start Router reconciliation
    tokio::spawn(async move {
        if let Err(e) = controller.run().await {
            error!("Router controller error: {}", e);
        }
    });

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}
