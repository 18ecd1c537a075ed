//! NATS message handlers

pub mod ping;
pub mod transport_tariff;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::services::tariff::TariffService;

pub const SUBJECT_PING: &str = "tariff.ping";
pub const SUBJECT_HYPERBOLIC_GENERATE: &str = "tariff.transport.hyperbolic.generate";
pub const SUBJECT_LINEAR_GENERATE: &str = "tariff.transport.linear.generate";
pub const SUBJECT_CONFIG_GET: &str = "tariff.transport.config.get";
pub const SUBJECT_RATE_GET: &str = "tariff.transport.rate.get";
pub const SUBJECT_LIST: &str = "tariff.transport.list";

/// Start all message handlers and wait until one of them stops
pub async fn start_handlers(client: Client, service: Arc<TariffService>) -> Result<()> {
    info!("Starting message handlers (store: {})...", service.store_name());

    let ping_sub = client.subscribe(SUBJECT_PING).await?;
    let hyperbolic_sub = client.subscribe(SUBJECT_HYPERBOLIC_GENERATE).await?;
    let linear_sub = client.subscribe(SUBJECT_LINEAR_GENERATE).await?;
    let config_sub = client.subscribe(SUBJECT_CONFIG_GET).await?;
    let rate_sub = client.subscribe(SUBJECT_RATE_GET).await?;
    let list_sub = client.subscribe(SUBJECT_LIST).await?;

    info!("Subscribed to NATS subjects");

    let ping_handle = tokio::spawn(ping::handle_ping(client.clone(), ping_sub, Arc::clone(&service)));
    let hyperbolic_handle = tokio::spawn(transport_tariff::handle_generate_hyperbolic(
        client.clone(),
        hyperbolic_sub,
        Arc::clone(&service),
    ));
    let linear_handle = tokio::spawn(transport_tariff::handle_generate_linear(
        client.clone(),
        linear_sub,
        Arc::clone(&service),
    ));
    let config_handle = tokio::spawn(transport_tariff::handle_get_config(
        client.clone(),
        config_sub,
        Arc::clone(&service),
    ));
    let rate_handle = tokio::spawn(transport_tariff::handle_get_rate(
        client.clone(),
        rate_sub,
        Arc::clone(&service),
    ));
    let list_handle = tokio::spawn(transport_tariff::handle_list(client, list_sub, service));

    info!("All handlers started");

    // Any handler exiting means its subscription closed
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = hyperbolic_handle => {
            error!("Hyperbolic generate handler finished: {:?}", result);
        }
        result = linear_handle => {
            error!("Linear generate handler finished: {:?}", result);
        }
        result = config_handle => {
            error!("Config get handler finished: {:?}", result);
        }
        result = rate_handle => {
            error!("Rate get handler finished: {:?}", result);
        }
        result = list_handle => {
            error!("List handler finished: {:?}", result);
        }
    }

    Ok(())
}
