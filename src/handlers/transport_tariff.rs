//! Transport tariff handlers for NATS messages

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::TariffError;
use crate::services::tariff::TariffService;
use crate::types::{
    EmptyPayload, ErrorResponse, GenerateHyperbolicRequest, GenerateLinearRequest,
    ListRatesRequest, RateListResponse, RateLookupRequest, Request, SuccessResponse,
};

/// Publish a tariff error, logging storage failures as errors and user
/// mistakes at debug level
async fn publish_tariff_error(
    client: &Client,
    reply: async_nats::Subject,
    request_id: Uuid,
    err: &TariffError,
) -> Result<()> {
    match err {
        TariffError::Storage(e) => error!("Tariff storage failure: {:#}", e),
        other => debug!("Rejected tariff request: {}", other),
    }
    let response = ErrorResponse::from_tariff_error(request_id, err);
    let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    Ok(())
}

/// Handle tariff.transport.hyperbolic.generate messages
pub async fn handle_generate_hyperbolic(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<TariffService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tariff.transport.hyperbolic.generate message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<GenerateHyperbolicRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match service.generate_hyperbolic(&request.payload).await {
            Ok(result) => {
                let response = SuccessResponse::new(request.id, result);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => publish_tariff_error(&client, reply, request.id, &e).await?,
        }
    }

    Ok(())
}

/// Handle tariff.transport.linear.generate messages
pub async fn handle_generate_linear(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<TariffService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tariff.transport.linear.generate message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<GenerateLinearRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match service.generate_linear(&request.payload).await {
            Ok(result) => {
                let response = SuccessResponse::new(request.id, result);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => publish_tariff_error(&client, reply, request.id, &e).await?,
        }
    }

    Ok(())
}

/// Handle tariff.transport.config.get messages
pub async fn handle_get_config(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<TariffService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tariff.transport.config.get message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<Option<EmptyPayload>> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match service.config_snapshot().await {
            Ok(Some(snapshot)) => {
                let response = SuccessResponse::new(request.id, snapshot);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Ok(None) => {
                let error = ErrorResponse::new(request.id, "NOT_FOUND", "No tariff configuration has been generated yet");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
            Err(e) => publish_tariff_error(&client, reply, request.id, &e).await?,
        }
    }

    Ok(())
}

/// Handle tariff.transport.rate.get messages
pub async fn handle_get_rate(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<TariffService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tariff.transport.rate.get message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RateLookupRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match service.rate_for_distance(request.payload.distance_km).await {
            Ok(Some(row)) => {
                let response = SuccessResponse::new(request.id, row);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Ok(None) => {
                let error = ErrorResponse::new(
                    request.id,
                    "NOT_FOUND",
                    format!("No tariff for {} km", request.payload.distance_km),
                );
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
            Err(e) => publish_tariff_error(&client, reply, request.id, &e).await?,
        }
    }

    Ok(())
}

/// Handle tariff.transport.list messages
pub async fn handle_list(
    client: Client,
    mut subscriber: Subscriber,
    service: Arc<TariffService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tariff.transport.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ListRatesRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match service.list_rates(request.payload.from_km, request.payload.to_km).await {
            Ok(items) => {
                let total = items.len() as i64;
                let response = SuccessResponse::new(request.id, RateListResponse { items, total });
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => publish_tariff_error(&client, reply, request.id, &e).await?,
        }
    }

    Ok(())
}
