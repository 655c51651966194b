use std::env;
use std::sync::Arc;

use aws_sdk_apigatewaymanagement::Client as ApiGatewayClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

mod broadcast;
mod connections;
mod events;

use events::Incoming;

struct StreamState {
    dynamo_client: DynamoClient,
    apigw_client: ApiGatewayClient,
    table_name: String,
}

/// Change feed entry point. One function serves both the table's stream
/// (fan-out broadcast) and the WebSocket $connect/$disconnect lifecycle.
async fn function_handler(
    event: LambdaEvent<Value>,
    state: Arc<StreamState>,
) -> Result<Value, Error> {
    match events::classify(&event.payload) {
        Incoming::Stream { tasks_changed } => {
            if tasks_changed {
                broadcast::broadcast_tasks_changed(
                    &state.dynamo_client,
                    &state.apigw_client,
                    &state.table_name,
                )
                .await
                .map_err(|e| {
                    Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
                        as Box<dyn std::error::Error + Send + Sync>
                })?;
            } else {
                tracing::debug!("Stream batch touched no task rows, nothing to broadcast");
            }
        }
        Incoming::Connect { connection_id } => {
            connections::register_connection(
                &state.dynamo_client,
                &state.table_name,
                &connection_id,
            )
            .await
            .map_err(|e| {
                Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
        }
        Incoming::Disconnect { connection_id } => {
            connections::deregister_connection(
                &state.dynamo_client,
                &state.table_name,
                &connection_id,
            )
            .await
            .map_err(|e| {
                Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
        }
        Incoming::Unknown => {
            tracing::warn!("Unrecognized event payload, ignoring");
        }
    }

    Ok(serde_json::json!({"statusCode": 200}))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    // post_to_connection must target the WebSocket API's callback URL,
    // not the default service endpoint.
    let callback_url = env::var("WS_CALLBACK_URL").unwrap_or_default();
    let apigw_config = aws_sdk_apigatewaymanagement::config::Builder::from(&config)
        .endpoint_url(callback_url)
        .build();

    let state = Arc::new(StreamState {
        dynamo_client: DynamoClient::new(&config),
        apigw_client: ApiGatewayClient::from_conf(apigw_config),
        table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "taskproof".to_string()),
    });

    run(service_fn(move |event| {
        let state = state.clone();
        async move { function_handler(event, state).await }
    }))
    .await
}
