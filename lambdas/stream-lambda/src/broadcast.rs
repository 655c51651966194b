use aws_sdk_apigatewaymanagement::primitives::Blob;
use aws_sdk_apigatewaymanagement::Client as ApiGatewayClient;
use aws_sdk_dynamodb::Client as DynamoClient;

use taskproof_shared::sockets::TableChanged;

use crate::connections::{deregister_connection, load_connection_ids};

/// Push the coarse "tasks table changed" event to every registered
/// connection. Connections that are gone are pruned; other push failures
/// are logged and skipped so one bad client never blocks the rest.
pub async fn broadcast_tasks_changed(
    dynamo_client: &DynamoClient,
    apigw_client: &ApiGatewayClient,
    table_name: &str,
) -> Result<(), String> {
    let connection_ids = load_connection_ids(dynamo_client, table_name).await?;
    let payload = serde_json::to_vec(&TableChanged::tasks())
        .map_err(|e| format!("Serialize broadcast error: {}", e))?;

    tracing::info!(
        "Broadcasting tasks change to {} connection(s)",
        connection_ids.len()
    );

    for connection_id in connection_ids {
        let result = apigw_client
            .post_to_connection()
            .connection_id(&connection_id)
            .data(Blob::new(payload.clone()))
            .send()
            .await;

        if let Err(e) = result {
            let service_error = e.into_service_error();
            if service_error.is_gone_exception() {
                tracing::info!("Pruning stale connection {}", connection_id);
                if let Err(e) = deregister_connection(dynamo_client, table_name, &connection_id).await
                {
                    tracing::warn!("Failed to prune connection {}: {}", connection_id, e);
                }
            } else {
                tracing::error!(
                    "post_to_connection failed for {}: {}",
                    connection_id,
                    service_error
                );
            }
        }
    }

    Ok(())
}
