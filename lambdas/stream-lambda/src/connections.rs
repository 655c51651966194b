use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;

const CONN_PARTITION: &str = "CONN";

/// Register a WebSocket connection on $connect.
pub async fn register_connection(
    client: &DynamoClient,
    table_name: &str,
    connection_id: &str,
) -> Result<(), String> {
    let now = chrono::Utc::now().to_rfc3339();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(CONN_PARTITION.to_string()))
        .item("SK", AttributeValue::S(format!("CONN#{}", connection_id)))
        .item("connected_at", AttributeValue::S(now))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(())
}

/// Drop a connection on $disconnect or when a push comes back Gone.
pub async fn deregister_connection(
    client: &DynamoClient,
    table_name: &str,
    connection_id: &str,
) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(CONN_PARTITION.to_string()))
        .key("SK", AttributeValue::S(format!("CONN#{}", connection_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// List every registered connection id.
pub async fn load_connection_ids(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<String>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(CONN_PARTITION.to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("CONN#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut connection_ids = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(connection_id) = sk.strip_prefix("CONN#") {
                connection_ids.push(connection_id.to_string());
            }
        }
    }

    Ok(connection_ids)
}
