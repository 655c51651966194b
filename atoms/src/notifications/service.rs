use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::Notification;

pub fn notification_from_item(
    user_id: &str,
    notification_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Notification {
    Notification {
        notification_id: notification_id.to_string(),
        user_id: user_id.to_string(),
        task_id: item
            .get("task_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        message: item
            .get("message")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        read: item
            .get("read")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Create an unread notification for a user.
pub async fn create_notification(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: Option<&str>,
    title: &str,
    message: &str,
) -> Result<Notification, String> {
    let notification_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .item("SK", AttributeValue::S(format!("NOTIF#{}", notification_id)))
        .item("title", AttributeValue::S(title.to_string()))
        .item("message", AttributeValue::S(message.to_string()))
        .item("read", AttributeValue::Bool(false))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(task_id) = task_id {
        builder = builder.item("task_id", AttributeValue::S(task_id.to_string()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Notification {
        notification_id,
        user_id: user_id.to_string(),
        task_id: task_id.map(|s| s.to_string()),
        title: title.to_string(),
        message: message.to_string(),
        read: false,
        created_at: now,
    })
}

/// Load a user's notifications, newest first.
pub async fn load_notifications_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Notification>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("USER#{}", user_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("NOTIF#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut notifications = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(notification_id) = sk.strip_prefix("NOTIF#") {
                notifications.push(notification_from_item(user_id, notification_id, item));
            }
        }
    }

    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(notifications)
}

/// Count a user's unread notifications without loading them.
pub async fn unread_count(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<i32, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .filter_expression("#read = :unread")
        .expression_attribute_names("#read", "read")
        .expression_attribute_values(":pk", AttributeValue::S(format!("USER#{}", user_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("NOTIF#".to_string()))
        .expression_attribute_values(":unread", AttributeValue::Bool(false))
        .select(Select::Count)
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.count())
}

/// Flag one notification as read.
pub async fn mark_read(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    notification_id: &str,
) -> Result<(), String> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("NOTIF#{}", notification_id)))
        .update_expression("SET #read = :read")
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_names("#read", "read")
        .expression_attribute_values(":read", AttributeValue::Bool(true))
        .send()
        .await
        .map_err(|e| {
            crate::tasks::service::update_error_message(
                e.into_service_error(),
                "Notification not found",
            )
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_notification_fields_and_defaults_unread() {
        let mut item = HashMap::new();
        item.insert("title".to_string(), AttributeValue::S("New Task Assigned".to_string()));
        item.insert(
            "message".to_string(),
            AttributeValue::S("Task #3 \"Write report\" has been assigned to you.".to_string()),
        );
        item.insert("task_id".to_string(), AttributeValue::S("t-3".to_string()));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2026-08-26T09:00:00Z".to_string()),
        );

        let n = notification_from_item("user-u", "n-1", &item);
        assert_eq!(n.user_id, "user-u");
        assert_eq!(n.task_id.as_deref(), Some("t-3"));
        assert!(!n.read);
    }
}
