use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateTaskPayload, Task, TaskStatus};

const TASK_PARTITION: &str = "TASK";

/// Map an update failure to a caller-facing message. A failed
/// `attribute_exists` condition means the keyed item does not exist;
/// without that condition update_item would upsert a ghost item.
pub fn update_error_message(e: UpdateItemError, missing: &str) -> String {
    if e.is_conditional_check_failed_exception() {
        missing.to_string()
    } else {
        format!("DynamoDB update_item error: {}", e)
    }
}

/// Map a raw item into the domain model. Missing fields fall back to
/// defaults rather than failing the whole list.
pub fn task_from_item(task_id: &str, item: &HashMap<String, AttributeValue>) -> Task {
    Task {
        task_id: task_id.to_string(),
        task_number: item
            .get("task_number")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        assigned_to: item
            .get("assigned_to")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        created_by: item
            .get("created_by")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        deadline: item
            .get("deadline")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        start_date: item
            .get("start_date")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        status: item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| TaskStatus::parse(s))
            .unwrap_or(TaskStatus::Pending),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        completed_at: item
            .get("completed_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        assigned_to_username: None, // Filled in by blocks/workflow for the admin view
    }
}

/// Claim the next human-facing task number from the atomic counter item.
pub async fn next_task_number(client: &DynamoClient, table_name: &str) -> Result<u64, String> {
    let result = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("COUNTER".to_string()))
        .key("SK", AttributeValue::S("TASK_NUMBER".to_string()))
        .update_expression("ADD task_number :one")
        .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
        .return_values(ReturnValue::UpdatedNew)
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    result
        .attributes()
        .and_then(|attrs| attrs.get("task_number"))
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| "Counter item returned no task_number".to_string())
}

/// Create a new task in `pending`. Validation happens in the workflow
/// layer before this is called.
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    created_by: &str,
    payload: CreateTaskPayload,
) -> Result<Task, String> {
    let task_id = uuid::Uuid::new_v4().to_string();
    let task_number = next_task_number(client, table_name).await?;
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("TASK#{}", task_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("task_number", AttributeValue::N(task_number.to_string()))
        .item("title", AttributeValue::S(payload.title.clone()))
        .item("description", AttributeValue::S(payload.description.clone()))
        .item("assigned_to", AttributeValue::S(payload.assigned_to.clone()))
        .item("created_by", AttributeValue::S(created_by.to_string()))
        .item("deadline", AttributeValue::S(payload.deadline.clone()))
        .item("status", AttributeValue::S(TaskStatus::Pending.as_str().to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(start_date) = &payload.start_date {
        builder = builder.item("start_date", AttributeValue::S(start_date.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Task {
        task_id,
        task_number,
        title: payload.title,
        description: payload.description,
        assigned_to: payload.assigned_to,
        created_by: created_by.to_string(),
        deadline: payload.deadline,
        start_date: payload.start_date,
        status: TaskStatus::Pending,
        created_at: now,
        completed_at: None,
        assigned_to_username: None,
    })
}

/// Load every task. Filtering and ordering happen in the workflow layer.
pub async fn load_tasks(client: &DynamoClient, table_name: &str) -> Result<Vec<Task>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(TASK_PARTITION.to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("TASK#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut tasks = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(task_id) = sk.strip_prefix("TASK#") {
                tasks.push(task_from_item(task_id, item));
            }
        }
    }

    Ok(tasks)
}

/// Get a specific task
pub async fn get_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Task, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        Ok(task_from_item(task_id, item))
    } else {
        Err("Task not found".to_string())
    }
}

/// Admin approval: status -> completed, completion timestamp stamped now.
pub async fn approve_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Task, String> {
    let now = chrono::Utc::now().to_rfc3339();

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .update_expression("SET #status = :status, completed_at = :completed_at")
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_names("#status", "status")
        .expression_attribute_values(
            ":status",
            AttributeValue::S(TaskStatus::Completed.as_str().to_string()),
        )
        .expression_attribute_values(":completed_at", AttributeValue::S(now))
        .send()
        .await
        .map_err(|e| update_error_message(e.into_service_error(), "Task not found"))?;

    get_task(client, table_name, task_id).await
}

/// Admin rejection: status back to pending so the assignee can resubmit.
/// Attachments stay; completed_at is not touched, mirroring the source
/// system's transition rule.
pub async fn reject_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Task, String> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .update_expression("SET #status = :status")
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_names("#status", "status")
        .expression_attribute_values(
            ":status",
            AttributeValue::S(TaskStatus::Pending.as_str().to_string()),
        )
        .send()
        .await
        .map_err(|e| update_error_message(e.into_service_error(), "Task not found"))?;

    get_task(client, table_name, task_id).await
}

/// Flip status to awaiting_approval after a successful proof submission.
pub async fn mark_awaiting_approval(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<(), String> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(format!("TASK#{}", task_id)))
        .update_expression("SET #status = :status")
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_names("#status", "status")
        .expression_attribute_values(
            ":status",
            AttributeValue::S(TaskStatus::AwaitingApproval.as_str().to_string()),
        )
        .send()
        .await
        .map_err(|e| update_error_message(e.into_service_error(), "Task not found"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S("TASK".to_string()));
        item.insert("SK".to_string(), AttributeValue::S("TASK#t-1".to_string()));
        item.insert("task_number".to_string(), AttributeValue::N("7".to_string()));
        item.insert("title".to_string(), AttributeValue::S("Write report".to_string()));
        item.insert(
            "description".to_string(),
            AttributeValue::S("Please finish the quarterly report".to_string()),
        );
        item.insert("assigned_to".to_string(), AttributeValue::S("user-u".to_string()));
        item.insert("created_by".to_string(), AttributeValue::S("admin-a".to_string()));
        item.insert(
            "deadline".to_string(),
            AttributeValue::S("2026-08-27T12:00:00Z".to_string()),
        );
        item.insert("status".to_string(), AttributeValue::S("pending".to_string()));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2026-08-26T09:00:00Z".to_string()),
        );
        item
    }

    #[test]
    fn maps_all_fields() {
        let task = task_from_item("t-1", &item());
        assert_eq!(task.task_id, "t-1");
        assert_eq!(task.task_number, 7);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.assigned_to, "user-u");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.start_date, None);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn unknown_status_falls_back_to_pending() {
        let mut raw = item();
        raw.insert("status".to_string(), AttributeValue::S("archived".to_string()));
        let task = task_from_item("t-1", &raw);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn failed_existence_condition_reads_as_not_found() {
        use aws_sdk_dynamodb::types::error::ConditionalCheckFailedException;

        let e = UpdateItemError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder().build(),
        );
        assert_eq!(update_error_message(e, "Task not found"), "Task not found");
    }

    #[test]
    fn other_update_errors_keep_their_detail() {
        use aws_sdk_dynamodb::types::error::ResourceNotFoundException;

        let e = UpdateItemError::ResourceNotFoundException(
            ResourceNotFoundException::builder().build(),
        );
        let message = update_error_message(e, "Task not found");
        assert!(message.starts_with("DynamoDB update_item error"));
    }

    #[test]
    fn optional_fields_are_carried_through() {
        let mut raw = item();
        raw.insert(
            "start_date".to_string(),
            AttributeValue::S("2026-09-01T00:00:00Z".to_string()),
        );
        raw.insert(
            "completed_at".to_string(),
            AttributeValue::S("2026-08-26T10:00:00Z".to_string()),
        );
        let task = task_from_item("t-1", &raw);
        assert_eq!(task.start_date.as_deref(), Some("2026-09-01T00:00:00Z"));
        assert_eq!(task.completed_at.as_deref(), Some("2026-08-26T10:00:00Z"));
    }
}
