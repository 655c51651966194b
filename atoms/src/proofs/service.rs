use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::Proof;

pub fn proof_from_item(task_id: &str, proof_id: &str, item: &HashMap<String, AttributeValue>) -> Proof {
    Proof {
        proof_id: proof_id.to_string(),
        task_id: task_id.to_string(),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        file_path: item
            .get("file_path")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        uploaded_at: item
            .get("uploaded_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Record one uploaded proof file against its task.
pub async fn create_proof(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    user_id: &str,
    file_path: &str,
) -> Result<Proof, String> {
    let proof_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("TASK#{}", task_id)))
        .item("SK", AttributeValue::S(format!("PROOF#{}", proof_id)))
        .item("user_id", AttributeValue::S(user_id.to_string()))
        .item("file_path", AttributeValue::S(file_path.to_string()))
        .item("uploaded_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Proof {
        proof_id,
        task_id: task_id.to_string(),
        user_id: user_id.to_string(),
        file_path: file_path.to_string(),
        uploaded_at: now,
    })
}

/// Load all proof attachments for a task, newest first.
pub async fn load_proofs_for_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Vec<Proof>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("TASK#{}", task_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("PROOF#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut proofs = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(proof_id) = sk.strip_prefix("PROOF#") {
                proofs.push(proof_from_item(task_id, proof_id, item));
            }
        }
    }

    proofs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

    Ok(proofs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_proof_fields() {
        let mut item = HashMap::new();
        item.insert("user_id".to_string(), AttributeValue::S("user-u".to_string()));
        item.insert(
            "file_path".to_string(),
            AttributeValue::S("user-u/t-1-1700000000000-0.png".to_string()),
        );
        item.insert(
            "uploaded_at".to_string(),
            AttributeValue::S("2026-08-26T09:00:00Z".to_string()),
        );

        let proof = proof_from_item("t-1", "p-1", &item);
        assert_eq!(proof.proof_id, "p-1");
        assert_eq!(proof.task_id, "t-1");
        assert_eq!(proof.user_id, "user-u");
        assert_eq!(proof.file_path, "user-u/t-1-1700000000000-0.png");
    }
}
