use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateProfilePayload, Profile};

pub fn profile_from_item(user_id: &str, item: &HashMap<String, AttributeValue>) -> Profile {
    Profile {
        user_id: user_id.to_string(),
        username: item
            .get("username")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        role: item
            .get("role")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "user".to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Create the profile row after Cognito signup.
pub async fn create_profile(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateProfilePayload,
) -> Result<Profile, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("USER#{}", user_id);

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk))
        .item("username", AttributeValue::S(payload.username.clone()))
        .item("role", AttributeValue::S(payload.role.clone()))
        .item("created_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Profile {
        user_id: user_id.to_string(),
        username: payload.username,
        role: payload.role,
        created_at: now,
    })
}

/// Get a profile by identity.
pub async fn get_profile(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Profile, String> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        Ok(profile_from_item(user_id, item))
    } else {
        Err("Profile not found".to_string())
    }
}

/// Load every profile, username ascending. Used for the assignee picker
/// and for the admin list's display-name join.
pub async fn load_profiles(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<Profile>, String> {
    // Profile rows are the only items whose PK equals their SK under the
    // USER# prefix, so a filtered scan picks exactly them.
    let result = client
        .scan()
        .table_name(table_name)
        .filter_expression("begins_with(PK, :prefix) AND PK = SK")
        .expression_attribute_values(":prefix", AttributeValue::S("USER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB scan error: {}", e))?;

    let mut profiles = Vec::new();
    for item in result.items() {
        if let Some(pk) = item.get("PK").and_then(|v| v.as_s().ok()) {
            if let Some(user_id) = pk.strip_prefix("USER#") {
                profiles.push(profile_from_item(user_id, item));
            }
        }
    }

    profiles.sort_by(|a, b| a.username.cmp(&b.username));

    Ok(profiles)
}

/// Index usernames by user id for display-name joins.
pub fn usernames_by_id(profiles: &[Profile]) -> HashMap<String, String> {
    profiles
        .iter()
        .map(|p| (p.user_id.clone(), p.username.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_profile_fields() {
        let mut item = HashMap::new();
        item.insert("username".to_string(), AttributeValue::S("maria".to_string()));
        item.insert("role".to_string(), AttributeValue::S("admin".to_string()));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2026-08-26T09:00:00Z".to_string()),
        );

        let profile = profile_from_item("u-1", &item);
        assert_eq!(profile.username, "maria");
        assert_eq!(profile.role, "admin");
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let item = HashMap::new();
        let profile = profile_from_item("u-1", &item);
        assert_eq!(profile.role, "user");
    }

    #[test]
    fn usernames_index_keys_by_id() {
        let profiles = vec![
            Profile {
                user_id: "u-1".to_string(),
                username: "maria".to_string(),
                role: "user".to_string(),
                created_at: String::new(),
            },
            Profile {
                user_id: "u-2".to_string(),
                username: "omar".to_string(),
                role: "admin".to_string(),
                created_at: String::new(),
            },
        ];
        let index = usernames_by_id(&profiles);
        assert_eq!(index.get("u-2").map(|s| s.as_str()), Some("omar"));
    }
}
