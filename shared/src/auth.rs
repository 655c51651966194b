use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Response};

use taskproof_atoms::users;

/// Resolved identity for the request. Every write stamps
/// creator/uploader fields from `user_id`.
pub struct AuthContext {
    pub user_id: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authenticate a request against Cognito using the access token.
///
/// On failure returns a ready-to-send 401 response so route handlers can
/// bail out with a plain `return`.
pub async fn authenticate_request(
    cognito_client: &CognitoClient,
    auth_header: Option<&str>,
) -> Result<AuthContext, Response<Body>> {
    let token = match bearer_token(auth_header) {
        Some(token) => token,
        None => return Err(unauthorized("Missing bearer token")),
    };

    let result = cognito_client.get_user().access_token(token).send().await;

    match result {
        Ok(output) => {
            // The stable identity is the "sub" attribute; the Cognito
            // username is only a fallback.
            let sub = output
                .user_attributes()
                .iter()
                .find(|attr| attr.name() == "sub")
                .and_then(|attr| attr.value())
                .map(|s| s.to_string());

            let user_id = match sub {
                Some(id) => id,
                None => output.username().to_string(),
            };

            Ok(AuthContext { user_id })
        }
        Err(e) => {
            tracing::warn!("Cognito get_user rejected token: {}", e);
            Err(unauthorized("Invalid or expired token"))
        }
    }
}

/// Require the caller to hold the admin role tag.
///
/// Role enforcement lives here at the authorization layer; the workflow
/// services below it do not re-validate.
pub async fn require_admin(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<(), Response<Body>> {
    match users::service::get_profile(client, table_name, user_id).await {
        Ok(profile) if profile.role == "admin" => Ok(()),
        Ok(_) => Err(forbidden("Admin credentials required")),
        Err(e) if e == "Profile not found" => Err(forbidden("Admin credentials required")),
        Err(e) => {
            tracing::error!("Role lookup failed for {}: {}", user_id, e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e))
        }
    }
}

pub fn unauthorized(message: &str) -> Response<Body> {
    error_response(StatusCode::UNAUTHORIZED, message)
}

pub fn forbidden(message: &str) -> Response<Body> {
    error_response(StatusCode::FORBIDDEN, message)
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": message}).to_string().into())
        .unwrap_or_default()
}
