use std::env;
use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use taskproof_atoms as atoms;
use taskproof_shared::{auth, AppState};
use workflow_block::{proofs, tasks};

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

/// Main Lambda handler - authenticates the caller and routes to the
/// workflow and atom handlers
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "taskproof".to_string());
    let bucket_name =
        env::var("PROOF_BUCKET_NAME").unwrap_or_else(|_| "task-screenshots".to_string());

    // Every route requires an authenticated identity; writes stamp
    // creator/uploader fields from it.
    let auth_header = event
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let auth_ctx = match auth::authenticate_request(&state.cognito_client, auth_header).await {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(with_cors_headers(resp)),
    };

    let user_id = auth_ctx.user_id.clone();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Profile routes
    if path.starts_with("/users") {
        let resp = match (method, parts.as_slice()) {
            // POST /users - create profile after Cognito signup
            (&Method::POST, ["users"]) => {
                atoms::users::http::create_profile_handler(
                    &state.dynamo_client,
                    &table_name,
                    &user_id,
                    body,
                )
                .await
            }
            // GET /users - assignee picker list
            (&Method::GET, ["users"]) => {
                atoms::users::http::list_profiles_handler(&state.dynamo_client, &table_name).await
            }
            // GET /users/me - current profile + role
            (&Method::GET, ["users", "me"]) => {
                atoms::users::http::get_me_handler(&state.dynamo_client, &table_name, &user_id)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Task routes
    if path.starts_with("/tasks") {
        let resp = match (method, parts.as_slice()) {
            // GET /tasks?status=... - admin list with assignee-name join
            (&Method::GET, ["tasks"]) => {
                if let Err(resp) =
                    auth::require_admin(&state.dynamo_client, &table_name, &user_id).await
                {
                    return Ok(with_cors_headers(resp));
                }
                let status = event
                    .query_string_parameters_ref()
                    .and_then(|params| params.first("status"))
                    .map(|s| s.to_string());
                tasks::list_admin_tasks(&state.dynamo_client, &table_name, status.as_deref()).await
            }
            // POST /tasks - create task (admin only)
            (&Method::POST, ["tasks"]) => {
                if let Err(resp) =
                    auth::require_admin(&state.dynamo_client, &table_name, &user_id).await
                {
                    return Ok(with_cors_headers(resp));
                }
                tasks::create_task(&state.dynamo_client, &table_name, &user_id, body).await
            }
            // GET /tasks/mine?filter=... - tasks visible to the caller
            (&Method::GET, ["tasks", "mine"]) => {
                let filter = event
                    .query_string_parameters_ref()
                    .and_then(|params| params.first("filter"))
                    .map(|s| s.to_string());
                tasks::list_user_tasks(
                    &state.dynamo_client,
                    &table_name,
                    &user_id,
                    filter.as_deref(),
                )
                .await
            }
            // POST /tasks/{id}/proofs - submit proof of completion
            (&Method::POST, ["tasks", task_id, "proofs"]) => {
                proofs::submit_proof(
                    &state.dynamo_client,
                    &state.s3_client,
                    &table_name,
                    &bucket_name,
                    &user_id,
                    task_id,
                    body,
                )
                .await
            }
            // GET /tasks/{id}/proofs - attachments with signed URLs
            (&Method::GET, ["tasks", task_id, "proofs"]) => {
                proofs::list_task_proofs(
                    &state.dynamo_client,
                    &state.s3_client,
                    &table_name,
                    &bucket_name,
                    task_id,
                )
                .await
            }
            // POST /tasks/{id}/approve - admin decision
            (&Method::POST, ["tasks", task_id, "approve"]) => {
                if let Err(resp) =
                    auth::require_admin(&state.dynamo_client, &table_name, &user_id).await
                {
                    return Ok(with_cors_headers(resp));
                }
                tasks::approve_task(&state.dynamo_client, &table_name, task_id).await
            }
            // POST /tasks/{id}/reject - send back for resubmission
            (&Method::POST, ["tasks", task_id, "reject"]) => {
                if let Err(resp) =
                    auth::require_admin(&state.dynamo_client, &table_name, &user_id).await
                {
                    return Ok(with_cors_headers(resp));
                }
                tasks::reject_task(&state.dynamo_client, &table_name, task_id).await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Notification routes
    if path.starts_with("/notifications") {
        let resp = match (method, parts.as_slice()) {
            // GET /notifications - caller's notifications, newest first
            (&Method::GET, ["notifications"]) => {
                atoms::notifications::http::list_notifications_handler(
                    &state.dynamo_client,
                    &table_name,
                    &user_id,
                )
                .await
            }
            // GET /notifications/unread-count
            (&Method::GET, ["notifications", "unread-count"]) => {
                atoms::notifications::http::unread_count_handler(
                    &state.dynamo_client,
                    &table_name,
                    &user_id,
                )
                .await
            }
            // POST /notifications/{id}/read
            (&Method::POST, ["notifications", notification_id, "read"]) => {
                atoms::notifications::http::mark_read_handler(
                    &state.dynamo_client,
                    &table_name,
                    &user_id,
                    notification_id,
                )
                .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // No matching route
    tracing::warn!("No route matched - Method: {} Path: {}", method, path);
    finalize_response(not_found())
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
