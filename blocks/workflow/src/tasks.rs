use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use taskproof_atoms::notifications::model::task_assigned_notification;
use taskproof_atoms::tasks::model::{validate_create, CreateTaskPayload, Task, TaskStatus};
use taskproof_atoms::{notifications, tasks, users};

/// Status filter for the admin dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTaskFilter {
    All,
    Pending,
    AwaitingApproval,
    Completed,
}

impl AdminTaskFilter {
    pub fn parse(param: Option<&str>) -> Option<AdminTaskFilter> {
        match param.unwrap_or("all") {
            "all" => Some(AdminTaskFilter::All),
            "pending" => Some(AdminTaskFilter::Pending),
            "awaiting_approval" => Some(AdminTaskFilter::AwaitingApproval),
            "completed" => Some(AdminTaskFilter::Completed),
            _ => None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            AdminTaskFilter::All => true,
            AdminTaskFilter::Pending => task.status == TaskStatus::Pending,
            AdminTaskFilter::AwaitingApproval => task.status == TaskStatus::AwaitingApproval,
            AdminTaskFilter::Completed => task.status == TaskStatus::Completed,
        }
    }
}

/// Filter for the user dashboard tabs. "Pending" covers everything still
/// in flight, including the rejected vocabulary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTaskFilter {
    All,
    Pending,
    Completed,
}

impl UserTaskFilter {
    pub fn parse(param: Option<&str>) -> Option<UserTaskFilter> {
        match param.unwrap_or("all") {
            "all" => Some(UserTaskFilter::All),
            "pending" => Some(UserTaskFilter::Pending),
            "completed" => Some(UserTaskFilter::Completed),
            _ => None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            UserTaskFilter::All => true,
            UserTaskFilter::Pending => matches!(
                task.status,
                TaskStatus::Pending | TaskStatus::AwaitingApproval | TaskStatus::Rejected
            ),
            UserTaskFilter::Completed => task.status == TaskStatus::Completed,
        }
    }
}

/// A task is visible to its assignee only once the start-date gate has
/// passed. An absent or unparseable start date never hides a task.
pub fn visible_to_assignee(
    task: &Task,
    user_id: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> bool {
    if task.assigned_to != user_id {
        return false;
    }
    match &task.start_date {
        None => true,
        Some(start_date) => match chrono::DateTime::parse_from_rfc3339(start_date) {
            Ok(start) => start <= now,
            Err(_) => true,
        },
    }
}

/// Create a new task plus its assignment notification
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    created_by: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateTaskPayload = serde_json::from_slice(body)?;

    // Validation happens before any backend call; the error names the
    // first failing field.
    if let Err(e) = validate_create(&payload) {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?);
    }

    // The assignee must be a real identity.
    let assignee = match users::service::get_profile(client, table_name, &payload.assigned_to).await
    {
        Ok(profile) => profile,
        Err(e) if e == "Profile not found" => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "assigned_to must reference an existing user"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?);
        }
    };

    let task = tasks::service::create_task(client, table_name, created_by, payload)
        .await
        .map_err(|e| {
            Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
                as Box<dyn std::error::Error + Send + Sync>
        })?;

    // One notification per creation, addressed to the assignee. No
    // cross-operation transaction: a failure here leaves the task in
    // place, so it is logged and the create still succeeds.
    let (title, message) = task_assigned_notification(task.task_number, &task.title);
    if let Err(e) = notifications::service::create_notification(
        client,
        table_name,
        &task.assigned_to,
        Some(&task.task_id),
        &title,
        &message,
    )
    .await
    {
        tracing::warn!(
            "Task #{} created but notification for {} failed: {}",
            task.task_number,
            assignee.username,
            e
        );
    }

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&task)?.into())
        .map_err(Box::new)?)
}

/// List tasks for the admin dashboard, joined with assignee display names
pub async fn list_admin_tasks(
    client: &DynamoClient,
    table_name: &str,
    status_param: Option<&str>,
) -> Result<Response<Body>, Error> {
    let filter = match AdminTaskFilter::parse(status_param) {
        Some(filter) => filter,
        None => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "status must be one of all, pending, awaiting_approval, completed"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    // Fetch tasks and profiles in parallel, then join in memory.
    let (tasks_result, profiles_result) = tokio::join!(
        tasks::service::load_tasks(client, table_name),
        users::service::load_profiles(client, table_name)
    );

    let task_rows = tasks_result.map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;
    let profiles = profiles_result.map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    let usernames = users::service::usernames_by_id(&profiles);

    let mut rows: Vec<Task> = task_rows
        .into_iter()
        .filter(|t| filter.matches(t))
        .map(|mut t| {
            t.assigned_to_username = usernames.get(&t.assigned_to).cloned();
            t
        })
        .collect();

    // Sort by created_at desc (newest first)
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&rows)?.into())
        .map_err(Box::new)?)
}

/// List tasks visible to the calling assignee
pub async fn list_user_tasks(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    filter_param: Option<&str>,
) -> Result<Response<Body>, Error> {
    let filter = match UserTaskFilter::parse(filter_param) {
        Some(filter) => filter,
        None => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "filter must be one of all, pending, completed"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    let task_rows = tasks::service::load_tasks(client, table_name)
        .await
        .map_err(|e| {
            Box::new(std::io::Error::new(std::io::ErrorKind::Other, e))
                as Box<dyn std::error::Error + Send + Sync>
        })?;

    let now = chrono::Utc::now();
    let mut rows: Vec<Task> = task_rows
        .into_iter()
        .filter(|t| visible_to_assignee(t, user_id, now) && filter.matches(t))
        .collect();

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&rows)?.into())
        .map_err(Box::new)?)
}

/// Approve a submission: status -> completed with completion timestamp
pub async fn approve_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    status_transition(tasks::service::approve_task(client, table_name, task_id).await)
}

/// Reject a submission: status back to pending, attachments retained
pub async fn reject_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    status_transition(tasks::service::reject_task(client, table_name, task_id).await)
}

fn status_transition(result: Result<Task, String>) -> Result<Response<Body>, Error> {
    match result {
        Ok(task) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&task)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Task not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus) -> Task {
        Task {
            task_id: "t-1".to_string(),
            task_number: 1,
            title: "Write report".to_string(),
            description: "Please finish the quarterly report".to_string(),
            assigned_to: "user-u".to_string(),
            created_by: "admin-a".to_string(),
            deadline: "2026-08-27T12:00:00Z".to_string(),
            start_date: None,
            status,
            created_at: "2026-08-26T09:00:00Z".to_string(),
            completed_at: None,
            assigned_to_username: None,
        }
    }

    fn now() -> chrono::DateTime<chrono::Utc> {
        "2026-08-26T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn admin_filter_parses_tab_values() {
        assert_eq!(AdminTaskFilter::parse(None), Some(AdminTaskFilter::All));
        assert_eq!(
            AdminTaskFilter::parse(Some("awaiting_approval")),
            Some(AdminTaskFilter::AwaitingApproval)
        );
        assert_eq!(AdminTaskFilter::parse(Some("bogus")), None);
    }

    #[test]
    fn admin_filter_matches_exact_status() {
        assert!(AdminTaskFilter::Pending.matches(&task(TaskStatus::Pending)));
        assert!(!AdminTaskFilter::Pending.matches(&task(TaskStatus::Completed)));
        assert!(AdminTaskFilter::All.matches(&task(TaskStatus::Rejected)));
    }

    #[test]
    fn user_pending_filter_covers_in_flight_statuses() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::AwaitingApproval,
            TaskStatus::Rejected,
        ] {
            assert!(UserTaskFilter::Pending.matches(&task(status)));
        }
        assert!(!UserTaskFilter::Pending.matches(&task(TaskStatus::Completed)));
    }

    #[test]
    fn tasks_for_other_assignees_are_hidden() {
        assert!(!visible_to_assignee(&task(TaskStatus::Pending), "someone-else", now()));
        assert!(visible_to_assignee(&task(TaskStatus::Pending), "user-u", now()));
    }

    #[test]
    fn future_start_date_hides_the_task_until_reached() {
        let mut t = task(TaskStatus::Pending);
        t.start_date = Some("2026-09-01T00:00:00Z".to_string());
        assert!(!visible_to_assignee(&t, "user-u", now()));

        t.start_date = Some("2026-08-26T12:00:00Z".to_string());
        assert!(visible_to_assignee(&t, "user-u", now()));

        t.start_date = Some("2026-08-01T00:00:00Z".to_string());
        assert!(visible_to_assignee(&t, "user-u", now()));
    }

    #[test]
    fn unparseable_start_date_does_not_hide() {
        let mut t = task(TaskStatus::Pending);
        t.start_date = Some("soon".to_string());
        assert!(visible_to_assignee(&t, "user-u", now()));
    }

    #[test]
    fn transition_on_missing_task_maps_to_not_found() {
        let resp = status_transition(Err("Task not found".to_string())).unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn transition_on_backend_error_maps_to_server_error() {
        let resp = status_transition(Err("DynamoDB update_item error: timeout".to_string())).unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
