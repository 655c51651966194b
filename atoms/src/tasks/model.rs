use serde::{Deserialize, Serialize};

/// Task lifecycle status. `Rejected` exists in the vocabulary and is
/// accepted everywhere a status is read, but the reject operation sends
/// tasks back to `Pending` so assignees can resubmit.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    AwaitingApproval,
    Completed,
    Rejected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::AwaitingApproval => "awaiting_approval",
            TaskStatus::Completed => "completed",
            TaskStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "awaiting_approval" => Some(TaskStatus::AwaitingApproval),
            "completed" => Some(TaskStatus::Completed),
            "rejected" => Some(TaskStatus::Rejected),
            _ => None,
        }
    }
}

/// Task domain model - a unit of work with an assignee, deadline and
/// lifecycle status
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub task_id: String,

    /// Human-facing sequential number from the atomic counter item
    pub task_number: u64,

    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: String,
    pub deadline: String,

    /// Visibility gate: assignees see the task only once now >= start_date
    pub start_date: Option<String>,

    pub status: TaskStatus,
    pub created_at: String,
    pub completed_at: Option<String>,

    /// Assignee display name, filled in by blocks/workflow when joining
    /// with profiles for the admin view
    #[serde(default)]
    pub assigned_to_username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub deadline: String,
    pub start_date: Option<String>,
}

/// Validate a create payload before any backend call is made.
/// Reports the first failing field, in form order.
pub fn validate_create(payload: &CreateTaskPayload) -> Result<(), String> {
    if payload.title.chars().count() < 3 {
        return Err("title must be at least 3 characters".to_string());
    }
    if payload.title.chars().count() > 200 {
        return Err("title must be at most 200 characters".to_string());
    }
    if payload.description.chars().count() < 5 {
        return Err("description must be at least 5 characters".to_string());
    }
    if payload.description.chars().count() > 2000 {
        return Err("description must be at most 2000 characters".to_string());
    }
    if payload.assigned_to.trim().is_empty() {
        return Err("assigned_to is required".to_string());
    }
    if payload.deadline.trim().is_empty() {
        return Err("deadline is required".to_string());
    }
    if chrono::DateTime::parse_from_rfc3339(&payload.deadline).is_err() {
        return Err("deadline must be a valid RFC3339 timestamp".to_string());
    }
    if let Some(start_date) = &payload.start_date {
        if chrono::DateTime::parse_from_rfc3339(start_date).is_err() {
            return Err("start_date must be a valid RFC3339 timestamp".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateTaskPayload {
        CreateTaskPayload {
            title: "Write report".to_string(),
            description: "Please finish the quarterly report".to_string(),
            assigned_to: "user-u".to_string(),
            deadline: "2026-08-27T12:00:00Z".to_string(),
            start_date: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_create(&payload()).is_ok());
    }

    #[test]
    fn short_title_fails_naming_title() {
        let mut p = payload();
        p.title = "ab".to_string();
        let err = validate_create(&p).unwrap_err();
        assert!(err.contains("title"));
    }

    #[test]
    fn long_title_fails() {
        let mut p = payload();
        p.title = "x".repeat(201);
        assert!(validate_create(&p).is_err());
        p.title = "x".repeat(200);
        assert!(validate_create(&p).is_ok());
    }

    #[test]
    fn short_description_fails_naming_description() {
        let mut p = payload();
        p.description = "abcd".to_string();
        let err = validate_create(&p).unwrap_err();
        assert!(err.contains("description"));
    }

    #[test]
    fn title_checked_before_description() {
        let mut p = payload();
        p.title = "ab".to_string();
        p.description = "x".to_string();
        let err = validate_create(&p).unwrap_err();
        assert!(err.contains("title"));
    }

    #[test]
    fn missing_assignee_fails() {
        let mut p = payload();
        p.assigned_to = "  ".to_string();
        let err = validate_create(&p).unwrap_err();
        assert!(err.contains("assigned_to"));
    }

    #[test]
    fn unparseable_deadline_fails() {
        let mut p = payload();
        p.deadline = "tomorrow".to_string();
        let err = validate_create(&p).unwrap_err();
        assert!(err.contains("deadline"));
    }

    #[test]
    fn empty_deadline_reports_required() {
        let mut p = payload();
        p.deadline = "".to_string();
        assert_eq!(validate_create(&p).unwrap_err(), "deadline is required");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::AwaitingApproval,
            TaskStatus::Completed,
            TaskStatus::Rejected,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::AwaitingApproval).unwrap();
        assert_eq!(json, "\"awaiting_approval\"");
    }
}
