use serde::{Deserialize, Serialize};

/// Notification domain model - addressed to a single user, optionally
/// referencing a task
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub notification_id: String,
    pub user_id: String,
    pub task_id: Option<String>,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

/// Title and message for the one notification created per task-creation
/// event, addressed to the assignee.
pub fn task_assigned_notification(task_number: u64, task_title: &str) -> (String, String) {
    (
        "New Task Assigned".to_string(),
        format!(
            "Task #{} \"{}\" has been assigned to you.",
            task_number, task_title
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::task_assigned_notification;

    #[test]
    fn message_references_number_and_title() {
        let (title, message) = task_assigned_notification(12, "Write report");
        assert_eq!(title, "New Task Assigned");
        assert_eq!(
            message,
            "Task #12 \"Write report\" has been assigned to you."
        );
    }
}
