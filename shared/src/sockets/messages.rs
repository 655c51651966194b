use serde::{Deserialize, Serialize};

/// Coarse invalidation event broadcast to every connected dashboard.
///
/// Carries no row data on purpose: listeners respond by re-running their
/// own filtered query, so a single message shape covers inserts, updates
/// and deletes alike.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TableChanged {
    pub r#type: String,
    pub table: String,
}

impl TableChanged {
    pub fn tasks() -> Self {
        Self {
            r#type: "table_changed".to_string(),
            table: "tasks".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TableChanged;

    #[test]
    fn tasks_event_serializes_to_stable_wire_shape() {
        let json = serde_json::to_value(TableChanged::tasks()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "table_changed", "table": "tasks"})
        );
    }
}
