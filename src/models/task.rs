use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a task. Derived from the creation time in milliseconds.
pub type TaskId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique, immutable identifier
    pub id: TaskId,
    /// Description of the task, always trimmed and non-empty
    pub text: String,
    /// Optional label used for filtering, always trimmed and non-empty
    #[serde(default, deserialize_with = "deserialize_tag")]
    pub tag: Option<String>,
    /// Date by which the task should be done
    #[serde(default)]
    pub deadline: Option<Date>,
    #[serde(default)]
    pub completed: bool,
    /// Pinned tasks are listed before everything else
    #[serde(default)]
    pub is_pinned: bool,
    /// When the task was created
    pub created_at: Timestamp,
    /// When the task was last edited
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Task {
    pub fn new(
        id: TaskId,
        text: String,
        tag: Option<String>,
        deadline: Option<Date>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            text,
            tag,
            deadline,
            completed: false,
            is_pinned: false,
            created_at,
            updated_at: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

/// Trims a tag and turns an empty one into `None`.
pub fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

fn deserialize_tag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_tag(tag.as_deref()))
}

/// Picks an id for a task created at `now`: the epoch millisecond, bumped past
/// `last_id` when several tasks are created within the same millisecond.
///
/// Returns `None` when `last_id` is already the largest possible id.
pub fn next_task_id(now: Timestamp, last_id: Option<TaskId>) -> Option<TaskId> {
    let millis = u64::try_from(now.as_millisecond()).unwrap_or(0);
    match last_id {
        Some(last) if millis <= last => last.checked_add(1),
        _ => Some(millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some("  work ")), Some(String::from("work")));
        assert_eq!(normalize_tag(Some("   ")), None);
        assert_eq!(normalize_tag(None), None);
    }

    #[test]
    fn test_next_task_id_uses_milliseconds() {
        let now = Timestamp::from_millisecond(1_700_000_000_000).unwrap();
        assert_eq!(next_task_id(now, None), Some(1_700_000_000_000));
        assert_eq!(next_task_id(now, Some(5)), Some(1_700_000_000_000));
    }

    #[test]
    fn test_next_task_id_is_monotonic_within_same_millisecond() {
        let now = Timestamp::from_millisecond(1_700_000_000_000).unwrap();
        assert_eq!(
            next_task_id(now, Some(1_700_000_000_000)),
            Some(1_700_000_000_001)
        );
        assert_eq!(
            next_task_id(now, Some(1_700_000_000_050)),
            Some(1_700_000_000_051)
        );
    }

    #[test]
    fn test_next_task_id_after_largest_id() {
        let now = Timestamp::from_millisecond(1_700_000_000_000).unwrap();
        assert_eq!(next_task_id(now, Some(u64::MAX)), None);
    }

    #[test]
    fn test_stored_tag_is_normalized() {
        let json = r#"{
            "id": 1,
            "text": "Report",
            "tag": " work ",
            "createdAt": "2026-10-19T08:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.tag.as_deref(), Some("work"));
        assert!(task.has_tag("work"));

        let blank: Task =
            serde_json::from_str(&json.replace("\" work \"", "\"  \"")).unwrap();
        assert_eq!(blank.tag, None);
    }

    #[test]
    fn test_missing_flags_deserialize_as_false() {
        let json = r#"{
            "id": 1,
            "text": "Buy milk",
            "tag": null,
            "deadline": "2026-10-20",
            "createdAt": "2026-10-19T08:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.is_pinned);
        assert!(!task.completed);
        assert_eq!(task.updated_at, None);
        assert_eq!(task.deadline, Some(jiff::civil::date(2026, 10, 20)));
    }

    #[test]
    fn test_serialized_field_names() {
        let created_at = Timestamp::from_second(0).unwrap();
        let task = Task::new(7, String::from("Call mom"), None, None, created_at);
        let value = serde_json::to_value(&task).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "text",
            "tag",
            "deadline",
            "completed",
            "isPinned",
            "createdAt",
            "updatedAt",
        ] {
            assert!(obj.contains_key(key), "missing field {key}");
        }
    }
}
