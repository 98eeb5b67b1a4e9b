use jiff::Timestamp;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Version 1 is the legacy format: either a bare array of tasks or an object
/// without a `version` field.
pub fn detect_version(value: &Value) -> Result<u32, StorageError> {
    match value {
        Value::Array(_) => Ok(1),
        Value::Object(obj) => match obj.get("version") {
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| StorageError::InvalidVersion(v.to_string())),
            None => Ok(1),
        },
        other => Err(StorageError::InvalidVersion(other.to_string())),
    }
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    if from_version == 0 {
        return Err(StorageError::UnsupportedVersion(from_version));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let migration_idx = (version - 1) as usize; // v1→v2 is at index 0

        if migration_idx >= migrations.len() {
            return Err(StorageError::UnsupportedVersion(version));
        }

        debug!(from = version, to = version + 1, "applying store migration");
        data = migrations[migration_idx](data)?;
    }

    Ok(data)
}

/// Wraps the legacy task array in a versioned envelope and normalises each
/// record so it deserializes into the current `Task`.
fn migrate_v1_to_v2(value: Value) -> Result<Value, StorageError> {
    let tasks = match value {
        Value::Array(tasks) => tasks,
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(tasks)) => tasks,
            None => vec![],
            Some(_) => {
                return Err(StorageError::MigrationFailed {
                    version: 1,
                    reason: String::from("'tasks' is not an array"),
                });
            }
        },
        _ => {
            return Err(StorageError::MigrationFailed {
                version: 1,
                reason: String::from("expected an array or an object"),
            });
        }
    };

    let tasks = tasks
        .into_iter()
        .map(|task| match task {
            Value::Object(obj) => Ok(Value::Object(migrate_task_v1(obj)?)),
            _ => Err(StorageError::MigrationFailed {
                version: 1,
                reason: String::from("task record is not an object"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({ "version": 2, "tasks": tasks }))
}

fn migrate_task_v1(mut task: Map<String, Value>) -> Result<Map<String, Value>, StorageError> {
    for flag in ["completed", "isPinned"] {
        if !task.get(flag).is_some_and(Value::is_boolean) {
            task.insert(flag.to_string(), Value::Bool(false));
        }
    }

    let id = task.get("id").and_then(Value::as_u64).ok_or_else(|| {
        StorageError::MigrationFailed {
            version: 1,
            reason: String::from("task record without a numeric id"),
        }
    })?;

    // The browser build stored locale-formatted dates; the id carries the
    // creation time in milliseconds.
    if !is_timestamp(task.get("createdAt")) {
        let created_at = i64::try_from(id)
            .ok()
            .and_then(|ms| Timestamp::from_millisecond(ms).ok())
            .unwrap_or(Timestamp::UNIX_EPOCH);
        warn!(id, "replacing legacy createdAt with the time encoded in the id");
        task.insert("createdAt".to_string(), json!(created_at.to_string()));
    }

    if task.contains_key("updatedAt") && !is_timestamp(task.get("updatedAt")) {
        task.insert("updatedAt".to_string(), Value::Null);
    }

    if let Some(tag) = task.get("tag").and_then(Value::as_str) {
        let trimmed = tag.trim();
        let normalized = if trimmed.is_empty() {
            Value::Null
        } else {
            json!(trimmed)
        };
        task.insert("tag".to_string(), normalized);
    }

    if task.get("deadline").and_then(Value::as_str) == Some("") {
        task.insert("deadline".to_string(), Value::Null);
    }

    Ok(task)
}

fn is_timestamp(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.parse::<Timestamp>().is_ok())
}
