use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::to_string_pretty;
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::store::{CURRENT_VERSION, Store},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version},
    },
};

const MAX_BACKUPS: usize = 5;

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;
        Ok(())
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        let backup_path = self.get_backup_path();
        match fs::copy(&self.path, &backup_path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_backup_dir()?;
                self.create_backup()
            }
            Err(e) => Err(StorageError::BackupFailed {
                path: backup_path,
                source: e,
            }),
            Ok(bytes) => {
                debug!(path = %backup_path.display(), bytes, "created backup");
                Ok(bytes)
            }
        }
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        // Backup names end in a fixed-width timestamp, so they sort by age.
        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(MAX_BACKUPS);
        for file_path in &file_entries[..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("todos.json"));

        self.get_backup_dir()
            .join(backup_file_name(&file_name, jiff::Timestamp::now()))
    }
}

/// Backup name with a fixed-width UTC timestamp, so names sort by age.
fn backup_file_name(file_name: &str, timestamp: jiff::Timestamp) -> String {
    format!(
        "{}-{}",
        file_name,
        timestamp.strftime("%Y-%m-%dT%H:%M:%S.%9fZ")
    )
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet, starting empty");
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut data: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let file_version = detect_version(&data)?;
        if file_version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(file_version));
        }
        if file_version < CURRENT_VERSION {
            data = apply_migrations(data, file_version, CURRENT_VERSION)?;
        }

        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
        }

        let store: Store =
            serde_json::from_value(data).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })?;
        debug!(
            path = %self.path.display(),
            tasks = store.tasks.len(),
            file_version,
            "loaded store"
        );
        Ok(store)
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let json =
            to_string_pretty(store).map_err(|e| StorageError::SerializeFailed { source: e })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::SaveFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        FileExt::unlock(&lock_file).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), tasks = store.tasks.len(), "saved store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::{
        models::task::Task,
        services::{
            tags::{distinct_tags, tag_counts},
            view::compute_view,
        },
    };

    fn sample_store() -> Store {
        let created_at = "2026-10-19T08:00:00Z".parse().unwrap();
        let mut pinned = Task::new(
            1,
            String::from("Buy milk"),
            Some(String::from("shopping")),
            Some(date(2026, 10, 20)),
            created_at,
        );
        pinned.is_pinned = true;
        let plain = Task::new(2, String::from("Call mom"), None, None, created_at);
        Store {
            version: CURRENT_VERSION,
            tasks: vec![pinned, plain],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("todos.json"));
        let store = sample_store();

        storage.save(&store).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("missing.json"));

        let store = storage.load().unwrap();

        assert_eq!(store.version, CURRENT_VERSION);
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let storage = JsonFileStorage::new(path.clone());

        storage.save(&sample_store()).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        storage.save(&storage.load().unwrap()).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        storage.save(&storage.load().unwrap()).unwrap();
        let third = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let result = JsonFileStorage::new(path).load();

        assert!(matches!(result, Err(StorageError::ParseFailed { .. })));
    }

    #[test]
    fn test_load_legacy_array_without_is_pinned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        let legacy = r#"[
            {
                "id": 1700000000000,
                "text": "Water plants",
                "tag": null,
                "deadline": "2026-10-25",
                "completed": false,
                "createdAt": "11/14/2023, 10:13:20 PM"
            }
        ]"#;
        fs::write(&path, legacy).unwrap();

        let store = JsonFileStorage::new(path).load().unwrap();

        assert_eq!(store.version, CURRENT_VERSION);
        assert_eq!(store.tasks.len(), 1);
        assert!(!store.tasks[0].is_pinned);
        assert_eq!(
            store.tasks[0].created_at,
            jiff::Timestamp::from_millisecond(1_700_000_000_000).unwrap()
        );
    }

    #[test]
    fn test_load_current_version_without_is_pinned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let json = r#"{
            "version": 2,
            "tasks": [
                {
                    "id": 3,
                    "text": "Read book",
                    "tag": "leisure",
                    "deadline": null,
                    "completed": true,
                    "createdAt": "2026-10-19T08:00:00Z",
                    "updatedAt": null
                }
            ]
        }"#;
        fs::write(&path, json).unwrap();

        let store = JsonFileStorage::new(path).load().unwrap();

        assert!(!store.tasks[0].is_pinned);
        assert!(store.tasks[0].completed);
    }

    #[test]
    fn test_load_future_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{ "version": 999, "tasks": [] }"#).unwrap();

        let result = JsonFileStorage::new(path).load();

        assert!(matches!(result, Err(StorageError::FutureVersion(999))));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("todos.json");
        let storage = JsonFileStorage::new(path.clone());

        storage.save(&Store::default()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_backup_creation_and_cleanup() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("todos.json"));

        for i in 1..=7 {
            let mut store = sample_store();
            store.tasks[0].text = format!("Revision {}", i);
            storage.save(&store).unwrap();

            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let backup_count = fs::read_dir(dir.path().join("backups"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count();

        assert_eq!(backup_count, MAX_BACKUPS, "Should keep exactly 5 backups");
    }

    #[test]
    fn test_backup_names_sort_by_age() {
        let older: jiff::Timestamp = "2026-10-19T08:00:00.1Z".parse().unwrap();
        let newer: jiff::Timestamp = "2026-10-19T08:00:00.123Z".parse().unwrap();
        let whole: jiff::Timestamp = "2026-10-19T08:00:01Z".parse().unwrap();

        let older_name = backup_file_name("todos.json", older);
        let newer_name = backup_file_name("todos.json", newer);
        let whole_name = backup_file_name("todos.json", whole);

        assert_eq!(older_name, "todos.json-2026-10-19T08:00:00.100000000Z");
        assert!(older_name < newer_name);
        assert!(newer_name < whole_name);
    }

    #[test]
    fn test_untrimmed_tag_matches_filter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let json = r#"{
            "version": 2,
            "tasks": [
                {
                    "id": 4,
                    "text": "Write report",
                    "tag": " work ",
                    "deadline": null,
                    "completed": false,
                    "isPinned": false,
                    "createdAt": "2026-10-19T08:00:00Z",
                    "updatedAt": null
                }
            ]
        }"#;
        fs::write(&path, json).unwrap();

        let store = JsonFileStorage::new(path).load().unwrap();
        let now = date(2026, 10, 19).at(12, 0, 0, 0);

        assert_eq!(distinct_tags(&store.tasks), vec![String::from("work")]);
        assert_eq!(compute_view(&store.tasks, "", Some("work"), now).len(), 1);
        assert_eq!(tag_counts(&store.tasks), vec![(String::from("work"), 1)]);
    }

    #[test]
    fn test_backup_directory_created_on_second_save() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("todos.json"));
        let backups_dir = dir.path().join("backups");

        storage.save(&Store::default()).unwrap();
        assert!(
            !backups_dir.exists(),
            "Backups dir should not exist after first save"
        );

        storage.save(&sample_store()).unwrap();
        assert!(
            backups_dir.is_dir(),
            "Backups dir should be created on second save"
        );
    }
}
