use serde::{Deserialize, Serialize};

use crate::models::task::{Task, TaskId};

/// Current schema version
pub const CURRENT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub version: u32,
    pub tasks: Vec<Task>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            tasks: vec![],
        }
    }
}

impl Store {
    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn last_task_id(&self) -> Option<TaskId> {
        self.tasks.iter().map(|t| t.id).max()
    }
}
