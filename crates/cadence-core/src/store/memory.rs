use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::debug;
use uuid::Uuid;

use super::{
    in_list, list_color, list_name, list_not_found, new_list_name, renamed_list, task_not_found, ListSnapshot,
    TaskSnapshot, TaskStore,
};
use crate::error::CoreError;
use crate::models::{ListDefinition, NewTask, TaskDefinition, TaskDocument, DEFAULT_LIST};
use crate::mutation::TaskPatch;

#[derive(Debug, Default)]
struct State {
    version: u64,
    tasks: Vec<TaskDocument>,
    lists: Vec<ListDefinition>,
}

/// In-process store. Used by tests and as a scratch backend.
pub struct MemoryStore {
    state: Mutex<State>,
    tasks_tx: watch::Sender<TaskSnapshot>,
    lists_tx: watch::Sender<ListSnapshot>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tasks_tx, _) = watch::channel(TaskSnapshot::empty());
        let (lists_tx, _) = watch::channel(ListSnapshot::empty());
        Self {
            state: Mutex::new(State::default()),
            tasks_tx,
            lists_tx,
        }
    }

    /// Seeds the store with raw documents, e.g. ones written by another
    /// client version.
    pub async fn with_documents(documents: Vec<TaskDocument>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().await;
            state.tasks = documents;
            store.publish(&mut state);
        }
        store
    }

    fn publish(&self, state: &mut State) {
        state.version += 1;
        let tasks = state.tasks.iter().cloned().map(TaskDefinition::from).collect();
        self.tasks_tx.send_replace(TaskSnapshot::new(state.version, tasks));
        self.lists_tx
            .send_replace(ListSnapshot::new(state.version, state.lists.clone()));
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    fn subscribe_tasks(&self) -> watch::Receiver<TaskSnapshot> {
        self.tasks_tx.subscribe()
    }

    fn subscribe_lists(&self) -> watch::Receiver<ListSnapshot> {
        self.lists_tx.subscribe()
    }

    async fn create_task(&self, task: NewTask) -> Result<TaskDefinition, CoreError> {
        task.validate()?;
        let doc = task.into_document(Uuid::new_v4(), Utc::now());
        let created = TaskDefinition::from(doc.clone());

        let mut state = self.state.lock().await;
        state.tasks.push(doc);
        self.publish(&mut state);
        debug!(task_id = %created.id, "created task");
        Ok(created)
    }

    async fn apply_patch(&self, task_id: Uuid, patch: TaskPatch) -> Result<TaskDefinition, CoreError> {
        patch.validate()?;
        let mut state = self.state.lock().await;
        let doc = state
            .tasks
            .iter_mut()
            .find(|doc| doc.id == task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        patch.apply_to(doc);
        let updated = TaskDefinition::from(doc.clone());
        self.publish(&mut state);
        debug!(task_id = %task_id, "patched task");
        Ok(updated)
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(|doc| doc.id != task_id);
        if state.tasks.len() == before {
            return Err(task_not_found(task_id));
        }
        self.publish(&mut state);
        debug!(task_id = %task_id, "deleted task");
        Ok(())
    }

    async fn create_list(&self, name: &str) -> Result<ListDefinition, CoreError> {
        let name = new_list_name(name)?;
        let mut state = self.state.lock().await;
        if state.lists.iter().any(|list| list.name == name) {
            return Err(CoreError::InvalidInput(format!("List '{}' already exists", name)));
        }
        let list = ListDefinition {
            id: Uuid::now_v7(),
            name,
            color: None,
            created_at: Utc::now(),
        };
        state.lists.push(list.clone());
        self.publish(&mut state);
        Ok(list)
    }

    async fn rename_list(&self, old_name: &str, new_name: &str) -> Result<usize, CoreError> {
        let new_name = list_name(new_name)?;
        if new_name == old_name {
            return Ok(0);
        }
        let mut state = self.state.lock().await;
        if state.lists.iter().any(|list| list.name == new_name) {
            return Err(CoreError::InvalidInput(format!("List '{}' already exists", new_name)));
        }
        let has_row = state.lists.iter().any(|list| list.name == old_name);
        let has_tasks = state.tasks.iter().any(|doc| in_list(doc, old_name));
        if !has_row && !has_tasks && old_name != DEFAULT_LIST {
            return Err(list_not_found(old_name));
        }

        if new_name == DEFAULT_LIST {
            state.lists.retain(|list| list.name != old_name);
        } else {
            for list in state.lists.iter_mut().filter(|list| list.name == old_name) {
                list.name = new_name.clone();
            }
        }
        let mut moved = 0;
        for doc in state.tasks.iter_mut().filter(|doc| in_list(doc, old_name)) {
            doc.list = renamed_list(&new_name);
            moved += 1;
        }
        self.publish(&mut state);
        debug!(from = old_name, to = %new_name, moved, "renamed list");
        Ok(moved)
    }

    async fn set_list_color(&self, name: &str, color: Option<String>) -> Result<ListDefinition, CoreError> {
        let color = list_color(color)?;
        let mut state = self.state.lock().await;
        let list = state
            .lists
            .iter_mut()
            .find(|list| list.name == name)
            .ok_or_else(|| list_not_found(name))?;
        list.color = color;
        let updated = list.clone();
        self.publish(&mut state);
        Ok(updated)
    }

    async fn delete_list(&self, name: &str) -> Result<usize, CoreError> {
        let mut state = self.state.lock().await;
        let lists_before = state.lists.len();
        let tasks_before = state.tasks.len();
        state.lists.retain(|list| list.name != name);
        state.tasks.retain(|doc| !in_list(doc, name));

        let removed = tasks_before - state.tasks.len();
        if removed == 0 && state.lists.len() == lists_before && name != DEFAULT_LIST {
            return Err(list_not_found(name));
        }
        self.publish(&mut state);
        debug!(list = name, removed, "deleted list");
        Ok(removed)
    }
}
