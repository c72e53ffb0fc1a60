use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ListDefinition, NewTask, TaskDefinition, TaskDocument, DEFAULT_LIST};
use crate::mutation::{Mutation, TaskPatch};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// An immutable, versioned copy of a whole collection.
///
/// Every store write produces a new snapshot with a higher version; readers
/// never see partial updates.
#[derive(Debug)]
pub struct Snapshot<T> {
    version: u64,
    items: Arc<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub fn new(version: u64, items: Vec<T>) -> Self {
        Self {
            version,
            items: Arc::new(items),
        }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            items: Arc::clone(&self.items),
        }
    }
}

pub type TaskSnapshot = Snapshot<TaskDefinition>;
pub type ListSnapshot = Snapshot<ListDefinition>;

impl TaskSnapshot {
    pub fn find(&self, id: Uuid) -> Option<&TaskDefinition> {
        self.items.iter().find(|task| task.id == id)
    }
}

/// Per-user document store holding task and list definitions.
///
/// Reads are push-based: a subscriber receives the full current collection
/// and a new one after every write. Writes are all-or-nothing.
#[async_trait]
pub trait TaskStore: Send + Sync {
    fn subscribe_tasks(&self) -> watch::Receiver<TaskSnapshot>;
    fn subscribe_lists(&self) -> watch::Receiver<ListSnapshot>;

    async fn create_task(&self, task: NewTask) -> Result<TaskDefinition, CoreError>;
    async fn apply_patch(&self, task_id: Uuid, patch: TaskPatch) -> Result<TaskDefinition, CoreError>;
    async fn delete_task(&self, task_id: Uuid) -> Result<(), CoreError>;

    async fn create_list(&self, name: &str) -> Result<ListDefinition, CoreError>;
    /// Renames a list and re-points every task in it. Returns the number of
    /// tasks moved.
    async fn rename_list(&self, old_name: &str, new_name: &str) -> Result<usize, CoreError>;
    async fn set_list_color(&self, name: &str, color: Option<String>) -> Result<ListDefinition, CoreError>;
    /// Deletes a list together with its tasks. Returns the number of tasks
    /// removed.
    async fn delete_list(&self, name: &str) -> Result<usize, CoreError>;

    /// The latest task snapshot.
    fn tasks(&self) -> TaskSnapshot {
        self.subscribe_tasks().borrow().clone()
    }

    fn lists(&self) -> ListSnapshot {
        self.subscribe_lists().borrow().clone()
    }

    async fn apply(&self, mutation: Mutation) -> Result<(), CoreError> {
        match mutation {
            Mutation::Patch { task_id, patch } => self.apply_patch(task_id, patch).await.map(|_| ()),
            Mutation::Delete { task_id } => self.delete_task(task_id).await,
        }
    }
}

// ============================================================================
// Shared document rules
// ============================================================================

pub(crate) fn list_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("List name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Name for a list about to be created. The default list always exists.
pub(crate) fn new_list_name(name: &str) -> Result<String, CoreError> {
    let name = list_name(name)?;
    if name == DEFAULT_LIST {
        return Err(CoreError::InvalidInput(format!("List '{}' already exists", name)));
    }
    Ok(name)
}

/// Accepts `#rgb` / `#rrggbb` hex colors.
pub(crate) fn list_color(color: Option<String>) -> Result<Option<String>, CoreError> {
    match color.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(hex) => {
            let digits = hex.strip_prefix('#').unwrap_or(hex);
            if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(Some(format!("#{}", digits.to_lowercase())))
            } else {
                Err(CoreError::InvalidInput(format!("'{}' is not a hex color", hex)))
            }
        }
    }
}

/// Whether `doc` belongs to the list called `name`. Tasks without a list
/// belong to the default list.
pub(crate) fn in_list(doc: &TaskDocument, name: &str) -> bool {
    doc.list_name() == name
}

/// The stored list reference after a rename.
pub(crate) fn renamed_list(new_name: &str) -> Option<String> {
    (new_name != DEFAULT_LIST).then(|| new_name.to_string())
}

pub(crate) fn task_not_found(task_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Task with id {} not found", task_id))
}

pub(crate) fn list_not_found(name: &str) -> CoreError {
    CoreError::NotFound(format!("List '{}' not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("#A1B2C3"), Some("#a1b2c3"))]
    #[case(Some("fff"), Some("#fff"))]
    fn test_list_color_accepts(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        let color = list_color(input.map(str::to_string)).unwrap();
        assert_eq!(color.as_deref(), expected);
    }

    #[rstest]
    #[case("red")]
    #[case("#12345")]
    #[case("#gggggg")]
    fn test_list_color_rejects(#[case] input: &str) {
        assert!(list_color(Some(input.to_string())).is_err());
    }

    #[test]
    fn test_list_name_is_trimmed() {
        assert_eq!(list_name("  Work ").unwrap(), "Work");
        assert!(list_name("   ").is_err());
    }

    #[test]
    fn test_snapshot_clone_shares_items() {
        let snapshot: Snapshot<u32> = Snapshot::new(3, vec![1, 2]);
        let copy = snapshot.clone();
        assert_eq!(copy.version(), 3);
        assert!(std::ptr::eq(snapshot.items(), copy.items()));
    }
}
