use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    in_list, list_color, list_name, list_not_found, new_list_name, renamed_list, task_not_found, ListSnapshot,
    TaskSnapshot, TaskStore,
};
use crate::db::{establish_connection, DbPool};
use crate::error::CoreError;
use crate::models::{ListDefinition, NewTask, TaskDefinition, TaskDocument, DEFAULT_LIST};
use crate::mutation::TaskPatch;

/// Document store on SQLite. Each row holds one JSON document, partitioned
/// by user.
///
/// After every committed write the whole collection is re-read and pushed
/// to subscribers, so snapshots always reflect what is on disk. A write
/// that committed is reported as success even if that re-read fails.
pub struct SqliteStore {
    pool: DbPool,
    user: String,
    version: AtomicU64,
    // Held from the re-read until the push, so pushes follow read order.
    refresh_lock: Mutex<()>,
    tasks_tx: watch::Sender<TaskSnapshot>,
    lists_tx: watch::Sender<ListSnapshot>,
}

impl SqliteStore {
    pub async fn open(db_path: &Path, user: &str) -> Result<Self, CoreError> {
        let pool = establish_connection(db_path).await?;
        Self::with_pool(pool, user).await
    }

    pub async fn with_pool(pool: DbPool, user: &str) -> Result<Self, CoreError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(CoreError::InvalidInput("User cannot be empty".to_string()));
        }
        let (tasks_tx, _) = watch::channel(TaskSnapshot::empty());
        let (lists_tx, _) = watch::channel(ListSnapshot::empty());
        let store = Self {
            pool,
            user: user.to_string(),
            version: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
            tasks_tx,
            lists_tx,
        };
        store.refresh().await?;
        Ok(store)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Re-reads both collections and pushes them to subscribers.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _guard = self.refresh_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        let tasks = load_tasks(&mut conn, &self.user)
            .await?
            .into_iter()
            .map(TaskDefinition::from)
            .collect();
        let lists = load_lists(&mut conn, &self.user).await?;

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.tasks_tx.send_replace(TaskSnapshot::new(version, tasks));
        self.lists_tx.send_replace(ListSnapshot::new(version, lists));
        Ok(())
    }

    /// Pushes a snapshot after a committed write. The write already
    /// persisted, so a failed re-read only leaves subscribers behind.
    async fn publish(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "write committed but snapshot refresh failed");
        }
    }
}

async fn load_tasks(conn: &mut SqliteConnection, user: &str) -> Result<Vec<TaskDocument>, CoreError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, body FROM task_documents WHERE user_id = $1 ORDER BY created_at, id",
    )
    .bind(user)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, body)| match serde_json::from_str::<TaskDocument>(&body) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(task_id = %id, error = %e, "skipping malformed task document");
                None
            }
        })
        .collect())
}

async fn load_lists(conn: &mut SqliteConnection, user: &str) -> Result<Vec<ListDefinition>, CoreError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, body FROM list_documents WHERE user_id = $1 ORDER BY created_at, id",
    )
    .bind(user)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, body)| match serde_json::from_str::<ListDefinition>(&body) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(list_id = %id, error = %e, "skipping malformed list document");
                None
            }
        })
        .collect())
}

async fn find_task(
    conn: &mut SqliteConnection,
    user: &str,
    task_id: Uuid,
) -> Result<Option<TaskDocument>, CoreError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT body FROM task_documents WHERE id = $1 AND user_id = $2")
            .bind(task_id.to_string())
            .bind(user)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(body,)| serde_json::from_str(&body)).transpose()?)
}

async fn find_list(
    conn: &mut SqliteConnection,
    user: &str,
    name: &str,
) -> Result<Option<ListDefinition>, CoreError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT body FROM list_documents WHERE user_id = $1 AND name = $2")
            .bind(user)
            .bind(name)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(body,)| serde_json::from_str(&body)).transpose()?)
}

async fn write_task(conn: &mut SqliteConnection, doc: &TaskDocument) -> Result<(), CoreError> {
    sqlx::query("UPDATE task_documents SET body = $1, updated_at = $2 WHERE id = $3")
        .bind(serde_json::to_string(doc)?)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(doc.id.to_string())
        .execute(conn)
        .await?;
    Ok(())
}

async fn write_list(conn: &mut SqliteConnection, list: &ListDefinition) -> Result<(), CoreError> {
    sqlx::query("UPDATE list_documents SET name = $1, body = $2 WHERE id = $3")
        .bind(&list.name)
        .bind(serde_json::to_string(list)?)
        .bind(list.id.to_string())
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl TaskStore for SqliteStore {
    fn subscribe_tasks(&self) -> watch::Receiver<TaskSnapshot> {
        self.tasks_tx.subscribe()
    }

    fn subscribe_lists(&self) -> watch::Receiver<ListSnapshot> {
        self.lists_tx.subscribe()
    }

    async fn create_task(&self, task: NewTask) -> Result<TaskDefinition, CoreError> {
        task.validate()?;
        let doc = task.into_document(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"INSERT INTO task_documents (id, user_id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(doc.id.to_string())
        .bind(&self.user)
        .bind(serde_json::to_string(&doc)?)
        .bind(doc.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        debug!(task_id = %doc.id, user = %self.user, "created task");
        self.publish().await;
        Ok(TaskDefinition::from(doc))
    }

    async fn apply_patch(&self, task_id: Uuid, patch: TaskPatch) -> Result<TaskDefinition, CoreError> {
        patch.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut doc = find_task(&mut tx, &self.user, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        patch.apply_to(&mut doc);
        write_task(&mut tx, &doc).await?;
        tx.commit().await?;

        debug!(task_id = %task_id, "patched task");
        self.publish().await;
        Ok(TaskDefinition::from(doc))
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM task_documents WHERE id = $1 AND user_id = $2")
            .bind(task_id.to_string())
            .bind(&self.user)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(task_not_found(task_id));
        }

        debug!(task_id = %task_id, "deleted task");
        self.publish().await;
        Ok(())
    }

    async fn create_list(&self, name: &str) -> Result<ListDefinition, CoreError> {
        let name = new_list_name(name)?;
        let mut tx = self.pool.begin().await?;
        if find_list(&mut tx, &self.user, &name).await?.is_some() {
            return Err(CoreError::InvalidInput(format!("List '{}' already exists", name)));
        }

        let list = ListDefinition {
            id: Uuid::now_v7(),
            name,
            color: None,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO list_documents (id, user_id, name, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(list.id.to_string())
        .bind(&self.user)
        .bind(&list.name)
        .bind(serde_json::to_string(&list)?)
        .bind(list.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(list = %list.name, "created list");
        self.publish().await;
        Ok(list)
    }

    async fn rename_list(&self, old_name: &str, new_name: &str) -> Result<usize, CoreError> {
        let new_name = list_name(new_name)?;
        if new_name == old_name {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        if find_list(&mut tx, &self.user, &new_name).await?.is_some() {
            return Err(CoreError::InvalidInput(format!("List '{}' already exists", new_name)));
        }
        let list = find_list(&mut tx, &self.user, old_name).await?;
        let members: Vec<TaskDocument> = load_tasks(&mut tx, &self.user)
            .await?
            .into_iter()
            .filter(|doc| in_list(doc, old_name))
            .collect();
        if list.is_none() && members.is_empty() && old_name != DEFAULT_LIST {
            return Err(list_not_found(old_name));
        }

        match list {
            // The default list is never stored; its tasks carry no list.
            Some(list) if new_name == DEFAULT_LIST => {
                sqlx::query("DELETE FROM list_documents WHERE id = $1 AND user_id = $2")
                    .bind(list.id.to_string())
                    .bind(&self.user)
                    .execute(&mut *tx)
                    .await?;
            }
            Some(mut list) => {
                list.name = new_name.clone();
                write_list(&mut tx, &list).await?;
            }
            None => {}
        }
        for mut doc in members.iter().cloned() {
            doc.list = renamed_list(&new_name);
            write_task(&mut tx, &doc).await?;
        }
        tx.commit().await?;

        debug!(from = old_name, to = %new_name, moved = members.len(), "renamed list");
        self.publish().await;
        Ok(members.len())
    }

    async fn set_list_color(&self, name: &str, color: Option<String>) -> Result<ListDefinition, CoreError> {
        let color = list_color(color)?;
        let mut tx = self.pool.begin().await?;
        let mut list = find_list(&mut tx, &self.user, name)
            .await?
            .ok_or_else(|| list_not_found(name))?;
        list.color = color;
        write_list(&mut tx, &list).await?;
        tx.commit().await?;

        self.publish().await;
        Ok(list)
    }

    async fn delete_list(&self, name: &str) -> Result<usize, CoreError> {
        let mut tx = self.pool.begin().await?;
        let list_rows = sqlx::query("DELETE FROM list_documents WHERE user_id = $1 AND name = $2")
            .bind(&self.user)
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let members: Vec<Uuid> = load_tasks(&mut tx, &self.user)
            .await?
            .into_iter()
            .filter(|doc| in_list(doc, name))
            .map(|doc| doc.id)
            .collect();
        if list_rows == 0 && members.is_empty() && name != DEFAULT_LIST {
            return Err(list_not_found(name));
        }
        for task_id in &members {
            sqlx::query("DELETE FROM task_documents WHERE id = $1 AND user_id = $2")
                .bind(task_id.to_string())
                .bind(&self.user)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(list = name, removed = members.len(), "deleted list");
        self.publish().await;
        Ok(members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SqliteStore {
        let pool = db::in_memory().await.unwrap();
        SqliteStore::with_pool(pool, "alice").await.unwrap()
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let store = store().await;
        store
            .create_task(NewTask {
                title: "Valid".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO task_documents (id, user_id, body, created_at, updated_at) VALUES ('x', 'alice', '{not json', '0', '0')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        store.refresh().await.unwrap();
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_users_are_partitioned() {
        let pool = db::in_memory().await.unwrap();
        let alice = SqliteStore::with_pool(pool.clone(), "alice").await.unwrap();
        let bob = SqliteStore::with_pool(pool, "bob").await.unwrap();

        let task = alice
            .create_task(NewTask {
                title: "Alice only".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        bob.refresh().await.unwrap();
        assert!(bob.tasks().is_empty());
        assert!(matches!(bob.delete_task(task.id).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_survives_failed_refresh() {
        let store = store().await;
        sqlx::query("DROP TABLE task_documents")
            .execute(&store.pool)
            .await
            .unwrap();

        let list = store.create_list("Work").await.unwrap();
        assert_eq!(list.name, "Work");
        let (stored,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM list_documents WHERE user_id = 'alice'")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert!(store.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_user_is_rejected() {
        let pool = db::in_memory().await.unwrap();
        assert!(SqliteStore::with_pool(pool, "  ").await.is_err());
    }
}
