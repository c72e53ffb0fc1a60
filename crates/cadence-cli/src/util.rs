use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::TaskDefinition;
use cadence_core::store::TaskSnapshot;
use uuid::Uuid;

/// Characters of a task id shown to users.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Finds the single task whose id starts with `short_id`.
pub fn resolve_task(snapshot: &TaskSnapshot, short_id: &str) -> Result<TaskDefinition> {
    let prefix = short_id.trim().to_lowercase().replace('-', "");
    if prefix.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let matches: Vec<&TaskDefinition> = snapshot
        .items()
        .iter()
        .filter(|task| task.id.simple().to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [task] => Ok((*task).clone()),
        [] => Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        )))),
        _ => {
            let task_info: Vec<(String, String)> = matches
                .iter()
                .map(|t| (t.id.simple().to_string(), t.display_title().to_string()))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(task_info)))
        }
    }
}
