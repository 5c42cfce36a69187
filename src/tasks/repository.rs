//! Task repository with clear-on-write caching.

use anyhow::Result;
use tracing::debug;

use super::backend::TaskBackend;
use super::model::{NewTask, Task};
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

const ALL_TASKS_KEY: &str = "all";

/// Repository for tasks, caching list and single-task reads.
pub struct TaskRepository<B: TaskBackend> {
    backend: B,
    /// Task lists: "all" or "project:<id>"
    lists: TypedCache<Vec<Task>>,
    /// Single tasks by "task:<id>"
    details: TypedCache<Option<Task>>,
}

impl<B: TaskBackend> TaskRepository<B> {
    pub fn new(backend: B, cache: &CacheRegistry) -> Result<Self> {
        Self::with_config(backend, cache, CacheConfig::listing())
    }

    /// Create the repository, building its caches from `config` if the
    /// registry does not have them yet.
    pub fn with_config(backend: B, cache: &CacheRegistry, config: CacheConfig) -> Result<Self> {
        let lists = cache.get_or_create("tasks", config.clone())?;
        let details = cache.get_or_create("task_details", config)?;

        Ok(Self {
            backend,
            lists,
            details,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn list(&self) -> Result<Vec<Task>> {
        if let Some(tasks) = self.lists.get(ALL_TASKS_KEY) {
            return Ok(tasks);
        }

        let tasks = self.backend.list().await?;
        self.lists.set(ALL_TASKS_KEY, tasks.clone());
        Ok(tasks)
    }

    pub async fn list_by_project(&self, project_id: u64) -> Result<Vec<Task>> {
        let key = format!("project:{}", project_id);
        if let Some(tasks) = self.lists.get(&key) {
            return Ok(tasks);
        }

        let tasks: Vec<Task> = self
            .backend
            .list()
            .await?
            .into_iter()
            .filter(|task| task.project_id == Some(project_id))
            .collect();
        self.lists.set(key, tasks.clone());
        Ok(tasks)
    }

    /// Get one task. Missing tasks are cached too.
    pub async fn get(&self, id: u64) -> Result<Option<Task>> {
        let key = format!("task:{}", id);
        if let Some(task) = self.details.get(&key) {
            debug!("Task cache hit for {}", id);
            return Ok(task);
        }

        let task = self.backend.fetch(id).await?;
        self.details.set(key, task.clone());
        Ok(task)
    }

    pub async fn create(&self, task: NewTask) -> Result<Task> {
        let created = self.backend.create(task).await?;
        self.invalidate();
        Ok(created)
    }

    pub async fn update(&self, task: Task) -> Result<Option<Task>> {
        let updated = self.backend.update(task).await?;
        self.invalidate();
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<bool> {
        let deleted = self.backend.delete(id).await?;
        self.invalidate();
        Ok(deleted)
    }

    /// Drop every cached read after a write.
    fn invalidate(&self) {
        self.lists.clear();
        self.details.clear();
    }
}
