//! Task storage backends.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use anyhow::Result;
use parking_lot::Mutex;

use super::model::{NewTask, Task};

/// Source of truth for tasks.
pub trait TaskBackend: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    fn fetch(&self, id: u64) -> impl Future<Output = Result<Option<Task>>> + Send;

    fn create(&self, task: NewTask) -> impl Future<Output = Result<Task>> + Send;

    /// Replace a task. Returns `None` if no task has that id.
    fn update(&self, task: Task) -> impl Future<Output = Result<Option<Task>>> + Send;

    fn delete(&self, id: u64) -> impl Future<Output = Result<bool>> + Send;
}

/// Backend keeping tasks in process memory.
///
/// Counts reads so callers can see what the cache saved them.
#[derive(Debug, Default)]
pub struct InMemoryTaskBackend {
    tasks: Mutex<BTreeMap<u64, Task>>,
    next_id: AtomicU64,
    reads: AtomicUsize,
}

impl InMemoryTaskBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list` and `fetch` calls served.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }
}

impl TaskBackend for InMemoryTaskBackend {
    async fn list(&self) -> Result<Vec<Task>> {
        self.record_read();
        Ok(self.tasks.lock().values().cloned().collect())
    }

    async fn fetch(&self, id: u64) -> Result<Option<Task>> {
        self.record_read();
        Ok(self.tasks.lock().get(&id).cloned())
    }

    async fn create(&self, task: NewTask) -> Result<Task> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let task = Task {
            id,
            title: task.title,
            done: false,
            project_id: task.project_id,
        };
        self.tasks.lock().insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, task: Task) -> Result<Option<Task>> {
        let mut tasks = self.tasks.lock();
        match tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.tasks.lock().remove(&id).is_some())
    }
}
