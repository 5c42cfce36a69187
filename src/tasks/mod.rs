//! Tasks - cached access to a task store.
//!
//! The repository reads through registry caches and clears them after every
//! write to the backend, so reads never outlive the data they came from.

mod backend;
mod model;
mod repository;

pub use backend::{InMemoryTaskBackend, TaskBackend};
pub use model::{NewTask, Task};
pub use repository::TaskRepository;
