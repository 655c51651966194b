
// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{CreateTaskPayload, Task, TaskStatus};
pub use service::*;
