//! Tasks domain module.
//!
//! Work items that can be assigned to a user and progressed through a
//! status. Independent of crops and inventory.

pub mod task;

pub use task::{NewTask, Task, TaskPatch, TaskStatus};
